//! Generation pipeline: retry policy, request execution, parsing, prompts and the
//! diversity guard.

pub mod diversity;
pub mod executor;
pub mod parse;
pub mod policy;
pub mod prompt;

pub use diversity::{is_duplicate, max_similarity, DEFAULT_SIMILARITY_THRESHOLD};
pub use executor::{AttemptOutcome, ExecutionSuccess, RequestExecutor, Sleeper, TokioSleeper};
pub use parse::{parse_and_accept, parse_response, DEFAULT_MIN_FILLED_FIELDS};
pub use policy::{NextAction, RetryPolicy, RetryStep};
pub use prompt::{PromptBuilder, Revision};
