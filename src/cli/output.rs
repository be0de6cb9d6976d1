//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::DraftError;

/// Map domain errors to a one-line message for stderr.
pub fn map_error(e: &DraftError) -> String {
    match e {
        DraftError::ConfigError(_) => format!(
            "{}\nSet values in the config file or via DAILYDRAFT_<SECTION>__<KEY>.",
            e
        ),
        DraftError::StoreRequestFailed { status: 401 | 403, .. } => {
            format!("{}\nCheck the store access token.", e)
        }
        _ => e.to_string(),
    }
}
