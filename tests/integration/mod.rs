//! Integration tests for the daily draft generator

mod config_loading;
mod run_outcomes;
pub mod test_utils;

pub use test_utils::with_env;
