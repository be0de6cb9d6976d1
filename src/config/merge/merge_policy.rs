//! Merge rules: built-in defaults at the bottom of the layer stack.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("store.calendar_sheet", "calendar")?
        .set_default("store.swipe_sheet", "swipe_file")?
        .set_default("store.performance_sheet", "performance")?
        .set_default("run.objective", "balanced")?
        .set_default("run.slots", 3)?
        .set_default("run.rerun_policy", "skip")?
        .set_default("backend.output_format", "kv")
}
