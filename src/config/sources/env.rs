//! Environment sources: `DAILYDRAFT_<SECTION>__<KEY>` and the legacy flat names.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "DAILYDRAFT";

/// Legacy variable name and the key it overrides.
pub const LEGACY_VARS: [(&str, &str); 4] = [
    ("GSHEETS_SPREADSHEET_ID", "store.spreadsheet_id"),
    ("GOOGLE_OAUTH_ACCESS_TOKEN", "store.access_token"),
    ("GEMINI_API_KEY", "backend.api_key"),
    ("DEFAULT_OBJECTIVE", "run.objective"),
];

/// Add the prefixed environment source. List-valued keys split on commas.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("backend.preferred_models")
            .with_list_parse_key("backend.deny_patterns"),
    )
}

/// Apply legacy variables on top of everything else. Empty values are ignored.
pub fn add_legacy_overrides(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in LEGACY_VARS {
        let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        builder = builder.set_override_option(key, value)?;
    }
    Ok(builder)
}
