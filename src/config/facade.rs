//! Config loading: defaults, global file, explicit file, environment.

use crate::config::merge::merge_policy::builder_with_defaults;
use crate::config::sources::{env, explicit_file, global_file};
use crate::config::DraftConfig;
use crate::error::DraftError;
use std::path::Path;

/// Loads layered configuration.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Full layer stack. `explicit` is the `--config` path, if given.
    ///
    /// Validation is left to the caller since commands need different credentials.
    pub fn load(explicit: Option<&Path>) -> Result<DraftConfig, DraftError> {
        let mut builder = builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        if let Some(path) = explicit {
            builder = explicit_file::add_to_builder(builder, path)?;
        }
        builder = env::add_to_builder(builder);
        builder = env::add_legacy_overrides(builder)?;

        let config: DraftConfig = builder.build()?.try_deserialize()?;
        Ok(config.normalized())
    }

    /// A single TOML file over the defaults, ignoring global and environment layers.
    pub fn load_from_file(path: &Path) -> Result<DraftConfig, DraftError> {
        let builder = explicit_file::add_to_builder(builder_with_defaults()?, path)?;
        let config: DraftConfig = builder.build()?.try_deserialize()?;
        Ok(config.normalized())
    }
}
