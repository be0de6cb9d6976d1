//! Integration tests for layered configuration loading

use dailydraft::cli::{Commands, RunContext};
use dailydraft::config::paths::{global_config_path, APP_DIR};
use dailydraft::config::ConfigLoader;
use dailydraft::daily::RerunPolicy;
use dailydraft::error::DraftError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::integration::with_env;

fn write_file(dir: &TempDir, relative: &str, body: &str) -> PathBuf {
    let path = dir.path().join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn global_path_follows_xdg_config_home() {
    let home = TempDir::new().unwrap();
    with_env(home.path(), &[], || {
        let path = global_config_path().unwrap();
        assert_eq!(path, home.path().join(APP_DIR).join("config.toml"));
    });
}

#[test]
fn layers_apply_in_precedence_order() {
    let home = TempDir::new().unwrap();
    write_file(
        &home,
        "dailydraft/config.toml",
        r#"
[store]
calendar_sheet = "global_calendar"
context_rows = 10

[run]
slots = 5
objective = "authority"
"#,
    );
    let explicit = write_file(
        &home,
        "project/dailydraft.toml",
        r#"
[run]
slots = 4
"#,
    );

    with_env(home.path(), &[("DAILYDRAFT_RUN__SLOTS", "6")], || {
        let config = ConfigLoader::load(Some(&explicit)).unwrap();
        assert_eq!(config.run.slots, 6);
        assert_eq!(config.run.objective, "authority");
        assert_eq!(config.store.calendar_sheet, "global_calendar");
        assert_eq!(config.store.context_rows, 10);
    });

    with_env(home.path(), &[], || {
        let config = ConfigLoader::load(Some(&explicit)).unwrap();
        assert_eq!(config.run.slots, 4);
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.run.slots, 5);
    });
}

#[test]
fn legacy_variables_fill_credentials_and_objective() {
    let home = TempDir::new().unwrap();
    with_env(
        home.path(),
        &[
            ("GSHEETS_SPREADSHEET_ID", "sheet-123"),
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "ya29.token"),
            ("GEMINI_API_KEY", "AIza-key"),
            ("DEFAULT_OBJECTIVE", "  Leads "),
        ],
        || {
            let config = ConfigLoader::load(None).unwrap();
            assert_eq!(config.store.spreadsheet_id.as_deref(), Some("sheet-123"));
            assert_eq!(config.store.access_token.as_deref(), Some("ya29.token"));
            assert_eq!(config.backend.api_key.as_deref(), Some("AIza-key"));
            assert_eq!(config.run.objective, "leads");
            assert!(config.validate().is_ok());
        },
    );
}

#[test]
fn blank_legacy_variable_does_not_count_as_set() {
    let home = TempDir::new().unwrap();
    with_env(home.path(), &[("GEMINI_API_KEY", "   ")], || {
        let config = ConfigLoader::load(None).unwrap();
        assert!(config.backend.api_key.is_none());
        let errors = config.validate_backend();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("GEMINI_API_KEY"));
    });
}

#[test]
fn prefixed_list_variable_splits_on_commas() {
    let home = TempDir::new().unwrap();
    with_env(
        home.path(),
        &[(
            "DAILYDRAFT_BACKEND__PREFERRED_MODELS",
            "gemini-1.5-pro,gemini-2.0-flash",
        )],
        || {
            let config = ConfigLoader::load(None).unwrap();
            assert_eq!(
                config.backend.preferred_models,
                vec!["gemini-1.5-pro", "gemini-2.0-flash"]
            );
        },
    );
}

#[test]
fn rerun_policy_and_format_read_from_file() {
    let home = TempDir::new().unwrap();
    let explicit = write_file(
        &home,
        "run.toml",
        r#"
[backend]
output_format = "json"
temperature = 0.4

[run]
rerun_policy = "allow"
"#,
    );
    let config = ConfigLoader::load_from_file(&explicit).unwrap();
    assert_eq!(config.run.rerun_policy, RerunPolicy::Allow);
    assert_eq!(config.generation_options().temperature, 0.4);
}

#[test]
fn missing_explicit_file_fails_to_load() {
    let home = TempDir::new().unwrap();
    with_env(home.path(), &[], || {
        let missing = home.path().join("absent.toml");
        let err = ConfigLoader::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, DraftError::ConfigError(ref m) if m.contains("absent.toml")));
    });
}

#[test]
fn status_command_requires_store_credentials() {
    let home = TempDir::new().unwrap();
    with_env(home.path(), &[("GEMINI_API_KEY", "AIza-key")], || {
        let context = RunContext::new(None).unwrap();
        let err = context
            .execute(&Commands::Status {
                format: "text".to_string(),
            })
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("spreadsheet_id"));
        assert!(message.contains("access_token"));
    });
}
