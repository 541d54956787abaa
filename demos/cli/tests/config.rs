use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use saksflyt_cli::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
use saksflyt_core::period::Periode;
use saksflyt_core::{Resultatomrade, TieBreak};
use tempfile::TempDir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

fn no_env(_: &str) -> Option<String> {
    None
}

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("saksflyt.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn defaults_validate() {
    let config = AppConfig::default();

    config.validate().unwrap();
    assert_eq!(config.pipeline.max_invalid_undos, 10);
    assert_eq!(config.pipeline.automated_actor, "Fia system");
    assert_eq!(config.logging.format, LogFormat::Compact);
    assert_eq!(config.report.periode, Periode::Uke);
}

#[test]
fn file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[warehouse]
project = "pia-dev"
export_dir = "/data/export"

[pipeline]
max_invalid_undos = 3
tie_break = "ingestion"

[report]
resultatomrade = "vest-viken"
as_of = "2024-03-01"
periode = "måned"

[logging]
format = "json"
"#,
    );

    let config = AppConfig::load_with_env(
        LoadOptions {
            config_path: Some(path),
            ..LoadOptions::default()
        },
        no_env,
    )
    .unwrap();

    assert_eq!(config.warehouse.project, "pia-dev");
    assert_eq!(config.warehouse.dataset, AppConfig::default().warehouse.dataset);
    assert_eq!(config.warehouse.export_dir, PathBuf::from("/data/export"));
    assert_eq!(config.pipeline.max_invalid_undos, 3);
    assert_eq!(config.pipeline.tie_break, TieBreak::Ingestion);
    assert_eq!(config.pipeline.closed_retention_days, 365);
    assert_eq!(config.report.resultatomrade, Some(Resultatomrade::VestViken));
    assert_eq!(config.report.as_of, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert_eq!(config.report.periode, Periode::Maaned);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn environment_overrides_file_and_flags_override_environment() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[warehouse]
project = "from-file"
dataset = "from-file"
"#,
    );

    let config = AppConfig::load_with_env(
        LoadOptions {
            config_path: Some(path),
            overrides: ConfigOverrides {
                dataset: Some("from-flag".to_string()),
                ..ConfigOverrides::default()
            },
        },
        env_from(&[
            ("SAKSFLYT_PROJECT", "from-env"),
            ("SAKSFLYT_DATASET", "from-env"),
            ("SAKSFLYT_MAX_INVALID_UNDOS", "25"),
            ("SAKSFLYT_RESULTATOMRADE", "oslo"),
            ("SAKSFLYT_LOG_LEVEL", "debug"),
        ]),
    )
    .unwrap();

    assert_eq!(config.warehouse.project, "from-env");
    assert_eq!(config.warehouse.dataset, "from-flag");
    assert_eq!(config.pipeline.max_invalid_undos, 25);
    assert_eq!(config.report.resultatomrade, Some(Resultatomrade::Oslo));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn blank_environment_values_are_ignored() {
    let config =
        AppConfig::load_with_env(LoadOptions::default(), env_from(&[("SAKSFLYT_PROJECT", "  ")]))
            .unwrap();

    assert_eq!(config.warehouse.project, AppConfig::default().warehouse.project);
}

#[test]
fn invalid_environment_value_is_rejected() {
    let err = AppConfig::load_with_env(
        LoadOptions::default(),
        env_from(&[("SAKSFLYT_MAX_INVALID_UNDOS", "mange")]),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::InvalidEnvOverride { ref key, .. } if key == "SAKSFLYT_MAX_INVALID_UNDOS"
    ));
}

#[test]
fn unknown_log_format_is_rejected() {
    let err = AppConfig::load_with_env(
        LoadOptions::default(),
        env_from(&[("SAKSFLYT_LOG_FORMAT", "pretty")]),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn explicit_config_file_must_exist() {
    let dir = TempDir::new().unwrap();

    let err = AppConfig::load_with_env(
        LoadOptions {
            config_path: Some(dir.path().join("mangler.toml")),
            ..LoadOptions::default()
        },
        no_env,
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::MissingConfigFile(_)));
}

#[test]
fn unknown_keys_fail_parsing() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[warehouse]\nprosjekt = \"skrivefeil\"\n");

    let err = AppConfig::load_with_env(
        LoadOptions {
            config_path: Some(path),
            ..LoadOptions::default()
        },
        no_env,
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::ParseFile { .. }));
}

#[test]
fn validation_rejects_empty_project() {
    let err = AppConfig::load_with_env(
        LoadOptions {
            overrides: ConfigOverrides {
                project: Some(String::new()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        },
        no_env,
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Validation(_)));
}
