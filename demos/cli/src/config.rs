//! Layered configuration: defaults, TOML file, `SAKSFLYT_*` environment,
//! command-line flags, then validation.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use saksflyt_core::period::Periode;
use saksflyt_core::{Resultatomrade, SaksflytConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_CONFIG_FILE: &str = "saksflyt.toml";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub warehouse: WarehouseConfig,
    pub pipeline: SaksflytConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WarehouseConfig {
    pub project: String,
    pub dataset: String,
    /// Directory holding one `<table>.json` or `<table>.ndjson` per table.
    pub export_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportConfig {
    pub resultatomrade: Option<Resultatomrade>,
    pub output_dir: PathBuf,
    /// Reporting date. Today when unset.
    pub as_of: Option<NaiveDate>,
    pub periode: Periode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|json)"
            ))),
        }
    }
}

/// Values given on the command line. They win over every other layer.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub project: Option<String>,
    pub dataset: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub resultatomrade: Option<Resultatomrade>,
    pub output_dir: Option<PathBuf>,
    pub as_of: Option<NaiveDate>,
    pub periode: Option<Periode>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Explicit file. Must exist when given.
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            warehouse: WarehouseConfig {
                project: "pia-prod-85d4".to_string(),
                dataset: "pia_bigquery_sink_v1_dataset_prod".to_string(),
                export_dir: PathBuf::from("export"),
            },
            pipeline: SaksflytConfig::default(),
            report: ReportConfig {
                resultatomrade: None,
                output_dir: PathBuf::from("out"),
                as_of: None,
                periode: Periode::Uke,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    warehouse: Option<WarehousePatch>,
    pipeline: Option<SaksflytConfig>,
    report: Option<ReportPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WarehousePatch {
    project: Option<String>,
    dataset: Option<String>,
    export_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportPatch {
    resultatomrade: Option<Resultatomrade>,
    output_dir: Option<PathBuf>,
    as_of: Option<NaiveDate>,
    periode: Option<Periode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        Self::load_with_env(options, |key| env::var(key).ok())
    }

    /// Like [`AppConfig::load`], reading environment variables through `env`.
    pub fn load_with_env<F>(options: LoadOptions, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(options.config_path.as_deref())? {
            config.apply_patch(read_patch(&path)?);
        }

        config.apply_env_overrides(|key| env(key).filter(|value| !value.trim().is_empty()))?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(warehouse) = patch.warehouse {
            if let Some(project) = warehouse.project {
                self.warehouse.project = project;
            }
            if let Some(dataset) = warehouse.dataset {
                self.warehouse.dataset = dataset;
            }
            if let Some(export_dir) = warehouse.export_dir {
                self.warehouse.export_dir = export_dir;
            }
        }

        if let Some(pipeline) = patch.pipeline {
            self.pipeline = pipeline;
        }

        if let Some(report) = patch.report {
            if let Some(resultatomrade) = report.resultatomrade {
                self.report.resultatomrade = Some(resultatomrade);
            }
            if let Some(output_dir) = report.output_dir {
                self.report.output_dir = output_dir;
            }
            if let Some(as_of) = report.as_of {
                self.report.as_of = Some(as_of);
            }
            if let Some(periode) = report.periode {
                self.report.periode = periode;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides<F>(&mut self, read_env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = read_env("SAKSFLYT_PROJECT") {
            self.warehouse.project = value;
        }
        if let Some(value) = read_env("SAKSFLYT_DATASET") {
            self.warehouse.dataset = value;
        }
        if let Some(value) = read_env("SAKSFLYT_EXPORT_DIR") {
            self.warehouse.export_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SAKSFLYT_RESULTATOMRADE") {
            self.report.resultatomrade = Some(parse_env("SAKSFLYT_RESULTATOMRADE", &value)?);
        }
        if let Some(value) = read_env("SAKSFLYT_MAX_INVALID_UNDOS") {
            self.pipeline.max_invalid_undos = parse_env("SAKSFLYT_MAX_INVALID_UNDOS", &value)?;
        }
        if let Some(value) = read_env("SAKSFLYT_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("SAKSFLYT_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(project) = overrides.project {
            self.warehouse.project = project;
        }
        if let Some(dataset) = overrides.dataset {
            self.warehouse.dataset = dataset;
        }
        if let Some(export_dir) = overrides.export_dir {
            self.warehouse.export_dir = export_dir;
        }
        if let Some(resultatomrade) = overrides.resultatomrade {
            self.report.resultatomrade = Some(resultatomrade);
        }
        if let Some(output_dir) = overrides.output_dir {
            self.report.output_dir = output_dir;
        }
        if let Some(as_of) = overrides.as_of {
            self.report.as_of = Some(as_of);
        }
        if let Some(periode) = overrides.periode {
            self.report.periode = periode;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.warehouse.project.trim().is_empty() {
            return Err(ConfigError::Validation(
                "warehouse.project must not be empty".to_string(),
            ));
        }
        if self.warehouse.dataset.trim().is_empty() {
            return Err(ConfigError::Validation(
                "warehouse.dataset must not be empty".to_string(),
            ));
        }
        if self.pipeline.automated_actor.trim().is_empty() {
            return Err(ConfigError::Validation(
                "pipeline.automated_actor must not be empty".to_string(),
            ));
        }
        if self.pipeline.untouched_threshold_days < 0 {
            return Err(ConfigError::Validation(
                "pipeline.untouched_threshold_days must not be negative".to_string(),
            ));
        }
        if self.pipeline.closed_retention_days <= 0 {
            return Err(ConfigError::Validation(
                "pipeline.closed_retention_days must be greater than zero".to_string(),
            ));
        }
        if EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(ConfigError::Validation(format!(
                "logging.level `{}` is not a valid filter directive",
                self.logging.level
            )));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(Some(path.to_path_buf()));
    }

    Ok([
        PathBuf::from(DEFAULT_CONFIG_FILE),
        PathBuf::from("config").join(DEFAULT_CONFIG_FILE),
    ]
    .into_iter()
    .find(|path| path.exists()))
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str::<ConfigPatch>(&raw).map_err(|source| ConfigError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        })
}
