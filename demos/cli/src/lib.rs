//! Batch runner: reads table exports, rebuilds the case timelines and writes
//! the derived tables as JSON.

pub mod config;
pub mod logging;
pub mod report;

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use saksflyt_core::period::Periode;
use saksflyt_core::time::{now, start_of_day};
use saksflyt_core::Resultatomrade;
use saksflyt_warehouse::{build_datagrunnlag, DatagrunnlagOptions, ExportDirSource};
use tracing::info;

use crate::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Parser, Debug, Default)]
#[command(
    name = "saksflyt",
    about = "Rekonstruerer statushistorikk for IA-saker fra eksporterte tabeller."
)]
pub struct Cli {
    /// TOML-fil med konfigurasjon. Standard er `saksflyt.toml` hvis den finnes.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Mappe med én `<tabell>.json` eller `<tabell>.ndjson` per tabell.
    #[arg(short, long)]
    pub export_dir: Option<PathBuf>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub dataset: Option<String>,
    /// Begrens til ett resultatområde, f.eks. `oslo` eller `vest-viken`.
    #[arg(short, long)]
    pub resultatomrade: Option<Resultatomrade>,
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Beregningsdato (YYYY-MM-DD). Standard er nå.
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
    /// `uke` eller `måned`.
    #[arg(long)]
    pub periode: Option<Periode>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            overrides: ConfigOverrides {
                project: self.project.clone(),
                dataset: self.dataset.clone(),
                export_dir: self.export_dir.clone(),
                resultatomrade: self.resultatomrade,
                output_dir: self.output_dir.clone(),
                as_of: self.as_of,
                periode: self.periode,
                log_level: self.log_level.clone(),
                log_format: self.log_format,
            },
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.load_options()).context("invalid configuration")?;
    logging::init_logging(&config.logging);

    let written = execute(&config)?;
    println!(
        "Skrev {} filer til {}",
        written.len(),
        config.report.output_dir.display()
    );
    Ok(())
}

/// Builds the data set from the export directory and writes every report.
pub fn execute(config: &AppConfig) -> anyhow::Result<Vec<PathBuf>> {
    let source = ExportDirSource::new(&config.warehouse.export_dir);
    let options = DatagrunnlagOptions {
        project: config.warehouse.project.clone(),
        dataset: config.warehouse.dataset.clone(),
        resultatomrade: config.report.resultatomrade,
    };
    let as_of = config.report.as_of.map(start_of_day).unwrap_or_else(now);

    info!(
        export_dir = %config.warehouse.export_dir.display(),
        %as_of,
        "building data set"
    );
    let grunnlag = build_datagrunnlag(&source, &options, &config.pipeline).with_context(|| {
        format!(
            "could not build data set from {}",
            config.warehouse.export_dir.display()
        )
    })?;

    report::write_reports(&grunnlag, config, as_of)
}
