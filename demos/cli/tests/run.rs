use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use saksflyt_cli::config::AppConfig;
use saksflyt_cli::execute;
use saksflyt_core::Resultatomrade;
use serde_json::Value;
use tempfile::TempDir;

fn export_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../saksflyt-warehouse/tests/data/export")
}

fn config(output: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.warehouse.export_dir = export_dir();
    config.report.output_dir = output.path().to_path_buf();
    config.report.as_of = NaiveDate::from_ymd_opt(2024, 1, 12);
    config
}

fn read(output: &TempDir, name: &str) -> Value {
    let text = fs::read_to_string(output.path().join(name)).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn writes_every_report() {
    let output = TempDir::new().unwrap();

    let written = execute(&config(&output)).unwrap();

    for name in [
        "status.json",
        "eierskap.json",
        "prosess.json",
        "leveranse_siste_status.json",
        "siste_oppdatering.json",
        "statusflyt.json",
        "trakt.json",
        "status_per_dag.json",
        "sammendrag.json",
    ] {
        assert!(
            written.contains(&output.path().join(name)),
            "{name} was not written"
        );
    }

    assert_eq!(read(&output, "status.json").as_array().unwrap().len(), 9);

    let sammendrag = read(&output, "sammendrag.json");
    assert_eq!(sammendrag["saker"], 3);
    assert_eq!(sammendrag["aktive_saker"], 2);
    assert_eq!(sammendrag["korrigering"]["applied_undos"], 1);

    let siste = read(&output, "siste_oppdatering.json");
    assert_eq!(siste[0]["saksnummer"], "S1");
    assert_eq!(siste[0]["dager_siden_siste_oppdatering"], 1);

    let trakt = read(&output, "trakt.json");
    assert_eq!(trakt["aktive"], 2);
    assert_eq!(trakt["med_samarbeidsplan"], 1);
}

#[test]
fn result_area_limits_the_reports() {
    let output = TempDir::new().unwrap();
    let mut config = config(&output);
    config.report.resultatomrade = Some(Resultatomrade::Oslo);

    execute(&config).unwrap();

    let status = read(&output, "status.json");
    let saker: Vec<&str> = status
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["saksnummer"].as_str().unwrap())
        .collect();
    assert_eq!(saker, vec!["S1"; 4]);
    assert_eq!(read(&output, "sammendrag.json")["resultatomrade"], "oslo");
}

#[test]
fn missing_export_directory_fails() {
    let output = TempDir::new().unwrap();
    let mut config = config(&output);
    config.warehouse.export_dir = output.path().join("finnes-ikke");

    let err = execute(&config).unwrap_err();

    assert!(format!("{err:#}").contains("finnes-ikke"));
}
