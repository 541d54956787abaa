//! Derived tables written as JSON files, one per report.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Duration, NaiveDateTime};
use saksflyt_core::aggregate::{
    last_update_histogram, status_counts_over_time, status_transitions, virksomhetsprofil,
};
use saksflyt_core::enrich::{explode_ikke_aktuell, filter_closed_before};
use saksflyt_core::period::{period_summary, throughput};
use saksflyt_core::recency::{compute_last_update, untouched_cases_over_time};
use saksflyt_core::samarbeid::{antall_planer, collaboration_funnel, topics_with_status};
use saksflyt_core::{Resultatomrade, Status, UndoReport};
use saksflyt_warehouse::Datagrunnlag;
use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;

const HISTOGRAM_BIN_DAYS: i64 = 7;
const UNTOUCHED_WINDOW_DAYS: i64 = 90;
const THROUGHPUT_MONTHS: usize = 12;
const PLAN_STATUS_IN_PROGRESS: &str = "PÅGÅR";

#[derive(Debug, Serialize)]
struct Sammendrag {
    beregningstidspunkt: NaiveDateTime,
    resultatomrade: Option<Resultatomrade>,
    saker: usize,
    aktive_saker: usize,
    statusrader: usize,
    leveranser: usize,
    korrigering: UndoReport,
}

#[derive(Debug, Serialize)]
struct PlanOversikt {
    antall_planer: usize,
    pagaende_undertemaer: BTreeMap<&'static str, usize>,
}

/// Computes every report from `grunnlag` and writes it under
/// `config.report.output_dir`. Returns the written paths.
pub fn write_reports(
    grunnlag: &Datagrunnlag,
    config: &AppConfig,
    as_of: NaiveDateTime,
) -> anyhow::Result<Vec<PathBuf>> {
    let dir = config.report.output_dir.as_path();
    fs::create_dir_all(dir)
        .with_context(|| format!("could not create output directory {}", dir.display()))?;

    let status = &grunnlag.status.rows;
    let mut written = Vec::new();

    written.push(write_json(dir, "status.json", status)?);
    written.push(write_json(dir, "eierskap.json", &grunnlag.eierskap)?);
    written.push(write_json(dir, "prosess.json", &grunnlag.prosess)?);
    written.push(write_json(
        dir,
        "leveranse_siste_status.json",
        &grunnlag.leveranse_siste_status,
    )?);

    let siste = compute_last_update(status, &grunnlag.eierskap, &grunnlag.leveranser, as_of);
    written.push(write_json(dir, "siste_oppdatering.json", &siste)?);
    written.push(write_json(
        dir,
        "siste_oppdatering_histogram.json",
        &last_update_histogram(&siste, HISTOGRAM_BIN_DAYS),
    )?);

    let to = as_of.date() - Duration::days(1);
    let from = to - Duration::days(UNTOUCHED_WINDOW_DAYS);
    written.push(write_json(
        dir,
        "urorte_saker.json",
        &untouched_cases_over_time(
            status,
            &grunnlag.eierskap,
            &grunnlag.leveranser,
            from,
            to,
            config.pipeline.untouched_threshold_days,
        ),
    )?);

    written.push(write_json(dir, "statusflyt.json", &status_transitions(status))?);

    let retention = config.pipeline.closed_retention_days;
    let recent_status = filter_closed_before(status.clone(), retention, as_of);
    written.push(write_json(
        dir,
        "status_per_dag.json",
        &status_counts_over_time(&recent_status, as_of.date()),
    )?);
    let recent_statistikk = filter_closed_before(grunnlag.statistikk.clone(), retention, as_of);
    written.push(write_json(
        dir,
        "virksomhetsprofil.json",
        &virksomhetsprofil(&recent_statistikk),
    )?);

    written.push(write_json(
        dir,
        "ikke_aktuell.json",
        &explode_ikke_aktuell(status),
    )?);
    written.push(write_json(
        dir,
        "periode.json",
        &period_summary(
            status,
            &grunnlag.leveranser,
            as_of.date(),
            config.report.periode,
        ),
    )?);
    written.push(write_json(
        dir,
        "gjennomstromming.json",
        &throughput(status, Status::ViBistar, as_of.date(), THROUGHPUT_MONTHS),
    )?);

    written.push(write_json(
        dir,
        "trakt.json",
        &collaboration_funnel(
            &grunnlag.samarbeid,
            &grunnlag.sporreundersokelser,
            &grunnlag.samarbeidsplaner,
        ),
    )?);
    written.push(write_json(
        dir,
        "samarbeidsplaner.json",
        &PlanOversikt {
            antall_planer: antall_planer(&grunnlag.samarbeidsplaner),
            pagaende_undertemaer: topics_with_status(
                &grunnlag.samarbeidsplaner,
                PLAN_STATUS_IN_PROGRESS,
            ),
        },
    )?);

    let sammendrag = Sammendrag {
        beregningstidspunkt: as_of,
        resultatomrade: config.report.resultatomrade,
        saker: grunnlag.status.current_statuses().len(),
        aktive_saker: grunnlag.status.active_case_count(),
        statusrader: status.len(),
        leveranser: grunnlag.leveranser.len(),
        korrigering: grunnlag.status.report,
    };
    written.push(write_json(dir, "sammendrag.json", &sammendrag)?);

    info!(dir = %dir.display(), files = written.len(), "wrote reports");
    Ok(written)
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    let file =
        File::create(&path).with_context(|| format!("could not create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("could not write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("could not write {}", path.display()))?;
    Ok(path)
}
