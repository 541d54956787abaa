//! Assembly of the prepared data set every report is computed from.

use std::collections::HashSet;

use saksflyt_core::delivery::{latest_delivery_status, normalize_deliveries};
use saksflyt_core::enrich::{
    case_profiles, enrich_events, filter_resultatomrade, EnrichedEvent, KommuneMapping,
};
use saksflyt_core::samarbeid::{
    answered_surveys, attach_case_profiles, filter_samarbeid_resultatomrade, included_plan_topics,
    Samarbeid, Samarbeidsplan, Sporreundersokelse,
};
use saksflyt_core::split::split_events;
use saksflyt_core::status::{reconstruct_status_timeline, with_intervals};
use saksflyt_core::{CaseEvent, Delivery, Resultatomrade, SaksflytConfig, StatusTimeline};
use tracing::{info, warn};

use crate::loader::load_deduplicated;
use crate::{rows, TableRef, WarehouseError, WarehouseSource};
use crate::{
    TABLE_ADM_ENHETER, TABLE_LEVERANSE, TABLE_SAMARBEID, TABLE_SAMARBEIDSPLAN, TABLE_STATISTIKK,
    TABLE_SPORREUNDERSOKELSE,
};

/// Where to read from and which result area to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatagrunnlagOptions {
    pub project: String,
    pub dataset: String,
    pub resultatomrade: Option<Resultatomrade>,
}

impl DatagrunnlagOptions {
    fn table(&self, table: &str) -> TableRef {
        TableRef::new(&self.project, &self.dataset, table)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datagrunnlag {
    /// The whole event log, enriched and sorted by change time.
    pub statistikk: Vec<EnrichedEvent>,
    pub status: StatusTimeline,
    pub eierskap: Vec<CaseEvent>,
    pub prosess: Vec<CaseEvent>,
    pub leveranser: Vec<Delivery>,
    pub leveranse_siste_status: Vec<Delivery>,
    pub samarbeid: Vec<Samarbeid>,
    pub sporreundersokelser: Vec<Sporreundersokelse>,
    pub samarbeidsplaner: Vec<Samarbeidsplan>,
}

/// Loads every table and runs the core transforms in dependency order.
///
/// The event log and the delivery table are required. The municipality and
/// collaboration tables are optional and come back empty when missing.
pub fn build_datagrunnlag<S>(
    source: &S,
    options: &DatagrunnlagOptions,
    config: &SaksflytConfig,
) -> Result<Datagrunnlag, WarehouseError>
where
    S: WarehouseSource + ?Sized,
{
    let kommuner = optional(
        TABLE_ADM_ENHETER,
        load_deduplicated(
            source,
            &options.table(TABLE_ADM_ENHETER),
            &["kommunenummer 2023"],
        ),
    )?;
    let kommuner: KommuneMapping = rows::kommune_mapping(&kommuner);

    let raw = load_deduplicated(
        source,
        &options.table(TABLE_STATISTIKK),
        &["endretAvHendelseId"],
    )?;
    let events = rows::case_events(TABLE_STATISTIKK, &raw)?;
    drop(raw);

    let mut statistikk = enrich_events(events, &kommuner);
    let profiles = case_profiles(&statistikk);
    if let Some(omrade) = options.resultatomrade {
        statistikk = filter_resultatomrade(statistikk, omrade);
    }
    let saker: HashSet<&str> = statistikk
        .iter()
        .map(|row| row.event.saksnummer.as_str())
        .collect();

    let streams = split_events(statistikk.iter().map(|row| row.event.clone()).collect());
    let mut status = reconstruct_status_timeline(streams.status, config)?;
    status.rows = with_intervals(status.rows);

    // Every version of a delivery is its own row, keyed on when it was changed.
    let raw = load_deduplicated(
        source,
        &options.table(TABLE_LEVERANSE),
        &["id", "sistEndret"],
    )?;
    let mut leveranser = normalize_deliveries(rows::deliveries(TABLE_LEVERANSE, &raw)?, config);
    if options.resultatomrade.is_some() {
        leveranser.retain(|row| saker.contains(row.saksnummer.as_str()));
    }
    let leveranse_siste_status = latest_delivery_status(&leveranser);

    let raw = optional(
        TABLE_SAMARBEID,
        load_deduplicated(source, &options.table(TABLE_SAMARBEID), &["id"]),
    )?;
    let mut samarbeid = attach_case_profiles(rows::samarbeid(TABLE_SAMARBEID, &raw)?, &profiles);
    if let Some(omrade) = options.resultatomrade {
        samarbeid = filter_samarbeid_resultatomrade(samarbeid, omrade);
    }
    let samarbeid_ids: HashSet<i64> = samarbeid.iter().map(|row| row.id).collect();

    let raw = optional(
        TABLE_SPORREUNDERSOKELSE,
        load_deduplicated(source, &options.table(TABLE_SPORREUNDERSOKELSE), &["id"]),
    )?;
    let mut sporreundersokelser =
        answered_surveys(rows::sporreundersokelser(TABLE_SPORREUNDERSOKELSE, &raw)?);

    let raw = optional(
        TABLE_SAMARBEIDSPLAN,
        load_deduplicated(source, &options.table(TABLE_SAMARBEIDSPLAN), &["id"]),
    )?;
    let mut samarbeidsplaner =
        included_plan_topics(rows::samarbeidsplaner(TABLE_SAMARBEIDSPLAN, &raw)?);

    if options.resultatomrade.is_some() {
        sporreundersokelser.retain(|row| samarbeid_ids.contains(&row.samarbeid_id));
        samarbeidsplaner.retain(|row| samarbeid_ids.contains(&row.samarbeid_id));
    }

    info!(
        statistikk = statistikk.len(),
        status = status.rows.len(),
        eierskap = streams.eierskap.len(),
        prosess = streams.prosess.len(),
        leveranser = leveranser.len(),
        samarbeid = samarbeid.len(),
        resultatomrade = options.resultatomrade.map(|omrade| omrade.slug()),
        "prepared data set"
    );

    Ok(Datagrunnlag {
        statistikk,
        status,
        eierskap: streams.eierskap,
        prosess: streams.prosess,
        leveranser,
        leveranse_siste_status,
        samarbeid,
        sporreundersokelser,
        samarbeidsplaner,
    })
}

fn optional<T>(
    table: &str,
    loaded: Result<Vec<T>, WarehouseError>,
) -> Result<Vec<T>, WarehouseError> {
    match loaded {
        Err(WarehouseError::MissingTable(name)) => {
            warn!(table, qualified = %name, "optional table missing, continuing without it");
            Ok(Vec::new())
        }
        other => other,
    }
}
