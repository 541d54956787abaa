//! Tellinger over den korrigerte statushistorikken.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enrich::{latest_per_case, EnrichedEvent};
use crate::recency::LastUpdate;
use crate::status::StatusRow;
use crate::{Sektor, Status};

const TOPP_NAERINGER: usize = 10;

pub use crate::time::pretty_time_delta;

/// Antall overganger fra én status til en annen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusTransition {
    pub forrige_status: Status,
    pub status: Status,
    pub antall: usize,
}

/// Teller statusoverganger, flest først.
///
/// Saker som endte som `SLETTET` er utelatt. Første rad i hver sak har ingen
/// forrige status og teller ikke.
pub fn status_transitions(rows: &[StatusRow]) -> Vec<StatusTransition> {
    let mut counts: BTreeMap<(Status, Status), usize> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.siste_status != Status::Slettet) {
        if let Some(forrige) = row.forrige_status {
            *counts.entry((forrige, row.status())).or_default() += 1;
        }
    }

    let mut transitions: Vec<StatusTransition> = counts
        .into_iter()
        .map(|((forrige_status, status), antall)| StatusTransition {
            forrige_status,
            status,
            antall,
        })
        .collect();
    transitions.sort_by(|a, b| b.antall.cmp(&a.antall));
    transitions
}

/// Antall saker i hver status ved utgangen av en dag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusCountDay {
    pub dato: NaiveDate,
    pub per_status: BTreeMap<Status, i64>,
}

/// Løpende antall saker per status fra første hendelse til og med `to`.
///
/// Hver rad legger én sak til sin status og trekker den fra forrige status.
/// `NY` er utelatt siden den bare er et startpunkt.
pub fn status_counts_over_time(rows: &[StatusRow], to: NaiveDate) -> Vec<StatusCountDay> {
    let Some(from) = rows.iter().map(|row| row.endret_tidspunkt().date()).min() else {
        return Vec::new();
    };

    let mut per_dag: BTreeMap<NaiveDate, Vec<&StatusRow>> = BTreeMap::new();
    for row in rows {
        per_dag
            .entry(row.endret_tidspunkt().date())
            .or_default()
            .push(row);
    }

    let mut running: BTreeMap<Status, i64> = Status::ORDERED
        .into_iter()
        .filter(|status| *status != Status::Ny)
        .map(|status| (status, 0))
        .collect();

    from.iter_days()
        .take_while(|dato| *dato <= to)
        .map(|dato| {
            for row in per_dag.get(&dato).into_iter().flatten() {
                if let Some(forrige) = row.forrige_status {
                    if let Some(count) = running.get_mut(&forrige) {
                        *count -= 1;
                    }
                }
                if let Some(count) = running.get_mut(&row.status()) {
                    *count += 1;
                }
            }
            StatusCountDay {
                dato,
                per_status: running.clone(),
            }
        })
        .collect()
}

/// Antall aktive saker som står i `status` nå.
pub fn active_cases_in(rows: &[StatusRow], status: Status) -> usize {
    let mut saker: Vec<&str> = rows
        .iter()
        .filter(|row| row.aktiv_sak && row.siste_status == status)
        .map(StatusRow::saksnummer)
        .collect();
    saker.dedup();
    saker.len()
}

/// Én søyle i fordelingen av dager siden siste oppdatering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistogramBin {
    /// Nedre grense, inkludert.
    pub fra_dager: i64,
    /// Øvre grense, ikke inkludert.
    pub til_dager: i64,
    pub antall: usize,
}

/// Fordeler sakene i søyler på `bin_days` dager, fra null til største verdi.
pub fn last_update_histogram(updates: &[LastUpdate], bin_days: i64) -> Vec<HistogramBin> {
    let bin_days = bin_days.max(1);
    let Some(max) = updates
        .iter()
        .map(|update| update.dager_siden_siste_oppdatering)
        .max()
    else {
        return Vec::new();
    };

    let bins = max.max(0) / bin_days + 1;
    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|index| HistogramBin {
            fra_dager: index * bin_days,
            til_dager: (index + 1) * bin_days,
            antall: 0,
        })
        .collect();

    for update in updates {
        let index = update.dager_siden_siste_oppdatering.max(0) / bin_days;
        if let Some(bin) = usize::try_from(index)
            .ok()
            .and_then(|index| histogram.get_mut(index))
        {
            bin.antall += 1;
        }
    }

    histogram
}

/// Hvem virksomhetene i sakene er, fra siste kjente opplysninger per sak.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Virksomhetsprofil {
    pub antall_saker: usize,
    pub per_storrelse: BTreeMap<String, usize>,
    pub per_sektor: BTreeMap<String, usize>,
    /// De ti vanligste hovednæringene, flest først.
    pub topp_naeringer: Vec<(String, usize)>,
    pub snitt_sykefravaersprosent: Option<f64>,
}

pub fn virksomhetsprofil(rows: &[EnrichedEvent]) -> Virksomhetsprofil {
    let latest = latest_per_case(rows);

    let mut per_storrelse: BTreeMap<String, usize> = BTreeMap::new();
    let mut per_sektor: BTreeMap<String, usize> = BTreeMap::new();
    let mut naeringer: BTreeMap<&str, usize> = BTreeMap::new();
    let mut sykefravaer: Vec<f64> = Vec::new();

    for row in &latest {
        *per_storrelse
            .entry(row.antall_personer_gruppe.clone())
            .or_default() += 1;
        let sektor = row
            .event
            .sektor
            .as_deref()
            .and_then(Sektor::from_code)
            .map_or("Ukjent", |sektor| sektor.label());
        *per_sektor.entry(sektor.to_string()).or_default() += 1;
        *naeringer
            .entry(row.hoved_nering_truncated.as_str())
            .or_default() += 1;
        sykefravaer.extend(row.event.sykefravaersprosent);
    }

    let mut topp_naeringer: Vec<(String, usize)> = naeringer
        .into_iter()
        .map(|(navn, antall)| (navn.to_string(), antall))
        .collect();
    topp_naeringer.sort_by(|a, b| b.1.cmp(&a.1));
    topp_naeringer.truncate(TOPP_NAERINGER);

    let snitt_sykefravaersprosent = if sykefravaer.is_empty() {
        None
    } else {
        Some(sykefravaer.iter().sum::<f64>() / sykefravaer.len() as f64)
    };

    Virksomhetsprofil {
        antall_saker: latest.len(),
        per_storrelse,
        per_sektor,
        topp_naeringer,
        snitt_sykefravaersprosent,
    }
}
