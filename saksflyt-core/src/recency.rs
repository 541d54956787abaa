//! Siste oppdatering per aktiv sak på tvers av status, eierskap og leveranser.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::status::StatusRow;
use crate::time::{floor_days, start_of_day};
use crate::{CaseEvent, Delivery, Status};

/// Når en aktiv sak sist ble rørt, sett fra en beregningsdato.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastUpdate {
    pub saksnummer: String,
    pub siste_oppdatering_status: NaiveDateTime,
    pub siste_oppdatering_eierskap: Option<NaiveDateTime>,
    pub siste_oppdatering_leveranse: Option<NaiveDateTime>,
    pub siste_oppdatering: NaiveDateTime,
    pub dager_siden_siste_oppdatering: i64,
    pub status_beregningsdato: Status,
}

/// Beregner siste oppdatering for saker som var aktive på `as_of`.
///
/// Bare hendelser strengt før `as_of` teller. En strøm uten hendelser for
/// saken bidrar ikke. Resultatet er sortert på saksnummer.
pub fn compute_last_update(
    status: &[StatusRow],
    eierskap: &[CaseEvent],
    leveranser: &[Delivery],
    as_of: NaiveDateTime,
) -> Vec<LastUpdate> {
    let mut status_at_cutoff: BTreeMap<&str, (Status, NaiveDateTime)> = BTreeMap::new();
    for row in status.iter().filter(|row| row.endret_tidspunkt() < as_of) {
        let at = row.endret_tidspunkt();
        status_at_cutoff
            .entry(row.saksnummer())
            .and_modify(|latest| {
                if at >= latest.1 {
                    *latest = (row.status(), at);
                }
            })
            .or_insert((row.status(), at));
    }

    let eierskap_max = max_per_case(
        eierskap
            .iter()
            .map(|event| (event.saksnummer.as_str(), event.endret_tidspunkt)),
        as_of,
    );
    let leveranse_max = max_per_case(
        leveranser
            .iter()
            .map(|row| (row.saksnummer.as_str(), row.sist_endret)),
        as_of,
    );

    let updates: Vec<LastUpdate> = status_at_cutoff
        .into_iter()
        .filter(|(_, (status, _))| status.is_active())
        .map(|(saksnummer, (status, status_at))| {
            let eierskap_at = eierskap_max.get(saksnummer).copied();
            let leveranse_at = leveranse_max.get(saksnummer).copied();
            let siste = [Some(status_at), eierskap_at, leveranse_at]
                .into_iter()
                .flatten()
                .max()
                .unwrap_or(status_at);

            LastUpdate {
                saksnummer: saksnummer.to_string(),
                siste_oppdatering_status: status_at,
                siste_oppdatering_eierskap: eierskap_at,
                siste_oppdatering_leveranse: leveranse_at,
                siste_oppdatering: siste,
                dager_siden_siste_oppdatering: floor_days(as_of - siste),
                status_beregningsdato: status,
            }
        })
        .collect();

    debug!(%as_of, aktive_saker = updates.len(), "beregnet siste oppdatering");
    updates
}

fn max_per_case<'a>(
    stamps: impl Iterator<Item = (&'a str, NaiveDateTime)>,
    as_of: NaiveDateTime,
) -> HashMap<&'a str, NaiveDateTime> {
    let mut latest: HashMap<&str, NaiveDateTime> = HashMap::new();
    for (saksnummer, at) in stamps.filter(|(_, at)| *at < as_of) {
        latest
            .entry(saksnummer)
            .and_modify(|current| *current = (*current).max(at))
            .or_insert(at);
    }
    latest
}

/// Antall urørte saker per aktiv status for én dag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UntouchedDay {
    pub dato: NaiveDate,
    pub per_status: BTreeMap<Status, usize>,
}

impl UntouchedDay {
    pub fn total(&self) -> usize {
        self.per_status.values().sum()
    }
}

/// Teller, for hver dag i `[from, to]`, aktive saker som ikke har vært rørt
/// på mer enn `threshold_days` dager ved utgangen av dagen.
pub fn untouched_cases_over_time(
    status: &[StatusRow],
    eierskap: &[CaseEvent],
    leveranser: &[Delivery],
    from: NaiveDate,
    to: NaiveDate,
    threshold_days: i64,
) -> Vec<UntouchedDay> {
    from.iter_days()
        .take_while(|dato| *dato <= to)
        .map(|dato| {
            let cutoff = start_of_day(dato) + Duration::days(1);
            let mut per_status: BTreeMap<Status, usize> =
                Status::ACTIVE.into_iter().map(|status| (status, 0)).collect();

            for update in compute_last_update(status, eierskap, leveranser, cutoff) {
                if update.dager_siden_siste_oppdatering > threshold_days {
                    *per_status.entry(update.status_beregningsdato).or_default() += 1;
                }
            }

            UntouchedDay { dato, per_status }
        })
        .collect()
}
