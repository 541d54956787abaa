//! Rekonstruksjon av statushistorikk per sak.
//!
//! Hendelsesloggen er append-only. Tilbake-knappen logges som en egen
//! `TILBAKE`-hendelse som opphever den forrige gjenværende endringen i saken,
//! så historikken må korrigeres før forrige og siste status kan utledes.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{CaseEvent, SaksflytConfig, SaksflytError, Status, TieBreak};

/// Én gjenværende statushendelse med utledede kolonner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusRow {
    #[serde(flatten)]
    pub event: CaseEvent,
    pub forrige_status: Option<Status>,
    #[serde(rename = "forrige_endretTidspunkt")]
    pub forrige_endret_tidspunkt: Option<NaiveDateTime>,
    pub siste_status: Status,
    pub aktiv_sak: bool,
    #[serde(
        rename = "intervall_tid_siden_siste_endring",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub intervall: Option<Intervall>,
}

impl StatusRow {
    pub fn saksnummer(&self) -> &str {
        &self.event.saksnummer
    }

    pub fn status(&self) -> Status {
        self.event.status
    }

    pub fn endret_tidspunkt(&self) -> NaiveDateTime {
        self.event.endret_tidspunkt
    }

    /// Tid siden forrige statusendring i samme sak.
    pub fn tid_siden_siste_endring(&self) -> Option<Duration> {
        self.forrige_endret_tidspunkt
            .map(|previous| self.event.endret_tidspunkt - previous)
    }
}

/// Telling av tilbake-hendelser fra korrigeringen.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UndoReport {
    /// TILBAKE uten statusendring, fjernet uten å oppheve noe.
    pub invalid_undos: usize,
    /// TILBAKE som opphevet en tidligere rad.
    pub applied_undos: usize,
    /// TILBAKE uten gjenværende rad å oppheve i samme sak.
    pub orphan_undos: usize,
}

/// Korrigert statushistorikk sortert på (saksnummer, endret tidspunkt).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusTimeline {
    pub rows: Vec<StatusRow>,
    pub report: UndoReport,
}

impl StatusTimeline {
    pub fn rows_for<'a>(&'a self, saksnummer: &'a str) -> impl Iterator<Item = &'a StatusRow> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.event.saksnummer == saksnummer)
    }

    /// Siste status per sak.
    pub fn current_statuses(&self) -> BTreeMap<&str, Status> {
        self.rows
            .iter()
            .map(|row| (row.saksnummer(), row.siste_status))
            .collect()
    }

    pub fn active_case_count(&self) -> usize {
        self.current_statuses()
            .values()
            .filter(|status| status.is_active())
            .count()
    }
}

/// Bygger statushistorikken fra statushendelsene til alle saker.
///
/// Tar eierskap til input og returnerer nye rader; ingenting deles med
/// kallerens tabell.
pub fn reconstruct_status_timeline(
    events: Vec<CaseEvent>,
    config: &SaksflytConfig,
) -> Result<StatusTimeline, SaksflytError> {
    let mut events = events;
    sort_events(&mut events, config.tie_break);

    let (mut retained, report) = undo_correct(events, config.max_invalid_undos)?;
    sort_events(&mut retained, config.tie_break);

    let rows = derive_columns(retained);
    info!(
        rader = rows.len(),
        ugyldige_tilbake = report.invalid_undos,
        tilbake = report.applied_undos,
        foreldrelose_tilbake = report.orphan_undos,
        "rekonstruerte statushistorikk"
    );

    Ok(StatusTimeline { rows, report })
}

/// Stabil sortering på (saksnummer, endret tidspunkt).
pub fn sort_events(events: &mut [CaseEvent], tie_break: TieBreak) {
    match tie_break {
        TieBreak::InputOrder => events.sort_by(|a, b| {
            a.saksnummer
                .cmp(&b.saksnummer)
                .then(a.endret_tidspunkt.cmp(&b.endret_tidspunkt))
        }),
        TieBreak::Ingestion => events.sort_by(|a, b| {
            a.saksnummer
                .cmp(&b.saksnummer)
                .then(a.endret_tidspunkt.cmp(&b.endret_tidspunkt))
                .then(a.tidsstempel.cmp(&b.tidsstempel))
                .then(a.sekvens.cmp(&b.sekvens))
        }),
    }
}

/// Fjerner ugyldige tilbake-hendelser og opphever radene gyldige
/// tilbake-hendelser peker på. Forutsetter sortert input.
///
/// Hver sak har en stabel med gjenværende rader; en `TILBAKE` fjerner
/// toppen av stabelen og legges aldri på selv.
pub fn undo_correct(
    sorted: Vec<CaseEvent>,
    max_invalid_undos: usize,
) -> Result<(Vec<CaseEvent>, UndoReport), SaksflytError> {
    let mut report = UndoReport::default();

    let invalid: Vec<bool> = sorted
        .iter()
        .enumerate()
        .map(|(index, event)| {
            event.hendelse.is_undo()
                && index
                    .checked_sub(1)
                    .map(|previous| &sorted[previous])
                    .is_some_and(|previous| {
                        previous.saksnummer == event.saksnummer && previous.status == event.status
                    })
        })
        .collect();

    report.invalid_undos = invalid.iter().filter(|flag| **flag).count();
    if report.invalid_undos > max_invalid_undos {
        return Err(SaksflytError::InvalidUndoThreshold {
            found: report.invalid_undos,
            limit: max_invalid_undos,
        });
    }
    if report.invalid_undos > 0 {
        warn!(
            antall = report.invalid_undos,
            "fjerner tilbake-hendelser som ikke endret status"
        );
    }

    let candidates: Vec<CaseEvent> = sorted
        .into_iter()
        .zip(invalid)
        .filter_map(|(event, invalid)| (!invalid).then_some(event))
        .collect();

    let mut keep = vec![true; candidates.len()];
    let mut predecessors: Vec<usize> = Vec::new();
    let mut current_case: Option<&str> = None;

    for (index, event) in candidates.iter().enumerate() {
        if current_case != Some(event.saksnummer.as_str()) {
            predecessors.clear();
            current_case = Some(event.saksnummer.as_str());
        }

        if !event.hendelse.is_undo() {
            predecessors.push(index);
            continue;
        }

        keep[index] = false;
        match predecessors.pop() {
            Some(undone) => {
                keep[undone] = false;
                report.applied_undos += 1;
            }
            None => {
                report.orphan_undos += 1;
                warn!(
                    saksnummer = %event.saksnummer,
                    endret_tidspunkt = %event.endret_tidspunkt,
                    "tilbake-hendelse uten tidligere rad i saken"
                );
            }
        }
    }

    let retained: Vec<CaseEvent> = candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(event, keep)| keep.then_some(event))
        .collect();
    debug!(gjenvaerende = retained.len(), "korrigerte for tilbake-knappen");

    Ok((retained, report))
}

fn derive_columns(retained: Vec<CaseEvent>) -> Vec<StatusRow> {
    let mut last_status: HashMap<String, Status> = HashMap::new();
    for event in &retained {
        last_status.insert(event.saksnummer.clone(), event.status);
    }

    let mut rows: Vec<StatusRow> = Vec::with_capacity(retained.len());
    for event in retained {
        let previous = rows
            .last()
            .filter(|previous| previous.event.saksnummer == event.saksnummer)
            .map(|previous| (previous.event.status, previous.event.endret_tidspunkt));

        let siste_status = last_status
            .get(&event.saksnummer)
            .copied()
            .unwrap_or(event.status);

        rows.push(StatusRow {
            forrige_status: previous.map(|(status, _)| status),
            forrige_endret_tidspunkt: previous.map(|(_, at)| at),
            siste_status,
            aktiv_sak: siste_status.is_active(),
            intervall: None,
            event,
        });
    }

    rows
}

/// Intervaller for tid mellom to statusendringer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Intervall {
    #[serde(rename = "0-1 min")]
    UnderEttMinutt,
    #[serde(rename = "1-10 min")]
    TilTiMinutter,
    #[serde(rename = "10-60 min")]
    TilEnTime,
    #[serde(rename = "1-8 timer")]
    TilAatteTimer,
    #[serde(rename = "8-24 timer")]
    TilEttDogn,
    #[serde(rename = "1-10 dager")]
    TilTiDager,
    #[serde(rename = "10-30 dager")]
    TilTrettiDager,
    #[serde(rename = "30-100 dager")]
    TilHundreDager,
    #[serde(rename = "100-365 dager")]
    TilEttAar,
    #[serde(rename = "fra 365 dager")]
    OverEttAar,
}

impl Intervall {
    pub const ORDERED: [Intervall; 10] = [
        Intervall::UnderEttMinutt,
        Intervall::TilTiMinutter,
        Intervall::TilEnTime,
        Intervall::TilAatteTimer,
        Intervall::TilEttDogn,
        Intervall::TilTiDager,
        Intervall::TilTrettiDager,
        Intervall::TilHundreDager,
        Intervall::TilEttAar,
        Intervall::OverEttAar,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Intervall::UnderEttMinutt => "0-1 min",
            Intervall::TilTiMinutter => "1-10 min",
            Intervall::TilEnTime => "10-60 min",
            Intervall::TilAatteTimer => "1-8 timer",
            Intervall::TilEttDogn => "8-24 timer",
            Intervall::TilTiDager => "1-10 dager",
            Intervall::TilTrettiDager => "10-30 dager",
            Intervall::TilHundreDager => "30-100 dager",
            Intervall::TilEttAar => "100-365 dager",
            Intervall::OverEttAar => "fra 365 dager",
        }
    }

    /// Nedre grense er inkludert i hvert intervall.
    pub fn classify(elapsed: Duration) -> Self {
        let seconds = elapsed.num_seconds().max(0);
        let days = seconds / 86_400;

        match days {
            365.. => Intervall::OverEttAar,
            100.. => Intervall::TilEttAar,
            30.. => Intervall::TilHundreDager,
            10.. => Intervall::TilTrettiDager,
            1.. => Intervall::TilTiDager,
            _ => match seconds {
                0..=59 => Intervall::UnderEttMinutt,
                60..=599 => Intervall::TilTiMinutter,
                600..=3_599 => Intervall::TilEnTime,
                3_600..=28_799 => Intervall::TilAatteTimer,
                _ => Intervall::TilEttDogn,
            },
        }
    }
}

/// Fyller inn intervallet siden forrige endring på hver rad.
pub fn with_intervals(rows: Vec<StatusRow>) -> Vec<StatusRow> {
    rows.into_iter()
        .map(|mut row| {
            row.intervall = row.tid_siden_siste_endring().map(Intervall::classify);
            row
        })
        .collect()
}
