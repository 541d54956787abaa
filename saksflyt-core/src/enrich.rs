//! Beriking av hendelser med fylke, resultatområde, næring og størrelse.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{
    lookup, AKERSHUS, FYLKER, FYLKE_RESULTATOMRADE, IKKEAKTUELL_HOVEDGRUNN, ROGALAND,
    ROGALAND_LUND, VIKEN_AKERSHUS,
};
use crate::status::StatusRow;
use crate::{CaseEvent, Naering, Resultatomrade, Sektor, Status};

const MAX_LABEL_CHARS: usize = 50;

/// Rader som bærer en sakshendelse.
pub trait HasCaseEvent {
    fn case_event(&self) -> &CaseEvent;
}

impl HasCaseEvent for CaseEvent {
    fn case_event(&self) -> &CaseEvent {
        self
    }
}

impl HasCaseEvent for StatusRow {
    fn case_event(&self) -> &CaseEvent {
        &self.event
    }
}

impl HasCaseEvent for EnrichedEvent {
    fn case_event(&self) -> &CaseEvent {
        &self.event
    }
}

pub fn fylkesnavn(fylkesnummer: &str) -> Option<&'static str> {
    lookup(&FYLKER, fylkesnummer)
}

/// Resultatområde for en virksomhet.
///
/// Akershus deles mellom Vest- og Øst-Viken etter kommune, og Lund kommune i
/// Rogaland følges opp av Agder.
pub fn resultatomrade(fylkesnummer: &str, kommunenummer: Option<&str>) -> Option<Resultatomrade> {
    match fylkesnummer {
        AKERSHUS => kommunenummer.and_then(|kommune| lookup(&VIKEN_AKERSHUS, kommune)),
        ROGALAND => kommunenummer.and_then(|kommune| lookup(&ROGALAND_LUND, kommune)),
        other => lookup(&FYLKE_RESULTATOMRADE, other),
    }
}

/// Hvorfor hovednæring ikke kunne hentes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaeringFeil {
    FeilFormat,
    Mangler,
}

impl NaeringFeil {
    pub fn label(&self) -> &'static str {
        match self {
            NaeringFeil::FeilFormat => "Feil ved innhenting av hovednæring, feil format",
            NaeringFeil::Mangler => "Feil ved innhenting av hovednæring, mangler næring",
        }
    }
}

/// Første næring i listen er hovednæringen.
pub fn hoved_naering(neringer: Option<&[Naering]>) -> Result<&str, NaeringFeil> {
    let neringer = neringer.ok_or(NaeringFeil::FeilFormat)?;
    neringer
        .first()
        .map(|naering| naering.navn.as_str())
        .ok_or(NaeringFeil::Mangler)
}

/// Kutter lange etiketter til 47 tegn og "...".
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() > MAX_LABEL_CHARS {
        let head: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
        format!("{head}...")
    } else {
        label.to_string()
    }
}

pub fn antall_personer_gruppe(antall_personer: Option<i64>) -> &'static str {
    match antall_personer {
        Some(0) => "0",
        Some(1..=4) => "1-4",
        Some(5..=19) => "5-19",
        Some(20..=49) => "20-49",
        Some(50..=99) => "50-99",
        Some(100..) => "100+",
        _ => "Ukjent",
    }
}

/// Oversetter kommunenummer fra 2023 til 2024.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KommuneMapping {
    fra_2023: HashMap<String, String>,
}

impl KommuneMapping {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fra_2023: pairs
                .into_iter()
                .map(|(old, new)| (old.into(), new.into()))
                .collect(),
        }
    }

    /// Nummer som er uendret returneres som de er.
    pub fn to_2024(&self, kommunenummer: &str) -> String {
        self.fra_2023
            .get(kommunenummer)
            .cloned()
            .unwrap_or_else(|| kommunenummer.to_string())
    }

    pub fn len(&self) -> usize {
        self.fra_2023.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fra_2023.is_empty()
    }
}

/// Sakshendelse med avledede kolonner for visningene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedEvent {
    #[serde(flatten)]
    pub event: CaseEvent,
    #[serde(rename = "endretTidspunkt_måned")]
    pub endret_maaned: String,
    pub fylkesnavn: Option<String>,
    pub resultatomrade: Option<Resultatomrade>,
    #[serde(rename = "kommunenummer 2024")]
    pub kommunenummer_2024: Option<String>,
    pub hoved_nering: String,
    pub hoved_nering_truncated: String,
    #[serde(rename = "antallPersoner_gruppe")]
    pub antall_personer_gruppe: String,
}

/// Beriker og sorterer hendelsene på endret tidspunkt.
///
/// Rader med kjente datamangler (tom næringsliste, manglende fylke) beholdes
/// med en reserveverdi; antallet logges.
pub fn enrich_events(events: Vec<CaseEvent>, kommuner: &KommuneMapping) -> Vec<EnrichedEvent> {
    let mut events = events;
    events.sort_by_key(|event| event.endret_tidspunkt);

    let mut naering_mangler = 0usize;
    let mut uten_omrade = 0usize;

    let enriched: Vec<EnrichedEvent> = events
        .into_iter()
        .map(|event| {
            let hoved = match hoved_naering(event.neringer.as_deref()) {
                Ok(navn) => navn.to_string(),
                Err(feil) => {
                    naering_mangler += 1;
                    feil.label().to_string()
                }
            };

            let fylke = event.fylkesnummer.as_deref();
            let omrade =
                fylke.and_then(|fylke| resultatomrade(fylke, event.kommunenummer.as_deref()));
            if omrade.is_none() {
                uten_omrade += 1;
            }

            EnrichedEvent {
                endret_maaned: event.endret_tidspunkt.format("%Y-%m").to_string(),
                fylkesnavn: fylke.and_then(fylkesnavn).map(str::to_string),
                resultatomrade: omrade,
                kommunenummer_2024: event
                    .kommunenummer
                    .as_deref()
                    .map(|kommune| kommuner.to_2024(kommune)),
                hoved_nering_truncated: truncate_label(&hoved),
                hoved_nering: hoved,
                antall_personer_gruppe: antall_personer_gruppe(event.antall_personer).to_string(),
                event,
            }
        })
        .collect();

    if naering_mangler > 0 {
        warn!(rader = naering_mangler, "hendelser uten gyldig hovednæring");
    }
    if uten_omrade > 0 {
        warn!(rader = uten_omrade, "hendelser uten resultatområde");
    }

    enriched
}

/// Beholder bare rader i valgt resultatområde.
pub fn filter_resultatomrade(
    rows: Vec<EnrichedEvent>,
    omrade: Resultatomrade,
) -> Vec<EnrichedEvent> {
    let before = rows.len();
    let kept: Vec<EnrichedEvent> = rows
        .into_iter()
        .filter(|row| row.resultatomrade == Some(omrade))
        .collect();
    debug!(
        resultatomrade = omrade.slug(),
        beholdt = kept.len(),
        fjernet = before - kept.len(),
        "filtrerte på resultatområde"
    );
    kept
}

/// Fjerner alle rader for saker avsluttet mer enn `antall_dager` før `now`.
pub fn filter_closed_before<T: HasCaseEvent>(
    rows: Vec<T>,
    antall_dager: i64,
    now: NaiveDateTime,
) -> Vec<T> {
    let grense = now - Duration::days(antall_dager);
    let gamle: HashSet<String> = rows
        .iter()
        .map(HasCaseEvent::case_event)
        .filter(|event| event.avsluttet_tidspunkt.is_some_and(|at| at < grense))
        .map(|event| event.saksnummer.clone())
        .collect();

    rows.into_iter()
        .filter(|row| !gamle.contains(&row.case_event().saksnummer))
        .collect()
}

/// Siste kjente opplysninger om virksomheten i en sak.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseProfile {
    pub antall_personer: Option<i64>,
    pub kommunenummer: Option<String>,
    pub resultatomrade: Option<Resultatomrade>,
    pub sektor: Option<Sektor>,
    pub hoved_nering: Option<String>,
}

/// Sist endrede hendelse per sak, sortert på saksnummer.
pub fn latest_per_case(rows: &[EnrichedEvent]) -> Vec<&EnrichedEvent> {
    let mut latest: BTreeMap<&str, &EnrichedEvent> = BTreeMap::new();
    for row in rows {
        latest
            .entry(row.event.saksnummer.as_str())
            .and_modify(|current| {
                if row.event.endret_tidspunkt >= current.event.endret_tidspunkt {
                    *current = row;
                }
            })
            .or_insert(row);
    }
    latest.into_values().collect()
}

/// Profil per sak fra den sist endrede hendelsen.
pub fn case_profiles(rows: &[EnrichedEvent]) -> HashMap<String, CaseProfile> {
    latest_per_case(rows)
        .into_iter()
        .map(|row| {
            (
                row.event.saksnummer.clone(),
                CaseProfile {
                    antall_personer: row.event.antall_personer,
                    kommunenummer: row.kommunenummer_2024.clone(),
                    resultatomrade: row.resultatomrade,
                    sektor: row.event.sektor.as_deref().and_then(Sektor::from_code),
                    hoved_nering: Some(row.hoved_nering.clone()),
                },
            )
        })
        .collect()
}

/// Én begrunnelse for at en sak ble satt til ikke aktuell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IkkeAktuellBegrunnelse {
    pub saksnummer: String,
    #[serde(rename = "ikkeAktuelBegrunnelse")]
    pub begrunnelse: String,
    #[serde(rename = "ikkeAktuelBegrunnelse_lesbar")]
    pub lesbar: String,
    pub hovedgrunn: Option<String>,
}

/// Én rad per begrunnelse fra siste `IKKE_AKTUELL`-rad i hver sak.
///
/// Begrunnelsene er lagret som tekst på formen `[A, B]`.
pub fn explode_ikke_aktuell(rows: &[StatusRow]) -> Vec<IkkeAktuellBegrunnelse> {
    let mut siste: Vec<&StatusRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for row in rows.iter().filter(|row| row.status() == Status::IkkeAktuell) {
        match index.get(row.saksnummer()) {
            Some(slot) => siste[*slot] = row,
            None => {
                index.insert(row.saksnummer(), siste.len());
                siste.push(row);
            }
        }
    }

    siste
        .into_iter()
        .flat_map(|row| {
            let raw = row.event.ikke_aktuell_begrunnelse.as_deref().unwrap_or("");
            raw.trim()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .split(',')
                .map(str::trim)
                .filter(|begrunnelse| !begrunnelse.is_empty())
                .map(|begrunnelse| IkkeAktuellBegrunnelse {
                    saksnummer: row.saksnummer().to_string(),
                    begrunnelse: begrunnelse.to_string(),
                    lesbar: readable_reason(begrunnelse),
                    hovedgrunn: lookup(&IKKEAKTUELL_HOVEDGRUNN, begrunnelse).map(str::to_string),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn readable_reason(begrunnelse: &str) -> String {
    crate::model::readable_tag(begrunnelse).replace("bht", "BHT")
}
