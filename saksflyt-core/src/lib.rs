//! Kjernelogikk for saksflyt: rekonstruksjon av statushistorikk, leveranser
//! og siste oppdatering per IA-sak.

pub mod aggregate;
pub mod constants;
pub mod dedup;
pub mod delivery;
pub mod enrich;
pub mod model;
pub mod period;
pub mod recency;
pub mod samarbeid;
pub mod split;
pub mod status;
pub mod time;

use serde::{Deserialize, Serialize};

pub use model::{
    CaseEvent, Delivery, DeliveryStatus, EventKind, Naering, Resultatomrade, Sektor, Status,
    Stream,
};
pub use recency::LastUpdate;
pub use split::EventStreams;
pub use status::{StatusRow, StatusTimeline, UndoReport};

/// Hvordan rader med identisk (saksnummer, endret tidspunkt) ordnes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Behold rekkefølgen fra innlastingen.
    #[default]
    InputOrder,
    /// Sorter på innlastingstidsstempel og deretter sekvensnummer.
    Ingestion,
}

/// Terskler og innstillinger for pipelinen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SaksflytConfig {
    /// Maks antall TILBAKE-hendelser uten statusendring før kjøringen stoppes.
    pub max_invalid_undos: usize,
    /// Brukeren som systemet selv registrerer endringer med.
    pub automated_actor: String,
    pub tie_break: TieBreak,
    /// Antall dager uten oppdatering før en aktiv sak regnes som urørt.
    pub untouched_threshold_days: i64,
    /// Saker avsluttet for mer enn så mange dager siden filtreres bort.
    pub closed_retention_days: i64,
}

impl Default for SaksflytConfig {
    fn default() -> Self {
        Self {
            max_invalid_undos: 10,
            automated_actor: "Fia system".to_string(),
            tie_break: TieBreak::InputOrder,
            untouched_threshold_days: 30,
            closed_retention_days: 365,
        }
    }
}

/// Felles feiltype for kjernen.
#[derive(Debug, thiserror::Error)]
pub enum SaksflytError {
    #[error("Inndata mangler nødvendig informasjon")]
    MissingData,
    #[error("Kunne ikke lese data: {0}")]
    Parse(String),
    #[error("Ukjent status: {0}")]
    UnknownStatus(String),
    #[error("Ukjent hendelse: {0}")]
    UnknownEventKind(String),
    #[error("Ukjent leveransestatus: {0}")]
    UnknownDeliveryStatus(String),
    #[error(
        "Fant {found} rader som ikke endret status etter bruk av tilbake-knappen (grense {limit})"
    )]
    InvalidUndoThreshold { found: usize, limit: usize },
    #[error("Annen feil: {0}")]
    Other(String),
}
