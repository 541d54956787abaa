//! Deler hendelsesloggen i status-, eierskaps- og prosesshendelser.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CaseEvent, Stream};

/// De tre disjunkte delstrømmene.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventStreams {
    pub status: Vec<CaseEvent>,
    pub eierskap: Vec<CaseEvent>,
    pub prosess: Vec<CaseEvent>,
}

impl EventStreams {
    pub fn len(&self) -> usize {
        self.status.len() + self.eierskap.len() + self.prosess.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fordeler hendelsene etter `EventKind::stream`. Rekkefølgen innen hver
/// strøm er den samme som i input.
///
/// Tidssone er allerede fjernet når en `CaseEvent` bygges, så strømmene kan
/// sammenstilles direkte.
pub fn split_events(events: Vec<CaseEvent>) -> EventStreams {
    let mut streams = EventStreams::default();

    for event in events {
        match event.hendelse.stream() {
            Stream::Status => streams.status.push(event),
            Stream::Ownership => streams.eierskap.push(event),
            Stream::Process => streams.prosess.push(event),
        }
    }

    debug!(
        status = streams.status.len(),
        eierskap = streams.eierskap.len(),
        prosess = streams.prosess.len(),
        "delte hendelser i strømmer"
    );

    streams
}
