//! Fjerning av duplikater: behold siste innlastede rad per nøkkel.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDateTime;

use crate::CaseEvent;

/// Rader som bærer innlastingstidspunkt og -rekkefølge.
pub trait Ingested {
    fn ingested_at(&self) -> NaiveDateTime;
    fn sequence(&self) -> u64;
}

impl Ingested for CaseEvent {
    fn ingested_at(&self) -> NaiveDateTime {
        self.tidsstempel
    }

    fn sequence(&self) -> u64 {
        self.sekvens
    }
}

/// Beholder én rad per nøkkel: den med størst innlastingstidspunkt.
///
/// Ved likt tidspunkt vinner høyest sekvens, og ved lik sekvens raden som
/// kommer sist. Resultatet følger rekkefølgen nøklene først dukket opp i.
pub fn deduplicate_latest<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    T: Ingested,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::with_capacity(rows.len());
    let mut kept: Vec<T> = Vec::with_capacity(rows.len());

    for row in rows {
        match slots.entry(key(&row)) {
            Entry::Occupied(slot) => {
                let existing = &kept[*slot.get()];
                if supersedes(&row, existing) {
                    kept[*slot.get()] = row;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(row);
            }
        }
    }

    kept
}

fn supersedes<T: Ingested>(candidate: &T, existing: &T) -> bool {
    (candidate.ingested_at(), candidate.sequence()) >= (existing.ingested_at(), existing.sequence())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::{EventKind, Status};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn event(id: &str, status: Status, ingested_minutes: i64, sekvens: u64) -> CaseEvent {
        let mut event = CaseEvent::new("S1", EventKind::EndreStatus, status, base());
        event.hendelse_id = id.to_string();
        event.tidsstempel = base() + Duration::minutes(ingested_minutes);
        event.sekvens = sekvens;
        event
    }

    #[test]
    fn keeps_latest_ingestion_per_key() {
        let rows = vec![
            event("a", Status::Ny, 0, 0),
            event("b", Status::Vurderes, 0, 1),
            event("a", Status::Kontaktes, 5, 2),
            event("a", Status::Kartlegges, 3, 3),
        ];

        let deduped = deduplicate_latest(rows, |row| row.hendelse_id.clone());

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].hendelse_id, "a");
        assert_eq!(deduped[0].status, Status::Kontaktes);
        assert_eq!(deduped[1].status, Status::Vurderes);
    }

    #[test]
    fn equal_ingestion_time_prefers_higher_sequence() {
        let rows = vec![
            event("a", Status::Kontaktes, 1, 7),
            event("a", Status::Ny, 1, 2),
        ];

        let deduped = deduplicate_latest(rows, |row| row.hendelse_id.clone());

        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].status, Status::Kontaktes);
    }

    #[test]
    fn full_tie_keeps_last_row() {
        let rows = vec![event("a", Status::Ny, 1, 0), event("a", Status::Vurderes, 1, 0)];

        let deduped = deduplicate_latest(rows, |row| row.hendelse_id.clone());

        assert_eq!(deduped[0].status, Status::Vurderes);
    }
}
