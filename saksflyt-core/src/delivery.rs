//! Normalisering av leveranser av IA-tjenester.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{Delivery, DeliveryStatus, SaksflytConfig};

/// Fjerner støy fra leveranseloggen.
///
/// * rader sist endret av systembrukeren fjernes
/// * alle rader for en leveranse som noen gang har vært `SLETTET` fjernes
///
/// Frist og tidssone er normalisert når en `Delivery` bygges.
pub fn normalize_deliveries(rows: Vec<Delivery>, config: &SaksflytConfig) -> Vec<Delivery> {
    let before = rows.len();

    // Slettemarkeringer teller også når systembrukeren har skrevet dem.
    let deleted: HashSet<String> = rows
        .iter()
        .filter(|row| row.status == DeliveryStatus::Slettet)
        .map(|row| row.id.clone())
        .collect();

    let automated = config.automated_actor.as_str();
    let mut system = 0usize;
    let rows: Vec<Delivery> = rows
        .into_iter()
        .filter(|row| {
            let by_system = row.sist_endret_av.as_deref() == Some(automated);
            system += usize::from(by_system);
            !by_system && !deleted.contains(&row.id)
        })
        .collect();

    debug!(
        inn = before,
        system,
        slettede_leveranser = deleted.len(),
        ut = rows.len(),
        "normaliserte leveranser"
    );

    rows
}

/// Siste versjon av hver leveranse per (saksnummer, tjeneste, modul).
///
/// Resultatet er sortert på saksnummer og sist endret.
pub fn latest_delivery_status(rows: &[Delivery]) -> Vec<Delivery> {
    let mut sorted: Vec<&Delivery> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        a.saksnummer
            .cmp(&b.saksnummer)
            .then(a.sist_endret.cmp(&b.sist_endret))
    });

    let mut latest: HashMap<(&str, i64, i64), usize> = HashMap::new();
    for (index, row) in sorted.iter().enumerate() {
        latest.insert(
            (row.saksnummer.as_str(), row.ia_tjeneste_id, row.ia_modul_id),
            index,
        );
    }

    let keep: HashSet<usize> = latest.into_values().collect();
    sorted
        .into_iter()
        .enumerate()
        .filter(|(index, _)| keep.contains(index))
        .map(|(_, row)| row.clone())
        .collect()
}
