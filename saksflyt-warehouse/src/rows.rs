//! Conversion of warehouse rows into typed core records.
//!
//! Timestamps are parsed with their offset and stored as naive UTC, so every
//! record leaving this module is timezone-free.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use saksflyt_core::enrich::KommuneMapping;
use saksflyt_core::samarbeid::{Samarbeid, SamarbeidStatus, Samarbeidsplan, Sporreundersokelse};
use saksflyt_core::time::{coerce_date, parse_timestamp};
use saksflyt_core::{CaseEvent, Delivery, DeliveryStatus, EventKind, Naering, Sektor, Status};
use serde_json::Value;
use tracing::warn;

use crate::{RawRow, WarehouseError};

/// Reads a timestamp given as text or as epoch seconds.
pub fn timestamp_field(row: &Value, name: &str) -> Option<NaiveDateTime> {
    match row.get(name)? {
        Value::String(text) => parse_timestamp(text),
        Value::Number(number) => {
            let seconds = number.as_f64()?;
            let whole = seconds.floor();
            let nanos = ((seconds - whole) * 1e9).round() as u32;
            DateTime::<Utc>::from_timestamp(whole as i64, nanos).map(|at| at.naive_utc())
        }
        _ => None,
    }
}

fn str_field(row: &Value, name: &str) -> Option<String> {
    match row.get(name)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn i64_field(row: &Value, name: &str) -> Option<i64> {
    match row.get(name)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn f64_field(row: &Value, name: &str) -> Option<f64> {
    match row.get(name)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn bool_field(row: &Value, name: &str) -> Option<bool> {
    match row.get(name)? {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn date_field(row: &Value, name: &str) -> Option<NaiveDate> {
    coerce_date(row.get(name).and_then(Value::as_str))
}

/// `None` unless the value is a list of objects that all carry a name.
fn parse_neringer(row: &Value) -> Option<Vec<Naering>> {
    row.get("neringer")?
        .as_array()?
        .iter()
        .map(|entry| {
            Some(Naering {
                kode: str_field(entry, "kode"),
                navn: str_field(entry, "navn")?,
            })
        })
        .collect()
}

fn record_error(table: &str, row: &RawRow, reason: impl ToString) -> WarehouseError {
    WarehouseError::Record {
        table: table.to_string(),
        index: row.sekvens as usize,
        reason: reason.to_string(),
    }
}

fn required<T>(table: &str, row: &RawRow, name: &str, value: Option<T>) -> Result<T, WarehouseError> {
    value.ok_or_else(|| record_error(table, row, format!("missing {name}")))
}

/// Converts one event-log row. `Ok(None)` means the row lacks a case number
/// or a change time and should be dropped.
pub fn case_event_from_row(table: &str, row: &RawRow) -> Result<Option<CaseEvent>, WarehouseError> {
    let value = &row.value;
    let (Some(saksnummer), Some(endret_tidspunkt)) = (
        str_field(value, "saksnummer"),
        timestamp_field(value, "endretTidspunkt"),
    ) else {
        return Ok(None);
    };

    let hendelse: EventKind = required(table, row, "hendelse", str_field(value, "hendelse"))?
        .parse()
        .map_err(|err| record_error(table, row, err))?;
    let status: Status = required(table, row, "status", str_field(value, "status"))?
        .parse()
        .map_err(|err| record_error(table, row, err))?;

    let mut event = CaseEvent::new(saksnummer, hendelse, status, endret_tidspunkt);
    if let Some(hendelse_id) = str_field(value, "endretAvHendelseId") {
        event.hendelse_id = hendelse_id;
    }
    event.orgnr = str_field(value, "orgnr");
    event.endret_av = str_field(value, "endretAv");
    event.endret_av_rolle = str_field(value, "endretAvRolle");
    event.eier_av_sak = str_field(value, "eierAvSak");
    if row.tidsstempel != NaiveDateTime::MIN {
        event.tidsstempel = row.tidsstempel;
    }
    event.sekvens = row.sekvens;
    event.antall_personer = i64_field(value, "antallPersoner");
    event.neringer = parse_neringer(value);
    event.sykefravaersprosent = f64_field(value, "sykefraversprosent");
    event.fylkesnummer = str_field(value, "fylkesnummer");
    event.kommunenummer = str_field(value, "kommunenummer");
    event.sektor = str_field(value, "sektor")
        .map(|sektor| Sektor::from_code(&sektor).map_or(sektor, |known| known.code().to_string()));
    event.enhetsnummer = str_field(value, "enhetsnummer");
    event.enhetsnavn = str_field(value, "enhetsnavn");
    event.ikke_aktuell_begrunnelse = str_field(value, "ikkeAktuelBegrunnelse");
    event.avsluttet_tidspunkt = timestamp_field(value, "avsluttetTidspunkt");

    Ok(Some(event))
}

/// Converts the event log, dropping and counting incomplete rows.
pub fn case_events(table: &str, rows: &[RawRow]) -> Result<Vec<CaseEvent>, WarehouseError> {
    let mut events = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for row in rows {
        match case_event_from_row(table, row)? {
            Some(event) => events.push(event),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(table, dropped, "rows without saksnummer or endretTidspunkt");
    }
    Ok(events)
}

pub fn delivery_from_row(table: &str, row: &RawRow) -> Result<Option<Delivery>, WarehouseError> {
    let value = &row.value;
    let (Some(saksnummer), Some(sist_endret)) = (
        str_field(value, "saksnummer"),
        timestamp_field(value, "sistEndret"),
    ) else {
        return Ok(None);
    };

    let status: DeliveryStatus = required(table, row, "status", str_field(value, "status"))?
        .parse()
        .map_err(|err| record_error(table, row, err))?;

    Ok(Some(Delivery {
        id: required(table, row, "id", str_field(value, "id"))?,
        saksnummer,
        ia_tjeneste_id: required(table, row, "iaTjenesteId", i64_field(value, "iaTjenesteId"))?,
        ia_tjeneste_navn: str_field(value, "iaTjenesteNavn"),
        ia_modul_id: required(table, row, "iaModulId", i64_field(value, "iaModulId"))?,
        ia_modul_navn: str_field(value, "iaModulNavn"),
        status,
        frist: date_field(value, "frist"),
        sist_endret,
        sist_endret_av: str_field(value, "sistEndretAv"),
        sist_endret_av_rolle: str_field(value, "sistEndretAvRolle"),
        opprettet_tidspunkt: timestamp_field(value, "opprettetTidspunkt"),
        fullfort: timestamp_field(value, "fullfort"),
        enhetsnummer: str_field(value, "enhetsnummer"),
        enhetsnavn: str_field(value, "enhetsnavn"),
    }))
}

pub fn deliveries(table: &str, rows: &[RawRow]) -> Result<Vec<Delivery>, WarehouseError> {
    let mut deliveries = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for row in rows {
        match delivery_from_row(table, row)? {
            Some(delivery) => deliveries.push(delivery),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(table, dropped, "deliveries without saksnummer or sistEndret");
    }
    Ok(deliveries)
}

fn samarbeid_status(value: Option<String>) -> SamarbeidStatus {
    match value.as_deref() {
        Some("AKTIV") => SamarbeidStatus::Aktiv,
        Some("FULLFØRT") => SamarbeidStatus::Fullfort,
        Some("AVBRUTT") => SamarbeidStatus::Avbrutt,
        Some("SLETTET") => SamarbeidStatus::Slettet,
        _ => SamarbeidStatus::Annen,
    }
}

pub fn samarbeid(table: &str, rows: &[RawRow]) -> Result<Vec<Samarbeid>, WarehouseError> {
    rows.iter()
        .map(|row| {
            let value = &row.value;
            Ok(Samarbeid {
                id: required(table, row, "id", i64_field(value, "id"))?,
                saksnummer: required(table, row, "saksnummer", str_field(value, "saksnummer"))?,
                navn: str_field(value, "navn"),
                status: samarbeid_status(str_field(value, "status")),
                opprettet: timestamp_field(value, "opprettet"),
                avbrutt: timestamp_field(value, "avbrutt"),
                fullfort: timestamp_field(value, "fullfort"),
                antall_personer: None,
                kommunenummer: None,
                resultatomrade: None,
                sektor: None,
                hoved_nering: None,
            })
        })
        .collect()
}

pub fn sporreundersokelser(
    table: &str,
    rows: &[RawRow],
) -> Result<Vec<Sporreundersokelse>, WarehouseError> {
    rows.iter()
        .map(|row| {
            let value = &row.value;
            Ok(Sporreundersokelse {
                id: required(table, row, "id", str_field(value, "id"))?,
                samarbeid_id: required(table, row, "samarbeidId", i64_field(value, "samarbeidId"))?,
                saksnummer: str_field(value, "saksnummer"),
                status: str_field(value, "status").unwrap_or_default(),
                kind: str_field(value, "type").unwrap_or_default(),
                har_minst_ett_svar: bool_field(value, "harMinstEttSvar").unwrap_or(false),
                opprettet: timestamp_field(value, "opprettet"),
                fullfort: timestamp_field(value, "fullfort"),
            })
        })
        .collect()
}

pub fn samarbeidsplaner(
    table: &str,
    rows: &[RawRow],
) -> Result<Vec<Samarbeidsplan>, WarehouseError> {
    rows.iter()
        .map(|row| {
            let value = &row.value;
            Ok(Samarbeidsplan {
                id: required(table, row, "id", str_field(value, "id"))?,
                plan_id: required(table, row, "plan_id", str_field(value, "plan_id"))?,
                samarbeid_id: required(table, row, "samarbeidId", i64_field(value, "samarbeidId"))?,
                tema: str_field(value, "tema"),
                navn: str_field(value, "navn").unwrap_or_default(),
                inkludert: bool_field(value, "inkludert").unwrap_or(false),
                status: str_field(value, "status"),
                start_dato: date_field(value, "start_dato"),
                slutt_dato: date_field(value, "slutt_dato"),
            })
        })
        .collect()
}

/// Builds the municipality renumbering from rows with `kommunenummer 2023`
/// and `kommunenummer`.
pub fn kommune_mapping(rows: &[RawRow]) -> KommuneMapping {
    KommuneMapping::new(rows.iter().filter_map(|row| {
        Some((
            str_field(&row.value, "kommunenummer 2023")?,
            str_field(&row.value, "kommunenummer")?,
        ))
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: Value, sekvens: u64) -> RawRow {
        RawRow {
            tidsstempel: timestamp_field(&value, "tidsstempel").unwrap_or(NaiveDateTime::MIN),
            sekvens,
            value,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn event_row_is_converted_to_utc() {
        let row = raw(
            json!({
                "saksnummer": "S1",
                "orgnr": "999888777",
                "hendelse": "VIRKSOMHET_VURDERES",
                "status": "VURDERES",
                "endretAvHendelseId": "h-1",
                "endretTidspunkt": "2024-03-01T12:00:00+01:00",
                "tidsstempel": "2024-03-01 11:00:05 UTC",
                "antallPersoner": 42,
                "neringer": [{"kode": "88.911", "navn": "Barnehager"}],
                "sektor": "KOMMUNAL",
                "sykefraversprosent": 6.5,
                "fylkesnummer": "46",
                "kommunenummer": "4601"
            }),
            3,
        );

        let event = case_event_from_row("t", &row).unwrap().unwrap();

        assert_eq!(event.endret_tidspunkt, utc(2024, 3, 1, 11));
        assert_eq!(event.hendelse_id, "h-1");
        assert_eq!(event.sekvens, 3);
        assert_eq!(event.antall_personer, Some(42));
        assert_eq!(event.sektor.as_deref(), Some("2"));
        assert_eq!(event.sykefravaersprosent, Some(6.5));
        assert_eq!(event.neringer.unwrap()[0].navn, "Barnehager");
    }

    #[test]
    fn incomplete_event_rows_are_dropped() {
        let rows = vec![
            raw(json!({"saksnummer": "S1", "hendelse": "TILBAKE", "status": "NY"}), 0),
            raw(json!({"endretTidspunkt": "2024-03-01T12:00:00Z", "hendelse": "TILBAKE", "status": "NY"}), 1),
        ];

        assert!(case_events("t", &rows).unwrap().is_empty());
    }

    #[test]
    fn unknown_status_is_an_error() {
        let row = raw(
            json!({
                "saksnummer": "S1",
                "hendelse": "VIRKSOMHET_VURDERES",
                "status": "PÅ_VENT",
                "endretTidspunkt": "2024-03-01T12:00:00Z"
            }),
            5,
        );

        let err = case_event_from_row("ia-sak-statistikk-v1", &row).unwrap_err();

        assert!(matches!(err, WarehouseError::Record { index: 5, .. }));
        assert!(err.to_string().contains("PÅ_VENT"));
    }

    #[test]
    fn malformed_industry_list_becomes_none() {
        let row = raw(
            json!({
                "saksnummer": "S1",
                "hendelse": "VIRKSOMHET_VURDERES",
                "status": "VURDERES",
                "endretTidspunkt": "2024-03-01T12:00:00Z",
                "neringer": "88.911"
            }),
            0,
        );

        let event = case_event_from_row("t", &row).unwrap().unwrap();

        assert_eq!(event.neringer, None);
    }

    #[test]
    fn delivery_deadline_is_coerced() {
        let rows = vec![
            raw(
                json!({
                    "id": 10,
                    "saksnummer": "S1",
                    "iaTjenesteId": "2",
                    "iaModulId": 5,
                    "status": "LEVERT",
                    "frist": "ikke en dato",
                    "sistEndret": "2024-04-02T08:00:00Z",
                    "fullfort": 1712044800
                }),
                0,
            ),
            raw(json!({"id": "11", "status": "LEVERT"}), 1),
        ];

        let deliveries = deliveries("t", &rows).unwrap();

        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].id, "10");
        assert_eq!(deliveries[0].ia_tjeneste_id, 2);
        assert_eq!(deliveries[0].frist, None);
        assert_eq!(deliveries[0].fullfort, Some(utc(2024, 4, 2, 8)));
    }

    #[test]
    fn municipality_mapping_reads_both_columns() {
        let mapping = kommune_mapping(&[
            raw(json!({"kommunenummer": "3201", "kommunenummer 2023": "3024"}), 0),
            raw(json!({"kommunenummer": "0301"}), 1),
        ]);

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.to_2024("3024"), "3201");
    }
}
