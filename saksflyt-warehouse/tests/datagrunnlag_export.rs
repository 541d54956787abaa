use std::fs;

use chrono::{NaiveDate, NaiveDateTime};
use saksflyt_core::aggregate::virksomhetsprofil;
use saksflyt_core::recency::compute_last_update;
use saksflyt_core::samarbeid::collaboration_funnel;
use saksflyt_core::{DeliveryStatus, Resultatomrade, SaksflytConfig, Status};
use saksflyt_warehouse::{
    build_datagrunnlag, Datagrunnlag, DatagrunnlagOptions, ExportDirSource, MemorySource,
    TABLE_LEVERANSE, TABLE_STATISTIKK,
};
use serde_json::{json, Value};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn options(resultatomrade: Option<Resultatomrade>) -> DatagrunnlagOptions {
    DatagrunnlagOptions {
        project: "pia-prod".to_string(),
        dataset: "pia_bigquery_sink_v1_dataset_prod".to_string(),
        resultatomrade,
    }
}

fn build(resultatomrade: Option<Resultatomrade>) -> Datagrunnlag {
    let source = ExportDirSource::new(fixture_path("export"));
    build_datagrunnlag(&source, &options(resultatomrade), &SaksflytConfig::default())
        .expect("Kunne ikke bygge datagrunnlaget")
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

#[test]
fn status_timeline_matches_golden() {
    let grunnlag = build(None);

    let actual: Vec<Value> = grunnlag
        .status
        .rows
        .iter()
        .map(|row| {
            json!({
                "saksnummer": row.saksnummer(),
                "status": row.status(),
                "forrige_status": row.forrige_status,
                "siste_status": row.siste_status,
                "aktiv_sak": row.aktiv_sak,
                "intervall": row.intervall.map(|intervall| intervall.label()),
            })
        })
        .collect();

    let expected = fs::read_to_string(fixture_path("status_golden.json"))
        .expect("Kunne ikke lese golden-filen");
    let expected: Value = serde_json::from_str(&expected).expect("Golden-filen er ugyldig");

    assert_eq!(Value::Array(actual), expected);
    assert_eq!(grunnlag.status.report.applied_undos, 1);
    assert_eq!(grunnlag.status.report.invalid_undos, 0);
    assert_eq!(grunnlag.status.report.orphan_undos, 0);
}

#[test]
fn duplicate_ingestions_and_incomplete_rows_are_dropped() {
    let grunnlag = build(None);

    assert_eq!(grunnlag.statistikk.len(), 13);
    assert_eq!(grunnlag.eierskap.len(), 1);
    assert_eq!(grunnlag.prosess.len(), 1);

    let kartlegges = grunnlag
        .status
        .rows
        .iter()
        .find(|row| row.status() == Status::Kartlegges)
        .expect("KARTLEGGES mangler");
    assert_eq!(kartlegges.event.antall_personer, Some(30));
    assert_eq!(kartlegges.endret_tidspunkt(), at(10, 8));
}

#[test]
fn deliveries_drop_deleted_and_automated_rows() {
    let grunnlag = build(None);

    let mut ids: Vec<&str> = grunnlag.leveranser.iter().map(|row| row.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["L1", "L1", "L4"]);

    let siste: Vec<(&str, DeliveryStatus)> = grunnlag
        .leveranse_siste_status
        .iter()
        .map(|row| (row.id.as_str(), row.status))
        .collect();
    assert_eq!(
        siste,
        vec![
            ("L1", DeliveryStatus::Levert),
            ("L4", DeliveryStatus::UnderArbeid),
        ]
    );
}

fn leveranse(status: &str, sist_endret: &str, sist_endret_av: &str) -> Value {
    json!({
        "id": "L5",
        "saksnummer": "S5",
        "iaTjenesteId": 1,
        "iaTjenesteNavn": "Redusere sykefravær",
        "iaModulId": 1,
        "status": status,
        "sistEndret": sist_endret,
        "sistEndretAv": sist_endret_av,
        "tidsstempel": sist_endret,
    })
}

#[test]
fn user_version_survives_later_system_version() {
    let source = MemorySource::new()
        .with_table(TABLE_STATISTIKK, Vec::new())
        .with_table(
            TABLE_LEVERANSE,
            vec![
                leveranse("UNDER_ARBEID", "2024-01-03T09:00:00Z", "Z1"),
                leveranse("UNDER_ARBEID", "2024-01-04T09:00:00Z", "Fia system"),
            ],
        );

    let grunnlag = build_datagrunnlag(&source, &options(None), &SaksflytConfig::default())
        .expect("Kunne ikke bygge datagrunnlaget");

    assert_eq!(grunnlag.leveranser.len(), 1);
    assert_eq!(grunnlag.leveranser[0].sist_endret, at(3, 9));
    assert_eq!(grunnlag.leveranse_siste_status.len(), 1);
    assert_eq!(grunnlag.leveranse_siste_status[0].sist_endret_av.as_deref(), Some("Z1"));
}

#[test]
fn company_profile_reads_sick_leave() {
    let grunnlag = build(None);

    let profil = virksomhetsprofil(&grunnlag.statistikk);

    assert_eq!(profil.antall_saker, 3);
    assert_eq!(profil.snitt_sykefravaersprosent, Some(6.5));
}

#[test]
fn collaboration_tables_are_filtered() {
    let grunnlag = build(None);

    assert_eq!(grunnlag.samarbeid.len(), 3);
    assert_eq!(grunnlag.sporreundersokelser.len(), 1);
    assert_eq!(grunnlag.samarbeidsplaner.len(), 1);
    assert_eq!(grunnlag.samarbeid[0].antall_personer, Some(30));

    let funnel = collaboration_funnel(
        &grunnlag.samarbeid,
        &grunnlag.sporreundersokelser,
        &grunnlag.samarbeidsplaner,
    );
    assert_eq!(funnel.aktive, 2);
    assert_eq!(funnel.med_behovsvurdering, 1);
    assert_eq!(funnel.med_samarbeidsplan, 1);
    assert_eq!(funnel.med_evaluering, 0);
}

#[test]
fn last_update_spans_all_streams() {
    let grunnlag = build(None);

    let updates = compute_last_update(
        &grunnlag.status.rows,
        &grunnlag.eierskap,
        &grunnlag.leveranser,
        at(12, 0),
    );

    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].saksnummer, "S1");
    assert_eq!(updates[0].siste_oppdatering, at(10, 8));
    assert_eq!(updates[0].dager_siden_siste_oppdatering, 1);
    assert_eq!(updates[1].saksnummer, "S3");
    assert_eq!(updates[1].siste_oppdatering_leveranse, Some(at(6, 12)));
    assert_eq!(updates[1].dager_siden_siste_oppdatering, 5);
}

#[test]
fn result_area_filter_applies_to_every_table() {
    let grunnlag = build(Some(Resultatomrade::Oslo));

    assert_eq!(grunnlag.statistikk.len(), 7);
    assert_eq!(grunnlag.status.rows.len(), 4);
    assert_eq!(grunnlag.leveranser.len(), 2);
    assert_eq!(grunnlag.samarbeid.len(), 2);
    assert_eq!(grunnlag.sporreundersokelser.len(), 1);
    assert_eq!(grunnlag.samarbeidsplaner.len(), 1);
    assert!(grunnlag
        .statistikk
        .iter()
        .all(|row| row.event.saksnummer == "S1"));
}
