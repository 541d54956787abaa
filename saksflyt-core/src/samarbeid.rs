//! Samarbeid, spørreundersøkelser og samarbeidsplaner.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::UNDERTEMA_NAVN;
use crate::enrich::CaseProfile;
use crate::{Resultatomrade, Sektor};

pub const SURVEY_BEHOVSVURDERING: &str = "Behovsvurdering";
pub const SURVEY_EVALUERING: &str = "Evaluering";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SamarbeidStatus {
    #[serde(rename = "AKTIV")]
    Aktiv,
    #[serde(rename = "FULLFØRT")]
    Fullfort,
    #[serde(rename = "AVBRUTT")]
    Avbrutt,
    #[serde(rename = "SLETTET")]
    Slettet,
    #[serde(other)]
    Annen,
}

/// Et samarbeid (underavdeling) i en IA-sak.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Samarbeid {
    pub id: i64,
    pub saksnummer: String,
    pub navn: Option<String>,
    pub status: SamarbeidStatus,
    pub opprettet: Option<NaiveDateTime>,
    pub avbrutt: Option<NaiveDateTime>,
    pub fullfort: Option<NaiveDateTime>,
    #[serde(rename = "antallPersoner", default)]
    pub antall_personer: Option<i64>,
    #[serde(default)]
    pub kommunenummer: Option<String>,
    #[serde(default)]
    pub resultatomrade: Option<Resultatomrade>,
    #[serde(default)]
    pub sektor: Option<Sektor>,
    #[serde(default)]
    pub hoved_nering: Option<String>,
}

/// En behovsvurdering eller evaluering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sporreundersokelse {
    pub id: String,
    #[serde(rename = "samarbeidId")]
    pub samarbeid_id: i64,
    pub saksnummer: Option<String>,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "harMinstEttSvar")]
    pub har_minst_ett_svar: bool,
    pub opprettet: Option<NaiveDateTime>,
    pub fullfort: Option<NaiveDateTime>,
}

/// Ett undertema i en samarbeidsplan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Samarbeidsplan {
    pub id: String,
    pub plan_id: String,
    #[serde(rename = "samarbeidId")]
    pub samarbeid_id: i64,
    pub tema: Option<String>,
    /// Navnet på undertemaet.
    pub navn: String,
    pub inkludert: bool,
    pub status: Option<String>,
    pub start_dato: Option<NaiveDate>,
    pub slutt_dato: Option<NaiveDate>,
}

impl Samarbeidsplan {
    /// Planlagt varighet i dager.
    pub fn varighet(&self) -> Option<i64> {
        match (self.start_dato, self.slutt_dato) {
            (Some(start), Some(slutt)) => Some((slutt - start).num_days()),
            _ => None,
        }
    }
}

/// Legger til størrelse, kommune og resultatområde fra saken.
pub fn attach_case_profiles(
    samarbeid: Vec<Samarbeid>,
    profiles: &HashMap<String, CaseProfile>,
) -> Vec<Samarbeid> {
    samarbeid
        .into_iter()
        .map(|mut row| {
            if let Some(profile) = profiles.get(&row.saksnummer) {
                row.antall_personer = profile.antall_personer;
                row.kommunenummer = profile.kommunenummer.clone();
                row.resultatomrade = profile.resultatomrade;
                row.sektor = profile.sektor;
                row.hoved_nering = profile.hoved_nering.clone();
            }
            row
        })
        .collect()
}

pub fn filter_samarbeid_resultatomrade(
    samarbeid: Vec<Samarbeid>,
    omrade: Resultatomrade,
) -> Vec<Samarbeid> {
    samarbeid
        .into_iter()
        .filter(|row| row.resultatomrade == Some(omrade))
        .collect()
}

/// Beholder undersøkelser med minst ett svar som ikke er slettet.
pub fn answered_surveys(surveys: Vec<Sporreundersokelse>) -> Vec<Sporreundersokelse> {
    let before = surveys.len();
    let kept: Vec<Sporreundersokelse> = surveys
        .into_iter()
        .filter(|survey| survey.har_minst_ett_svar && survey.status != "SLETTET")
        .collect();
    debug!(beholdt = kept.len(), fjernet = before - kept.len(), "filtrerte spørreundersøkelser");
    kept
}

pub fn included_plan_topics(plans: Vec<Samarbeidsplan>) -> Vec<Samarbeidsplan> {
    plans.into_iter().filter(|plan| plan.inkludert).collect()
}

/// Antall forskjellige planer.
pub fn antall_planer(plans: &[Samarbeidsplan]) -> usize {
    plans
        .iter()
        .map(|plan| plan.plan_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Antall inkluderte undertemaer med gitt status, for alle kjente undertemaer.
pub fn topics_with_status(plans: &[Samarbeidsplan], status: &str) -> BTreeMap<&'static str, usize> {
    let mut counts: BTreeMap<&'static str, usize> =
        UNDERTEMA_NAVN.into_iter().map(|navn| (navn, 0)).collect();
    for plan in plans
        .iter()
        .filter(|plan| plan.inkludert && plan.status.as_deref() == Some(status))
    {
        if let Some(count) = counts.get_mut(plan.navn.as_str()) {
            *count += 1;
        }
    }
    counts
}

/// Hvor langt de aktive samarbeidene har kommet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollaborationFunnel {
    pub aktive: usize,
    pub med_behovsvurdering: usize,
    pub med_samarbeidsplan: usize,
    pub med_evaluering: usize,
}

pub fn collaboration_funnel(
    samarbeid: &[Samarbeid],
    surveys: &[Sporreundersokelse],
    plans: &[Samarbeidsplan],
) -> CollaborationFunnel {
    let aktive: HashSet<i64> = samarbeid
        .iter()
        .filter(|row| row.status == SamarbeidStatus::Aktiv)
        .map(|row| row.id)
        .collect();

    let completed = |kind: &str| {
        surveys
            .iter()
            .filter(|survey| {
                aktive.contains(&survey.samarbeid_id)
                    && survey.status == "AVSLUTTET"
                    && survey.kind == kind
            })
            .map(|survey| survey.samarbeid_id)
            .collect::<HashSet<_>>()
            .len()
    };

    let med_samarbeidsplan = plans
        .iter()
        .filter(|plan| aktive.contains(&plan.samarbeid_id))
        .map(|plan| plan.samarbeid_id)
        .collect::<HashSet<_>>()
        .len();

    CollaborationFunnel {
        aktive: aktive.len(),
        med_behovsvurdering: completed(SURVEY_BEHOVSVURDERING),
        med_samarbeidsplan,
        med_evaluering: completed(SURVEY_EVALUERING),
    }
}
