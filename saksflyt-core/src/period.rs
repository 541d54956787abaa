//! Oppsummering av én uke eller måned: saker inn og ut og leverte tjenester.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::status::StatusRow;
use crate::time::start_of_day;
use crate::{Delivery, DeliveryStatus, SaksflytError, Status};

/// Tjenester levert innen så mange timer etter at de ble opprettet regnes som
/// etterregistrert.
const ETTERREGISTRERT_TIMER: i64 = 24;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Periode {
    Uke,
    #[serde(rename = "måned", alias = "maaned")]
    Maaned,
}

impl std::str::FromStr for Periode {
    type Err = SaksflytError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "uke" | "week" => Ok(Periode::Uke),
            "måned" | "maaned" | "month" => Ok(Periode::Maaned),
            other => Err(SaksflytError::Parse(format!("ukjent periode: {other}"))),
        }
    }
}

/// Halvåpent tidsrom `[fra, til)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tidsrom {
    pub fra: NaiveDateTime,
    pub til: NaiveDateTime,
}

impl Tidsrom {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.fra <= at && at < self.til
    }
}

/// Uken (mandag til søndag) eller måneden som inneholder `dato`.
pub fn find_period(dato: NaiveDate, periode: Periode) -> Tidsrom {
    let (fra, til) = match periode {
        Periode::Uke => {
            let mandag = dato - Duration::days(i64::from(dato.weekday().num_days_from_monday()));
            (mandag, mandag + Duration::days(7))
        }
        Periode::Maaned => {
            let forste = dato.with_day(1).unwrap_or(dato);
            let neste = forste
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX);
            (forste, neste)
        }
    };
    Tidsrom {
        fra: start_of_day(fra),
        til: start_of_day(til),
    }
}

/// Alle måneder (`YYYY-MM`) fra og med `fra` til og med `til`.
pub fn months_between(fra: NaiveDate, til: NaiveDate) -> Vec<String> {
    let mut months = Vec::new();
    let mut current = fra.with_day(1).unwrap_or(fra);
    while current <= til {
        months.push(current.format("%Y-%m").to_string());
        match current.checked_add_months(Months::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    months
}

/// Tellinger for én IA-tjeneste i perioden.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TjenesteTelling {
    pub levert: usize,
    pub opprettet: usize,
    pub etterregistrert: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodSummary {
    pub periode: Tidsrom,
    /// Statusendringer til `VI_BISTÅR` i perioden.
    pub vi_bistar: usize,
    /// Statusendringer til `FULLFØRT` i perioden.
    pub fullfort: usize,
    pub tjenester: BTreeMap<String, TjenesteTelling>,
}

/// Teller statusendringer og leveranser i perioden rundt `dato`.
///
/// `leveranser` kan inneholde flere versjoner av samme leveranse. Bare siste
/// versjon per id telles.
pub fn period_summary(
    status: &[StatusRow],
    leveranser: &[Delivery],
    dato: NaiveDate,
    periode: Periode,
) -> PeriodSummary {
    let tidsrom = find_period(dato, periode);
    let endringer_til = |target: Status| {
        status
            .iter()
            .filter(|row| row.status() == target && tidsrom.contains(row.endret_tidspunkt()))
            .count()
    };

    let mut siste: HashMap<&str, &Delivery> = HashMap::new();
    for leveranse in leveranser {
        siste
            .entry(leveranse.id.as_str())
            .and_modify(|kept| {
                if leveranse.sist_endret >= kept.sist_endret {
                    *kept = leveranse;
                }
            })
            .or_insert(leveranse);
    }

    let mut tjenester: BTreeMap<String, TjenesteTelling> = BTreeMap::new();
    for leveranse in siste.into_values() {
        let telling = tjenester.entry(tjeneste_navn(leveranse)).or_default();
        let levert = leveranse.status == DeliveryStatus::Levert;
        let opprettet_i_perioden = leveranse
            .opprettet_tidspunkt
            .is_some_and(|at| tidsrom.contains(at));

        if levert && leveranse.fullfort.is_some_and(|at| tidsrom.contains(at)) {
            telling.levert += 1;
        }
        if opprettet_i_perioden {
            telling.opprettet += 1;
            if levert && is_back_registered(leveranse) {
                telling.etterregistrert += 1;
            }
        }
    }

    PeriodSummary {
        periode: tidsrom,
        vi_bistar: endringer_til(Status::ViBistar),
        fullfort: endringer_til(Status::Fullfort),
        tjenester,
    }
}

fn tjeneste_navn(leveranse: &Delivery) -> String {
    leveranse
        .ia_tjeneste_navn
        .clone()
        .unwrap_or_else(|| leveranse.ia_tjeneste_id.to_string())
}

fn is_back_registered(leveranse: &Delivery) -> bool {
    match (leveranse.opprettet_tidspunkt, leveranse.fullfort) {
        (Some(opprettet), Some(fullfort)) => {
            fullfort - opprettet < Duration::hours(ETTERREGISTRERT_TIMER)
        }
        _ => false,
    }
}

/// Saker inn i og ut av en status i én måned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyFlow {
    pub maaned: String,
    pub inn: usize,
    pub ut: usize,
}

/// Gjennomstrømming for `status` per måned, de siste `antall_maaneder`.
pub fn throughput(
    rows: &[StatusRow],
    status: Status,
    til: NaiveDate,
    antall_maaneder: usize,
) -> Vec<MonthlyFlow> {
    let Some(fra) = rows.iter().map(|row| row.endret_tidspunkt().date()).min() else {
        return Vec::new();
    };

    let mut flows: BTreeMap<String, MonthlyFlow> = months_between(fra, til)
        .into_iter()
        .map(|maaned| {
            let flow = MonthlyFlow {
                maaned: maaned.clone(),
                inn: 0,
                ut: 0,
            };
            (maaned, flow)
        })
        .collect();

    for row in rows {
        let maaned = row.endret_tidspunkt().format("%Y-%m").to_string();
        if let Some(flow) = flows.get_mut(&maaned) {
            if row.status() == status {
                flow.inn += 1;
            }
            if row.forrige_status == Some(status) {
                flow.ut += 1;
            }
        }
    }

    let flows: Vec<MonthlyFlow> = flows.into_values().collect();
    let skip = flows.len().saturating_sub(antall_maaneder);
    flows.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::reconstruct_status_timeline;
    use crate::{CaseEvent, EventKind, SaksflytConfig};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn delivery(
        tjeneste: &str,
        status: DeliveryStatus,
        opprettet: NaiveDateTime,
        fullfort: Option<NaiveDateTime>,
    ) -> Delivery {
        Delivery {
            id: format!("{tjeneste}-{opprettet}"),
            saksnummer: "S1".to_string(),
            ia_tjeneste_id: 1,
            ia_tjeneste_navn: Some(tjeneste.to_string()),
            ia_modul_id: 1,
            ia_modul_navn: None,
            status,
            frist: None,
            sist_endret: fullfort.unwrap_or(opprettet),
            sist_endret_av: None,
            sist_endret_av_rolle: None,
            opprettet_tidspunkt: Some(opprettet),
            fullfort,
            enhetsnummer: None,
            enhetsnavn: None,
        }
    }

    #[test]
    fn week_runs_monday_to_sunday() {
        // 2024-05-15 er en onsdag.
        let uke = find_period(date(2024, 5, 15), Periode::Uke);

        assert_eq!(uke.fra, at(2024, 5, 13, 0));
        assert_eq!(uke.til, at(2024, 5, 20, 0));
        assert!(uke.contains(at(2024, 5, 19, 23)));
        assert!(!uke.contains(at(2024, 5, 20, 0)));
    }

    #[test]
    fn month_includes_last_day() {
        let februar = find_period(date(2024, 2, 10), Periode::Maaned);

        assert_eq!(februar.fra, at(2024, 2, 1, 0));
        assert!(februar.contains(at(2024, 2, 29, 15)));
        assert!(!februar.contains(at(2024, 3, 1, 0)));
    }

    #[test]
    fn months_between_spans_year_boundary() {
        assert_eq!(
            months_between(date(2023, 11, 20), date(2024, 2, 1)),
            vec!["2023-11", "2023-12", "2024-01", "2024-02"]
        );
        assert!(months_between(date(2024, 3, 1), date(2024, 2, 1)).is_empty());
    }

    #[test]
    fn summary_counts_cases_and_services() {
        let status = reconstruct_status_timeline(
            vec![
                CaseEvent::new("A", EventKind::SkalBistas, Status::ViBistar, at(2024, 4, 28, 9)),
                CaseEvent::new("A", EventKind::FullforBistand, Status::Fullfort, at(2024, 5, 14, 9)),
                CaseEvent::new("B", EventKind::SkalBistas, Status::ViBistar, at(2024, 5, 16, 9)),
            ],
            &SaksflytConfig::default(),
        )
        .unwrap()
        .rows;
        let leveranser = vec![
            delivery(
                "Redusere sykefravær",
                DeliveryStatus::Levert,
                at(2024, 5, 13, 8),
                Some(at(2024, 5, 13, 10)),
            ),
            delivery(
                "Redusere sykefravær",
                DeliveryStatus::Levert,
                at(2024, 4, 1, 8),
                Some(at(2024, 5, 17, 10)),
            ),
            delivery("Partssamarbeid", DeliveryStatus::UnderArbeid, at(2024, 5, 14, 8), None),
        ];

        let summary = period_summary(&status, &leveranser, date(2024, 5, 15), Periode::Uke);

        assert_eq!(summary.vi_bistar, 1);
        assert_eq!(summary.fullfort, 1);
        assert_eq!(
            summary.tjenester["Redusere sykefravær"],
            TjenesteTelling {
                levert: 2,
                opprettet: 1,
                etterregistrert: 1,
            }
        );
        assert_eq!(summary.tjenester["Partssamarbeid"].opprettet, 1);
    }

    #[test]
    fn summary_counts_each_delivery_once() {
        let forste = delivery(
            "Redusere sykefravær",
            DeliveryStatus::Levert,
            at(2024, 5, 13, 8),
            Some(at(2024, 5, 14, 10)),
        );
        let mut andre = forste.clone();
        andre.sist_endret = at(2024, 5, 16, 10);
        andre.frist = Some(date(2024, 6, 1));

        let summary = period_summary(&[], &[forste, andre], date(2024, 5, 15), Periode::Uke);

        assert_eq!(
            summary.tjenester["Redusere sykefravær"],
            TjenesteTelling {
                levert: 1,
                opprettet: 1,
                etterregistrert: 0,
            }
        );
    }

    #[test]
    fn throughput_keeps_latest_months() {
        let rows = reconstruct_status_timeline(
            vec![
                CaseEvent::new("A", EventKind::SkalBistas, Status::ViBistar, at(2024, 1, 5, 9)),
                CaseEvent::new("A", EventKind::FullforBistand, Status::Fullfort, at(2024, 3, 5, 9)),
                CaseEvent::new("B", EventKind::SkalBistas, Status::ViBistar, at(2024, 3, 7, 9)),
            ],
            &SaksflytConfig::default(),
        )
        .unwrap()
        .rows;

        let flows = throughput(&rows, Status::ViBistar, date(2024, 4, 1), 3);

        assert_eq!(
            flows,
            vec![
                MonthlyFlow { maaned: "2024-02".into(), inn: 0, ut: 0 },
                MonthlyFlow { maaned: "2024-03".into(), inn: 1, ut: 1 },
                MonthlyFlow { maaned: "2024-04".into(), inn: 0, ut: 0 },
            ]
        );
    }
}
