//! Domenetyper: lukkede oppramsinger og radene pipelinen jobber på.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::SaksflytError;

/// Status på en IA-sak. Rekkefølgen er den samme som i statusflyt-visningene.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(try_from = "String")]
pub enum Status {
    #[serde(rename = "NY")]
    Ny,
    #[serde(rename = "VURDERES")]
    Vurderes,
    #[serde(rename = "KONTAKTES")]
    Kontaktes,
    #[serde(rename = "KARTLEGGES")]
    Kartlegges,
    #[serde(rename = "VI_BISTÅR")]
    ViBistar,
    #[serde(rename = "FULLFØRT")]
    Fullfort,
    #[serde(rename = "IKKE_AKTUELL")]
    IkkeAktuell,
    #[serde(rename = "SLETTET")]
    Slettet,
}

impl Status {
    pub const ORDERED: [Status; 8] = [
        Status::Ny,
        Status::Vurderes,
        Status::Kontaktes,
        Status::Kartlegges,
        Status::ViBistar,
        Status::Fullfort,
        Status::IkkeAktuell,
        Status::Slettet,
    ];

    pub const ACTIVE: [Status; 4] = [
        Status::Vurderes,
        Status::Kontaktes,
        Status::Kartlegges,
        Status::ViBistar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ny => "NY",
            Status::Vurderes => "VURDERES",
            Status::Kontaktes => "KONTAKTES",
            Status::Kartlegges => "KARTLEGGES",
            Status::ViBistar => "VI_BISTÅR",
            Status::Fullfort => "FULLFØRT",
            Status::IkkeAktuell => "IKKE_AKTUELL",
            Status::Slettet => "SLETTET",
        }
    }

    /// Saken er under arbeid.
    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Lesbar etikett, f.eks. `VI_BISTÅR` -> "Vi bistår".
    pub fn label(&self) -> String {
        readable_tag(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = SaksflytError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Status::ORDERED
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or_else(|| SaksflytError::UnknownStatus(value.to_string()))
    }
}

impl TryFrom<String> for Status {
    type Error = SaksflytError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Hvilken delstrøm en hendelse hører til.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Status,
    Ownership,
    Process,
}

/// Hendelsestyper i IA-sakshistorikken.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum EventKind {
    #[serde(rename = "OPPRETT_SAK_FOR_VIRKSOMHET")]
    OpprettSak,
    #[serde(rename = "VIRKSOMHET_VURDERES")]
    VirksomhetVurderes,
    #[serde(rename = "TA_EIERSKAP_I_SAK")]
    TaEierskap,
    #[serde(rename = "VIRKSOMHET_SKAL_KONTAKTES")]
    SkalKontaktes,
    #[serde(rename = "VIRKSOMHET_KARTLEGGES")]
    Kartlegges,
    #[serde(rename = "VIRKSOMHET_SKAL_BISTÅS")]
    SkalBistas,
    #[serde(rename = "VIRKSOMHET_ER_IKKE_AKTUELL")]
    IkkeAktuell,
    #[serde(rename = "TILBAKE")]
    Tilbake,
    #[serde(rename = "FULLFØR_BISTAND")]
    FullforBistand,
    #[serde(rename = "SLETT_SAK")]
    SlettSak,
    #[serde(rename = "ENDRE_STATUS")]
    EndreStatus,
    #[serde(rename = "NY_PROSESS")]
    NyProsess,
    #[serde(rename = "ENDRE_PROSESS")]
    EndreProsess,
    #[serde(rename = "SLETT_PROSESS")]
    SlettProsess,
    #[serde(rename = "FULLFØR_PROSESS")]
    FullforProsess,
    #[serde(rename = "FULLFØR_PROSESS_AUTOMATISK_PÅ_FULLFØRT_SAK")]
    FullforProsessAutomatisk,
    #[serde(rename = "AVBRYT_PROSESS")]
    AvbrytProsess,
}

const EVENT_TAGS: [(&str, EventKind); 17] = [
    ("OPPRETT_SAK_FOR_VIRKSOMHET", EventKind::OpprettSak),
    ("VIRKSOMHET_VURDERES", EventKind::VirksomhetVurderes),
    ("TA_EIERSKAP_I_SAK", EventKind::TaEierskap),
    ("VIRKSOMHET_SKAL_KONTAKTES", EventKind::SkalKontaktes),
    ("VIRKSOMHET_KARTLEGGES", EventKind::Kartlegges),
    ("VIRKSOMHET_SKAL_BISTÅS", EventKind::SkalBistas),
    ("VIRKSOMHET_ER_IKKE_AKTUELL", EventKind::IkkeAktuell),
    ("TILBAKE", EventKind::Tilbake),
    ("FULLFØR_BISTAND", EventKind::FullforBistand),
    ("SLETT_SAK", EventKind::SlettSak),
    ("ENDRE_STATUS", EventKind::EndreStatus),
    ("NY_PROSESS", EventKind::NyProsess),
    ("ENDRE_PROSESS", EventKind::EndreProsess),
    ("SLETT_PROSESS", EventKind::SlettProsess),
    ("FULLFØR_PROSESS", EventKind::FullforProsess),
    (
        "FULLFØR_PROSESS_AUTOMATISK_PÅ_FULLFØRT_SAK",
        EventKind::FullforProsessAutomatisk,
    ),
    ("AVBRYT_PROSESS", EventKind::AvbrytProsess),
];

// Engelske navn som brukes i noen eksportversjoner.
const EVENT_ALIASES: [(&str, EventKind); 7] = [
    ("TAKE_OWNERSHIP_OF_CASE", EventKind::TaEierskap),
    ("NEW_PROCESS", EventKind::NyProsess),
    ("EDIT_PROCESS", EventKind::EndreProsess),
    ("DELETE_PROCESS", EventKind::SlettProsess),
    ("COMPLETE_PROCESS", EventKind::FullforProsess),
    (
        "COMPLETE_PROCESS_AUTOMATED_ON_COMPLETED_CASE",
        EventKind::FullforProsessAutomatisk,
    ),
    ("ABORT_PROCESS", EventKind::AvbrytProsess),
];

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        EVENT_TAGS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(tag, _)| *tag)
            .unwrap_or("UKJENT")
    }

    pub fn stream(&self) -> Stream {
        match self {
            EventKind::TaEierskap => Stream::Ownership,
            EventKind::NyProsess
            | EventKind::EndreProsess
            | EventKind::SlettProsess
            | EventKind::FullforProsess
            | EventKind::FullforProsessAutomatisk
            | EventKind::AvbrytProsess => Stream::Process,
            _ => Stream::Status,
        }
    }

    pub fn is_undo(&self) -> bool {
        matches!(self, EventKind::Tilbake)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = SaksflytError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tag = value.trim();
        EVENT_TAGS
            .iter()
            .chain(EVENT_ALIASES.iter())
            .find(|(known, _)| *known == tag)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| SaksflytError::UnknownEventKind(value.to_string()))
    }
}

impl TryFrom<String> for EventKind {
    type Error = SaksflytError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Status på en leveranse av en IA-tjeneste.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum DeliveryStatus {
    #[serde(rename = "UNDER_ARBEID")]
    UnderArbeid,
    #[serde(rename = "LEVERT")]
    Levert,
    #[serde(rename = "SLETTET")]
    Slettet,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::UnderArbeid => "UNDER_ARBEID",
            DeliveryStatus::Levert => "LEVERT",
            DeliveryStatus::Slettet => "SLETTET",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = SaksflytError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "UNDER_ARBEID" => Ok(DeliveryStatus::UnderArbeid),
            "LEVERT" => Ok(DeliveryStatus::Levert),
            "SLETTET" => Ok(DeliveryStatus::Slettet),
            other => Err(SaksflytError::UnknownDeliveryStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for DeliveryStatus {
    type Error = SaksflytError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Resultatområder som datafortellingene deles opp etter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resultatomrade {
    #[serde(rename = "agder")]
    Agder,
    #[serde(rename = "innlandet")]
    Innlandet,
    #[serde(rename = "møre_og_romsdal")]
    MoreOgRomsdal,
    #[serde(rename = "nordland")]
    Nordland,
    #[serde(rename = "oslo")]
    Oslo,
    #[serde(rename = "øst-viken")]
    OstViken,
    #[serde(rename = "rogaland")]
    Rogaland,
    #[serde(rename = "troms_og_finnmark")]
    TromsOgFinnmark,
    #[serde(rename = "trøndelag")]
    Trondelag,
    #[serde(rename = "vest-viken")]
    VestViken,
    #[serde(rename = "vestfold_og_telemark")]
    VestfoldOgTelemark,
    #[serde(rename = "vestland")]
    Vestland,
}

impl Resultatomrade {
    pub const ALL: [Resultatomrade; 12] = [
        Resultatomrade::Agder,
        Resultatomrade::Innlandet,
        Resultatomrade::MoreOgRomsdal,
        Resultatomrade::Nordland,
        Resultatomrade::Oslo,
        Resultatomrade::OstViken,
        Resultatomrade::Rogaland,
        Resultatomrade::TromsOgFinnmark,
        Resultatomrade::Trondelag,
        Resultatomrade::VestViken,
        Resultatomrade::VestfoldOgTelemark,
        Resultatomrade::Vestland,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Resultatomrade::Agder => "agder",
            Resultatomrade::Innlandet => "innlandet",
            Resultatomrade::MoreOgRomsdal => "møre_og_romsdal",
            Resultatomrade::Nordland => "nordland",
            Resultatomrade::Oslo => "oslo",
            Resultatomrade::OstViken => "øst-viken",
            Resultatomrade::Rogaland => "rogaland",
            Resultatomrade::TromsOgFinnmark => "troms_og_finnmark",
            Resultatomrade::Trondelag => "trøndelag",
            Resultatomrade::VestViken => "vest-viken",
            Resultatomrade::VestfoldOgTelemark => "vestfold_og_telemark",
            Resultatomrade::Vestland => "vestland",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Resultatomrade::Agder => "Agder",
            Resultatomrade::Innlandet => "Innlandet",
            Resultatomrade::MoreOgRomsdal => "Møre og Romsdal",
            Resultatomrade::Nordland => "Nordland",
            Resultatomrade::Oslo => "Oslo",
            Resultatomrade::OstViken => "Øst-Viken",
            Resultatomrade::Rogaland => "Rogaland",
            Resultatomrade::TromsOgFinnmark => "Troms og Finnmark",
            Resultatomrade::Trondelag => "Trøndelag",
            Resultatomrade::VestViken => "Vest-Viken",
            Resultatomrade::VestfoldOgTelemark => "Vestfold og Telemark",
            Resultatomrade::Vestland => "Vestland",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|area| area.display_name() == name)
    }
}

impl fmt::Display for Resultatomrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Resultatomrade {
    type Err = SaksflytError;

    /// Godtar både slug (`vest-viken`) og visningsnavn (`Vest-Viken`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|area| area.slug() == value || area.display_name() == value)
            .ok_or_else(|| SaksflytError::Parse(format!("Ukjent resultatområde: {value}")))
    }
}

/// Sektor fra virksomhetsregisteret. Lagres som kode (`1`, `2`, `3`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sektor {
    #[serde(rename = "1")]
    Statlig,
    #[serde(rename = "2")]
    Kommunal,
    #[serde(rename = "3")]
    Privat,
}

impl Sektor {
    /// Godtar koden eller navnet (`STATLIG`, `Kommunal`, ...).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "1" | "STATLIG" => Some(Sektor::Statlig),
            "2" | "KOMMUNAL" => Some(Sektor::Kommunal),
            "3" | "PRIVAT" => Some(Sektor::Privat),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Sektor::Statlig => "1",
            Sektor::Kommunal => "2",
            Sektor::Privat => "3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sektor::Statlig => "Statlig",
            Sektor::Kommunal => "Kommunal",
            Sektor::Privat => "Privat",
        }
    }
}

/// Næringskode med navn fra virksomhetsregisteret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Naering {
    #[serde(default)]
    pub kode: Option<String>,
    pub navn: String,
}

/// Én logget endring på en sak, med øyeblikksbilde av virksomheten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseEvent {
    pub saksnummer: String,
    pub orgnr: Option<String>,
    pub hendelse: EventKind,
    #[serde(rename = "endretAvHendelseId")]
    pub hendelse_id: String,
    pub status: Status,
    #[serde(rename = "endretTidspunkt")]
    pub endret_tidspunkt: NaiveDateTime,
    #[serde(rename = "endretAv")]
    pub endret_av: Option<String>,
    #[serde(rename = "endretAvRolle")]
    pub endret_av_rolle: Option<String>,
    #[serde(rename = "eierAvSak")]
    pub eier_av_sak: Option<String>,
    /// Når raden ble lastet inn i datavarehuset.
    pub tidsstempel: NaiveDateTime,
    /// Rekkefølgen raden kom inn i ved innlasting.
    pub sekvens: u64,
    #[serde(rename = "antallPersoner")]
    pub antall_personer: Option<i64>,
    /// `None` betyr at feltet ikke kunne tolkes som en liste.
    pub neringer: Option<Vec<Naering>>,
    #[serde(rename = "sykefraversprosent")]
    pub sykefravaersprosent: Option<f64>,
    pub fylkesnummer: Option<String>,
    pub kommunenummer: Option<String>,
    pub sektor: Option<String>,
    pub enhetsnummer: Option<String>,
    pub enhetsnavn: Option<String>,
    #[serde(rename = "ikkeAktuelBegrunnelse")]
    pub ikke_aktuell_begrunnelse: Option<String>,
    #[serde(rename = "avsluttetTidspunkt")]
    pub avsluttet_tidspunkt: Option<NaiveDateTime>,
}

impl CaseEvent {
    /// Minimal hendelse, resten av feltene står tomme.
    pub fn new(
        saksnummer: impl Into<String>,
        hendelse: EventKind,
        status: Status,
        endret_tidspunkt: NaiveDateTime,
    ) -> Self {
        let saksnummer = saksnummer.into();
        Self {
            hendelse_id: format!("{saksnummer}-{}", endret_tidspunkt.and_utc().timestamp_millis()),
            saksnummer,
            orgnr: None,
            hendelse,
            status,
            endret_tidspunkt,
            endret_av: None,
            endret_av_rolle: None,
            eier_av_sak: None,
            tidsstempel: endret_tidspunkt,
            sekvens: 0,
            antall_personer: None,
            neringer: None,
            sykefravaersprosent: None,
            fylkesnummer: None,
            kommunenummer: None,
            sektor: None,
            enhetsnummer: None,
            enhetsnavn: None,
            ikke_aktuell_begrunnelse: None,
            avsluttet_tidspunkt: None,
        }
    }
}

/// Én versjon av en leveranse registrert på en sak.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Delivery {
    pub id: String,
    pub saksnummer: String,
    #[serde(rename = "iaTjenesteId")]
    pub ia_tjeneste_id: i64,
    #[serde(rename = "iaTjenesteNavn")]
    pub ia_tjeneste_navn: Option<String>,
    #[serde(rename = "iaModulId")]
    pub ia_modul_id: i64,
    #[serde(rename = "iaModulNavn")]
    pub ia_modul_navn: Option<String>,
    pub status: DeliveryStatus,
    pub frist: Option<NaiveDate>,
    #[serde(rename = "sistEndret")]
    pub sist_endret: NaiveDateTime,
    #[serde(rename = "sistEndretAv")]
    pub sist_endret_av: Option<String>,
    #[serde(rename = "sistEndretAvRolle")]
    pub sist_endret_av_rolle: Option<String>,
    #[serde(rename = "opprettetTidspunkt")]
    pub opprettet_tidspunkt: Option<NaiveDateTime>,
    pub fullfort: Option<NaiveDateTime>,
    pub enhetsnummer: Option<String>,
    pub enhetsnavn: Option<String>,
}

pub(crate) fn readable_tag(tag: &str) -> String {
    let lower = tag.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
