//! Oppslagstabeller for fylker, resultatområder og begrunnelser.

use crate::Resultatomrade;

/// Fylker før og etter kommune- og fylkesendringene 1.1.2024.
pub const FYLKER: [(&str, &str); 19] = [
    ("03", "Oslo"),
    ("11", "Rogaland"),
    ("15", "Møre og Romsdal"),
    ("18", "Nordland"),
    ("V30", "Vest-Viken"),
    ("Ø30", "Øst-Viken"),
    ("34", "Innlandet"),
    ("38", "Vestfold og Telemark"),
    ("42", "Agder"),
    ("46", "Vestland"),
    ("50", "Trøndelag"),
    ("54", "Troms og Finnmark"),
    ("33", "Buskerud"),
    ("32", "Akershus"),
    ("31", "Østfold"),
    ("40", "Telemark"),
    ("39", "Vestfold"),
    ("56", "Finnmark"),
    ("55", "Troms"),
];

/// Resultatområdene er uendret etter 1.1.2024, så nye fylker peker på de
/// gamle områdene. Akershus (32) avgjøres per kommune.
pub const FYLKE_RESULTATOMRADE: [(&str, Resultatomrade); 18] = [
    ("03", Resultatomrade::Oslo),
    ("11", Resultatomrade::Rogaland),
    ("15", Resultatomrade::MoreOgRomsdal),
    ("18", Resultatomrade::Nordland),
    ("V30", Resultatomrade::VestViken),
    ("Ø30", Resultatomrade::OstViken),
    ("34", Resultatomrade::Innlandet),
    ("38", Resultatomrade::VestfoldOgTelemark),
    ("40", Resultatomrade::VestfoldOgTelemark),
    ("39", Resultatomrade::VestfoldOgTelemark),
    ("42", Resultatomrade::Agder),
    ("46", Resultatomrade::Vestland),
    ("50", Resultatomrade::Trondelag),
    ("54", Resultatomrade::TromsOgFinnmark),
    ("56", Resultatomrade::TromsOgFinnmark),
    ("55", Resultatomrade::TromsOgFinnmark),
    ("33", Resultatomrade::VestViken),
    ("31", Resultatomrade::OstViken),
];

pub const AKERSHUS: &str = "32";
pub const ROGALAND: &str = "11";

/// Akershus-kommuner fordelt på Vest- og Øst-Viken.
pub const VIKEN_AKERSHUS: [(&str, Resultatomrade); 21] = [
    ("3201", Resultatomrade::VestViken), // Bærum
    ("3203", Resultatomrade::VestViken), // Asker
    ("3236", Resultatomrade::VestViken), // Jevnaker
    ("3205", Resultatomrade::OstViken),  // Lillestrøm
    ("3207", Resultatomrade::OstViken),  // Nordre Follo
    ("3209", Resultatomrade::OstViken),  // Ullensaker
    ("3212", Resultatomrade::OstViken),  // Nesodden
    ("3214", Resultatomrade::OstViken),  // Frogn
    ("3216", Resultatomrade::OstViken),  // Vestby
    ("3218", Resultatomrade::OstViken),  // Ås
    ("3220", Resultatomrade::OstViken),  // Enebakk
    ("3222", Resultatomrade::OstViken),  // Lørenskog
    ("3224", Resultatomrade::OstViken),  // Rælingen
    ("3226", Resultatomrade::OstViken),  // Aurskog-Høland
    ("3228", Resultatomrade::OstViken),  // Nes
    ("3230", Resultatomrade::OstViken),  // Gjerdrum
    ("3232", Resultatomrade::OstViken),  // Nittedal
    ("3234", Resultatomrade::OstViken),  // Lunner
    ("3238", Resultatomrade::OstViken),  // Nannestad
    ("3240", Resultatomrade::OstViken),  // Eidsvoll
    ("3242", Resultatomrade::OstViken),  // Hurdal
];

/// Lund følges opp fra Agder; resten av Rogaland blir værende.
pub const ROGALAND_LUND: [(&str, Resultatomrade); 23] = [
    ("1112", Resultatomrade::Agder), // Lund
    ("1101", Resultatomrade::Rogaland),
    ("1103", Resultatomrade::Rogaland),
    ("1106", Resultatomrade::Rogaland),
    ("1108", Resultatomrade::Rogaland),
    ("1111", Resultatomrade::Rogaland),
    ("1114", Resultatomrade::Rogaland),
    ("1119", Resultatomrade::Rogaland),
    ("1120", Resultatomrade::Rogaland),
    ("1121", Resultatomrade::Rogaland),
    ("1122", Resultatomrade::Rogaland),
    ("1124", Resultatomrade::Rogaland),
    ("1127", Resultatomrade::Rogaland),
    ("1130", Resultatomrade::Rogaland),
    ("1133", Resultatomrade::Rogaland),
    ("1134", Resultatomrade::Rogaland),
    ("1135", Resultatomrade::Rogaland),
    ("1144", Resultatomrade::Rogaland),
    ("1145", Resultatomrade::Rogaland),
    ("1146", Resultatomrade::Rogaland),
    ("1149", Resultatomrade::Rogaland),
    ("1151", Resultatomrade::Rogaland),
    ("1160", Resultatomrade::Rogaland),
];

/// Hvem begrunnelsen for "ikke aktuell" peker på.
pub const IKKEAKTUELL_HOVEDGRUNN: [(&str, &str); 4] = [
    ("IKKE_DIALOG_MELLOM_PARTENE", "NAV"),
    ("FOR_FÅ_TAPTE_DAGSVERK", "NAV"),
    ("VIRKSOMHETEN_ØNSKER_IKKE_SAMARBEID", "Virksomhet"),
    ("VIRKSOMHETEN_HAR_IKKE_RESPONDERT", "Virksomhet"),
];

/// Alle undertemaer, også de som ikke er valgt i noen plan ennå.
pub const UNDERTEMA_NAVN: [&str; 11] = [
    "Endring og omstilling",
    "HelseIArbeid",
    "Livsfaseorientert personalpolitikk",
    "Oppfølging av arbeidsmiljøundersøkelser",
    "Oppfølgingssamtaler",
    "Psykisk helse",
    "Sykefravær - enkeltsaker",
    "Sykefraværsrutiner",
    "Tilretteleggings- og medvirkningsplikt",
    "Utvikle arbeidsmiljøet",
    "Utvikle partssamarbeidet",
];

pub(crate) fn lookup<V: Copy>(table: &[(&str, V)], key: &str) -> Option<V> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, value)| *value)
}
