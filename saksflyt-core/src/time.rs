//! Tidshjelpere. Alle tidspunkt i kjernen er uten tidssone (UTC veggklokke).

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Fjerner tidssonen etter konvertering til UTC.
pub fn strip_timezone(value: DateTime<FixedOffset>) -> NaiveDateTime {
    value.with_timezone(&Utc).naive_utc()
}

/// Tolker et tidspunkt slik datavarehuset eksporterer det.
///
/// Godtar RFC 3339, BigQuery-formatet `2024-01-02 10:00:00.123 UTC` og
/// tidspunkt uten sone (tolkes som UTC).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(strip_timezone(parsed));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(strip_timezone(parsed));
        }
    }

    let without_suffix = value.strip_suffix(" UTC").unwrap_or(value);
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(without_suffix, format) {
            return Some(parsed);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Tolker en dato og gir `None` i stedet for feil når verdien er ugyldig.
pub fn coerce_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|timestamp| timestamp.date()))
}

/// Hele dager, rundet ned, også for negative varigheter.
pub fn floor_days(duration: Duration) -> i64 {
    duration.num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Midnatt ved starten av dagen.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Lesbar varighet, f.eks. "2 dager 3 timer 0 min 5 sek".
pub fn pretty_time_delta(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.abs();
    let (days, seconds) = (seconds / SECONDS_PER_DAY, seconds % SECONDS_PER_DAY);
    let (hours, seconds) = (seconds / 3600, seconds % 3600);
    let (minutes, seconds) = (seconds / 60, seconds % 60);

    if days > 0 {
        format!("{sign}{days} dager {hours} timer {minutes} min {seconds} sek")
    } else if hours > 0 {
        format!("{sign}{hours} timer {minutes} min {seconds} sek")
    } else if minutes > 0 {
        format!("{sign}{minutes} min {seconds} sek")
    } else {
        format!("{sign}{seconds} sek")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn offset_timestamps_are_converted_to_utc() {
        assert_eq!(
            parse_timestamp("2024-03-01T10:00:00+01:00"),
            Some(at("2024-03-01 09:00:00"))
        );
        assert_eq!(
            parse_timestamp("2024-03-01 09:00:00.250 UTC").map(|t| t.and_utc().timestamp_millis()),
            Some(at("2024-03-01 09:00:00").and_utc().timestamp_millis() + 250)
        );
        assert_eq!(parse_timestamp("   "), None);
    }

    #[test]
    fn unparseable_deadline_becomes_none() {
        assert_eq!(
            coerce_date(Some("2024-05-17")),
            NaiveDate::from_ymd_opt(2024, 5, 17)
        );
        assert_eq!(coerce_date(Some("ikke en dato")), None);
        assert_eq!(coerce_date(None), None);
    }

    #[test]
    fn floor_days_rounds_down() {
        assert_eq!(floor_days(Duration::hours(47)), 1);
        assert_eq!(floor_days(Duration::hours(48)), 2);
        assert_eq!(floor_days(Duration::hours(-1)), -1);
    }

    #[test]
    fn pretty_time_delta_picks_largest_unit() {
        assert_eq!(pretty_time_delta(5), "5 sek");
        assert_eq!(pretty_time_delta(125), "2 min 5 sek");
        assert_eq!(pretty_time_delta(2 * 86_400 + 3 * 3600 + 5), "2 dager 3 timer 0 min 5 sek");
        assert_eq!(pretty_time_delta(-60), "-1 min 0 sek");
    }
}
