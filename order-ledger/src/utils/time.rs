//! Business timezone helpers
//!
//! Order numbers carry the calendar date of creation in the business
//! timezone, not in UTC.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Calendar date of `instant` in the business timezone
pub fn business_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Calendar date of a Unix-millis timestamp in the business timezone
///
/// Out-of-range timestamps fall back to the current date.
pub fn business_date_from_millis(millis: i64, tz: Tz) -> NaiveDate {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(instant) => business_date(instant, tz),
        None => {
            tracing::warn!(millis, "Timestamp out of range, using current date");
            business_date(Utc::now(), tz)
        }
    }
}

/// Key used for the per-day sequence counter (YYYYMMDD)
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Date component of the order number (DDMMYY)
pub fn order_number_date(date: NaiveDate) -> String {
    date.format("%d%m%y").to_string()
}

/// Human-readable date for documents (DD/MM/YYYY HH:MM)
pub fn format_display(millis: i64, tz: Tz) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.with_timezone(&tz).format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_date_crosses_midnight_before_utc() {
        // 2026-10-19 18:45 UTC is 2026-10-20 00:15 in Kolkata (+05:30)
        let instant = Utc.with_ymd_and_hms(2026, 10, 19, 18, 45, 0).unwrap();
        let date = business_date(instant, chrono_tz::Asia::Kolkata);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(order_number_date(date), "201026");
        assert_eq!(date_key(date), "20261020");
    }

    #[test]
    fn test_business_date_from_millis() {
        let instant = Utc.with_ymd_and_hms(2026, 10, 19, 18, 15, 0).unwrap();
        let date = business_date_from_millis(instant.timestamp_millis(), chrono_tz::Asia::Kolkata);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }

    #[test]
    fn test_format_display() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 0).unwrap();
        assert_eq!(
            format_display(instant.timestamp_millis(), chrono_tz::UTC),
            "02/01/2026 03:04"
        );
    }
}
