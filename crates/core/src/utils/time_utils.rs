use chrono::{DateTime, SecondsFormat, Utc};

/// RFC 3339 timestamp with millisecond precision, the format stored in
/// `createdAt`, `lastUpdate` and `exportedAt` fields.
pub fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

/// Calendar date (`YYYY-MM-DD`) of an instant, used in backup file names.
pub fn date_stamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
        assert_eq!(timestamp(instant), "2024-01-01T08:30:00.000Z");
        assert_eq!(date_stamp(instant), "2024-01-01");
    }
}
