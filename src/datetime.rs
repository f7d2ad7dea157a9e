use chrono::{DateTime, Utc};

#[cfg(not(test))]
/// Returns the current UTC time.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

#[cfg(test)]
mod tests {
    use chrono::{DateTime, SecondsFormat, Utc};

    use super::mock_datetime;

    /// With nothing set the real clock is returned.
    ///
    /// Compared at second precision; millisecond comparison against the
    /// real clock would be flaky.
    #[test]
    fn test_now() {
        assert_eq!(
            mock_datetime::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    #[test]
    fn test_now_with_mock_time_set() {
        let datetime = String::from("2025-11-06T09:00:00+00:00");
        mock_datetime::set_mock_time(
            DateTime::parse_from_rfc3339(datetime.as_str())
                .unwrap()
                .to_utc(),
        );

        assert_eq!(mock_datetime::now().to_rfc3339(), datetime);

        mock_datetime::clear_mock_time();
    }

    #[test]
    fn test_now_after_clear_mock_time() {
        mock_datetime::set_mock_time(
            DateTime::parse_from_rfc3339("2025-11-06T09:00:00+00:00")
                .unwrap()
                .to_utc(),
        );
        mock_datetime::clear_mock_time();

        assert_eq!(
            mock_datetime::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
}
