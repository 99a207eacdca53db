use chrono::{DateTime, NaiveDate, TimeZone};

/// This is the standard way of converting a date into a ledger day key in worktally.
/// Zero padding keeps lexical order equal to chronological order.
pub fn date_to_day_key(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

/// Day key for the calendar day `time` falls on, in the timezone it carries.
pub fn day_key<Tz: TimeZone>(time: &DateTime<Tz>) -> String {
    date_to_day_key(time.date_naive())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    use super::{date_to_day_key, day_key};

    #[test]
    fn test_day_key_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(date_to_day_key(date), "2024.01.05");
    }

    #[test]
    fn test_day_key_rolls_over_at_midnight() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let before = Utc.from_utc_datetime(
            &date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap()),
        );
        let after = before + chrono::Duration::seconds(2);

        assert_eq!(day_key(&before), "2023.12.31");
        assert_eq!(day_key(&after), "2024.01.01");
    }
}
