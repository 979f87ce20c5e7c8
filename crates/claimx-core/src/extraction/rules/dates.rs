//! Date plausibility checks for claim form dates.

use chrono::{Datelike, Local, NaiveDate, TimeDelta};

use super::patterns::{DATE_IN_TEXT, DATE_MDY_LONG, DATE_MDY_SHORT};

/// Accepts dates that are neither in the future nor older than an age ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateValidator {
    max_years_old: u32,
    today: Option<NaiveDate>,
    two_digit_year_pivot: i32,
}

impl DateValidator {
    /// Validator anchored at the local current date, read on every check.
    pub fn new(max_years_old: u32) -> Self {
        Self {
            max_years_old,
            today: None,
            two_digit_year_pivot: 0,
        }
    }

    /// Anchor "today" at a fixed date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Number of years past the current year that a two-digit year may
    /// still resolve into the current century.
    pub fn with_two_digit_year_pivot(mut self, years: i32) -> Self {
        self.two_digit_year_pivot = years;
        self
    }

    /// Age ceiling in years.
    pub fn max_years_old(&self) -> u32 {
        self.max_years_old
    }

    /// Parse `MM/DD/YYYY`, then `MM/DD/YY`.
    pub fn parse(&self, date: &str) -> Option<NaiveDate> {
        let date = date.trim();

        if let Some(caps) = DATE_MDY_LONG.captures(date) {
            let month: u32 = caps[1].parse().ok()?;
            let day: u32 = caps[2].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }

        if let Some(caps) = DATE_MDY_SHORT.captures(date) {
            let month: u32 = caps[1].parse().ok()?;
            let day: u32 = caps[2].parse().ok()?;
            let year = self.expand_year(caps[3].parse().ok()?);
            return NaiveDate::from_ymd_opt(year, month, day);
        }

        None
    }

    /// True when `date` parses and lies in `[today - max_years_old * 365 days, today]`.
    ///
    /// A ceiling reaching past the calendar's range means no lower bound.
    pub fn is_valid(&self, date: &str) -> bool {
        let Some(parsed) = self.parse(date) else {
            return false;
        };

        let today = self.today();
        let oldest = TimeDelta::try_days(365 * i64::from(self.max_years_old))
            .and_then(|age| today.checked_sub_signed(age));
        parsed <= today && oldest.is_none_or(|oldest| parsed >= oldest)
    }

    /// Two-digit years map into the current century unless that lands more
    /// than `two_digit_year_pivot` years in the future, in which case they
    /// map into the previous century.
    fn expand_year(&self, two_digit: i32) -> i32 {
        let current = self.today().year();
        let candidate = current - current.rem_euclid(100) + two_digit;

        if candidate > current + self.two_digit_year_pivot {
            candidate - 100
        } else {
            candidate
        }
    }
}

/// Validate a date against the local current date.
pub fn is_valid_date(date: &str, max_years_old: u32) -> bool {
    DateValidator::new(max_years_old).is_valid(date)
}

/// Pull the first date out of free text and normalize it to `MM/DD/YYYY`
/// (or `MM/DD/YY` when the text carries a two-digit year).
pub fn normalize_date_text(text: &str) -> Option<String> {
    let caps = DATE_IN_TEXT.captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year = &caps[3];

    Some(format!("{:02}/{:02}/{}", month, day, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn validator(max_years_old: u32) -> DateValidator {
        DateValidator::new(max_years_old).with_today(today())
    }

    #[test]
    fn test_parse_long_and_short() {
        let v = validator(10);

        assert_eq!(v.parse("02/14/2024"), NaiveDate::from_ymd_opt(2024, 2, 14));
        assert_eq!(v.parse("02/14/24"), NaiveDate::from_ymd_opt(2024, 2, 14));
        assert_eq!(v.parse("13/14/2024"), None);
        assert_eq!(v.parse("02/30/2024"), None);
        assert_eq!(v.parse("0214/2024"), None);
    }

    #[test]
    fn test_future_dates_are_rejected() {
        let v = validator(10);

        assert!(v.is_valid("10/17/2026"));
        assert!(!v.is_valid("10/18/2026"));
    }

    #[test]
    fn test_age_ceiling() {
        let v = validator(10);

        assert!(v.is_valid("01/01/2020"));
        assert!(!v.is_valid("01/01/2010"));
        assert!(validator(110).is_valid("01/01/1930"));
    }

    #[test]
    fn test_huge_age_ceiling_has_no_lower_bound() {
        for years in [400_000, u32::MAX] {
            let v = validator(years);
            assert!(v.is_valid("01/02/2020"));
            assert!(v.is_valid("01/02/1066"));
            assert!(!v.is_valid("01/02/2030"));
        }
    }

    #[test]
    fn test_unanchored_validator_uses_current_date() {
        let now = Local::now().date_naive();
        let v = DateValidator::new(1);

        assert!(v.is_valid(&now.format("%m/%d/%Y").to_string()));
        assert!(!v.is_valid(&(now + TimeDelta::days(2)).format("%m/%d/%Y").to_string()));
    }

    #[test]
    fn test_is_valid_date() {
        let now = Local::now().date_naive();
        let recent = (now - TimeDelta::days(30)).format("%m/%d/%Y").to_string();
        let old = (now - TimeDelta::days(365 * 20)).format("%m/%d/%Y").to_string();

        assert!(is_valid_date(&recent, 10));
        assert!(!is_valid_date(&old, 10));
        assert!(is_valid_date(&old, 110));
        assert!(!is_valid_date("not a date", 110));
    }

    #[test]
    fn test_two_digit_year_window() {
        let v = validator(110);

        assert_eq!(v.parse("01/02/26"), NaiveDate::from_ymd_opt(2026, 1, 2));
        assert_eq!(v.parse("01/02/27"), NaiveDate::from_ymd_opt(1927, 1, 2));
        assert_eq!(v.parse("01/02/85"), NaiveDate::from_ymd_opt(1985, 1, 2));

        let lenient = v.with_two_digit_year_pivot(10);
        assert_eq!(lenient.parse("01/02/36"), NaiveDate::from_ymd_opt(2036, 1, 2));
        assert_eq!(lenient.parse("01/02/37"), NaiveDate::from_ymd_opt(1937, 1, 2));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let v = validator(10);

        assert!(!v.is_valid(""));
        assert!(!v.is_valid("error"));
        assert!(!v.is_valid("99/99/9999"));
    }

    #[test]
    fn test_normalize_date_text() {
        assert_eq!(normalize_date_text("The date is 2/4/2024."), Some("02/04/2024".to_string()));
        assert_eq!(normalize_date_text("02-14-24"), Some("02/14/24".to_string()));
        assert_eq!(normalize_date_text("error"), None);
    }
}
