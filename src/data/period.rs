//! Calendar periods used to key monthly fuel prices
//!
//! A price always pertains to the calendar month preceding the query date.
//! Month arithmetic is done in UTC so every process sharing a cache file
//! derives the same key at the same instant.

use chrono::{DateTime, Datelike, Month, Utc};

/// A calendar month, e.g. March 2025
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    year: i32,
    /// Always 1 through 12
    month: u32,
}

impl Period {
    /// Creates a period, returning `None` if `month` is not 1 through 12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Four-digit year
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month number, 1 through 12
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the calendar month immediately before the month of `now`
    ///
    /// January rolls back to December of the previous year.
    pub fn preceding(now: DateTime<Utc>) -> Self {
        if now.month() == 1 {
            Self {
                year: now.year() - 1,
                month: 12,
            }
        } else {
            Self {
                year: now.year(),
                month: now.month() - 1,
            }
        }
    }

    /// English month name, e.g. "March"
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }

    /// Cache key for this period, e.g. "March-2025"
    pub fn key(&self) -> String {
        format!("{}-{}", self.month_name(), self.year)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_preceding_mid_year() {
        let period = Period::preceding(utc(2025, 4, 15));
        assert_eq!(period, Period { year: 2025, month: 3 });
        assert_eq!(period.key(), "March-2025");
    }

    #[test]
    fn test_preceding_january_rolls_back_year() {
        let period = Period::preceding(utc(2025, 1, 1));
        assert_eq!(period, Period { year: 2024, month: 12 });
        assert_eq!(period.key(), "December-2024");
    }

    #[test]
    fn test_preceding_first_instant_of_month() {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(Period::preceding(now).key(), "June-2025");
    }

    #[test]
    fn test_month_names() {
        let names: Vec<&str> = (1..=12)
            .map(|m| Period::new(2025, m).unwrap().month_name())
            .collect();
        assert_eq!(
            names,
            [
                "January", "February", "March", "April", "May", "June", "July", "August",
                "September", "October", "November", "December"
            ]
        );
    }

    #[test]
    fn test_new_rejects_invalid_month() {
        assert!(Period::new(2025, 0).is_none());
        assert!(Period::new(2025, 13).is_none());
    }

    #[test]
    fn test_accessors() {
        let period = Period::new(2024, 11).unwrap();
        assert_eq!(period.year(), 2024);
        assert_eq!(period.month(), 11);
    }

    #[test]
    fn test_display() {
        assert_eq!(Period::new(2024, 11).unwrap().to_string(), "November 2024");
    }
}
