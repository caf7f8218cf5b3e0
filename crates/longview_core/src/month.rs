//! Month-granular calendar arithmetic that bypasses jiff's `Span` machinery.
//!
//! The forecast loop ticks once per calendar month, so everything in the hot
//! path works on a `Month` (year + 1..=12) with O(1) index arithmetic.
//! `jiff::civil::Date` is used only at the configuration boundary (birth
//! dates arrive as full dates) and converted once.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// A calendar month: year plus month-of-year (1 = January, 12 = December).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    pub year: i16,
    pub month: i8,
}

impl Month {
    #[must_use]
    pub fn new(year: i16, month: i8) -> Self {
        debug_assert!((1..=12).contains(&month), "month out of range: {month}");
        Self { year, month }
    }

    /// Total months since year 0. The workhorse for ordering and distances.
    #[inline]
    #[must_use]
    pub fn index(self) -> i32 {
        i32::from(self.year) * 12 + i32::from(self.month) - 1
    }

    #[inline]
    #[must_use]
    pub fn from_index(index: i32) -> Self {
        Self {
            year: (index.div_euclid(12)) as i16,
            month: (index.rem_euclid(12) + 1) as i8,
        }
    }

    /// The following calendar month.
    #[inline]
    #[must_use]
    pub fn succ(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    #[inline]
    #[must_use]
    pub fn add_months(self, n: i32) -> Self {
        Self::from_index(self.index() + n)
    }

    /// Signed number of months from `earlier` to `self`.
    #[inline]
    #[must_use]
    pub fn months_since(self, earlier: Month) -> i32 {
        self.index() - earlier.index()
    }

    #[inline]
    #[must_use]
    pub fn is_december(self) -> bool {
        self.month == 12
    }

    #[inline]
    #[must_use]
    pub fn is_january(self) -> bool {
        self.month == 1
    }

    /// First day of the month as a civil date.
    #[must_use]
    pub fn first_day(self) -> Date {
        jiff::civil::date(self.year, self.month, 1)
    }

    /// Truncate a civil date to its month.
    #[must_use]
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Inclusive iterator over `self..=end`, empty when `end < self`.
    pub fn iter_through(self, end: Month) -> impl Iterator<Item = Month> {
        (self.index()..=end.index()).map(Month::from_index)
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip() {
        for m in [
            Month::new(2025, 1),
            Month::new(2025, 12),
            Month::new(1960, 6),
            Month::new(2100, 7),
        ] {
            assert_eq!(Month::from_index(m.index()), m);
        }
    }

    #[test]
    fn succ_rolls_year() {
        assert_eq!(Month::new(2025, 12).succ(), Month::new(2026, 1));
        assert_eq!(Month::new(2025, 1).succ(), Month::new(2025, 2));
    }

    #[test]
    fn months_since_is_calendar_exact() {
        let birth = Month::new(1965, 4);
        let m = Month::new(2025, 4);
        assert_eq!(m.months_since(birth), 60 * 12);
        assert_eq!(m.add_months(-1).months_since(birth), 60 * 12 - 1);
    }

    #[test]
    fn ordering_follows_calendar() {
        assert!(Month::new(2025, 12) < Month::new(2026, 1));
        assert!(Month::new(2025, 3) > Month::new(2025, 2));
    }

    #[test]
    fn iter_through_inclusive() {
        let months: Vec<Month> = Month::new(2025, 11)
            .iter_through(Month::new(2026, 2))
            .collect();
        assert_eq!(months.len(), 4);
        assert_eq!(months[0], Month::new(2025, 11));
        assert_eq!(months[3], Month::new(2026, 2));
    }

    #[test]
    fn iter_through_empty_when_reversed() {
        let mut it = Month::new(2026, 1).iter_through(Month::new(2025, 1));
        assert!(it.next().is_none());
    }

    #[test]
    fn date_conversion() {
        let m = Month::new(2031, 9);
        assert_eq!(m.first_day(), jiff::civil::date(2031, 9, 1));
        assert_eq!(Month::from_date(jiff::civil::date(2031, 9, 17)), m);
    }
}
