//! Typed listing filters.
//!
//! The wire protocol historically encoded filter values as delimited
//! strings (`"10&25"` for a price range, `"2021-08"` for a month).
//! The repository works with the typed forms below; `FromStr`/`Display`
//! keep the legacy string encoding alive at the boundary.

use std::{fmt, str::FromStr};

use time::{format_description::BorrowedFormatItem, macros::format_description, Date, Month};

/// Tolerance for price equality, absorbs floating point representation error.
pub const PRICE_EPSILON: f64 = 0.01;

const RANGE_SEPARATOR: char = '&';

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, thiserror::Error)]
pub enum ParseFilterError {
    #[error("invalid price value: {0}")]
    InvalidPrice(String),
    #[error("invalid date value: {0}")]
    InvalidDate(String),
}

/// Text columns a listing can be scoped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Id,
    Author,
    Title,
    Genre,
    Description,
}

impl TextField {
    pub fn column(self) -> &'static str {
        match self {
            TextField::Id => "id",
            TextField::Author => "author",
            TextField::Title => "title",
            TextField::Genre => "genre",
            TextField::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceFilter {
    /// Matches within [`PRICE_EPSILON`] of the given value.
    Exact(f64),
    /// Inclusive on both bounds.
    Range { min: f64, max: f64 },
}

impl PriceFilter {
    /// Filter from optional query bounds. Both present makes a range,
    /// a single bound an exact match, neither no filter at all.
    pub fn from_bounds(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        match (min, max) {
            (Some(min), Some(max)) => Some(PriceFilter::Range { min, max }),
            (Some(value), None) | (None, Some(value)) => Some(PriceFilter::Exact(value)),
            (None, None) => None,
        }
    }
}

impl FromStr for PriceFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseFilterError::InvalidPrice(s.to_string());
        match s.split_once(RANGE_SEPARATOR) {
            Some((min, max)) => {
                let min = min.trim().parse().map_err(|_| invalid())?;
                let max = max.trim().parse().map_err(|_| invalid())?;
                Ok(PriceFilter::Range { min, max })
            }
            None => {
                let value = s.trim().parse().map_err(|_| invalid())?;
                Ok(PriceFilter::Exact(value))
            }
        }
    }
}

impl fmt::Display for PriceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceFilter::Exact(value) => write!(f, "{}", value),
            PriceFilter::Range { min, max } => write!(f, "{}{}{}", min, RANGE_SEPARATOR, max),
        }
    }
}

/// Publish date filter at one of three granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Year(i32),
    Month { year: i32, month: u8 },
    Day(Date),
}

impl DateFilter {
    /// Build a filter from path segments. Year is mandatory; without a
    /// month the day is ignored (coarser granularity wins). Returns
    /// `None` for dates that do not exist on the calendar.
    pub fn from_parts(year: Option<i32>, month: Option<u8>, day: Option<u8>) -> Option<Self> {
        let year = year?;
        if !(1..=9999).contains(&year) {
            return None;
        }
        match (month, day) {
            (None, _) => Some(DateFilter::Year(year)),
            (Some(month), None) => {
                Month::try_from(month).ok()?;
                Some(DateFilter::Month { year, month })
            }
            (Some(month), Some(day)) => {
                let month = Month::try_from(month).ok()?;
                Date::from_calendar_date(year, month, day)
                    .ok()
                    .map(DateFilter::Day)
            }
        }
    }
}

impl FromStr for DateFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseFilterError::InvalidDate(s.to_string());
        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [year] if year.len() == 4 => {
                let year = year.parse().map_err(|_| invalid())?;
                DateFilter::from_parts(Some(year), None, None).ok_or_else(invalid)
            }
            [year, month] if year.len() == 4 => {
                let year = year.parse().map_err(|_| invalid())?;
                let month = month.parse().map_err(|_| invalid())?;
                DateFilter::from_parts(Some(year), Some(month), None).ok_or_else(invalid)
            }
            _ => Date::parse(s, DATE_FORMAT)
                .map(DateFilter::Day)
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFilter::Year(year) => write!(f, "{:04}", year),
            DateFilter::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            DateFilter::Day(date) => {
                let formatted = date.format(DATE_FORMAT).map_err(|_| fmt::Error)?;
                f.write_str(&formatted)
            }
        }
    }
}

/// Scope of a book listing. Absent inner values (blank needle, no price
/// bounds, no date) keep all rows but still order by the scoped column.
#[derive(Debug, Clone, PartialEq)]
pub enum BookFilter {
    All,
    Text {
        field: TextField,
        needle: Option<String>,
    },
    Price(Option<PriceFilter>),
    Published(Option<DateFilter>),
}

impl BookFilter {
    /// Text filter; blank needles collapse to an unfiltered listing.
    pub fn text(field: TextField, needle: Option<String>) -> Self {
        let needle = needle
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        BookFilter::Text { field, needle }
    }

    /// Column the result set is ordered by.
    pub fn order_column(&self) -> &'static str {
        match self {
            BookFilter::All => "id",
            BookFilter::Text { field, .. } => field.column(),
            BookFilter::Price(_) => "price",
            BookFilter::Published(_) => "publish_date",
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn price_from_bounds() {
        assert_eq!(
            PriceFilter::from_bounds(Some(10.0), Some(25.0)),
            Some(PriceFilter::Range {
                min: 10.0,
                max: 25.0
            })
        );
        assert_eq!(
            PriceFilter::from_bounds(Some(10.0), None),
            Some(PriceFilter::Exact(10.0))
        );
        assert_eq!(
            PriceFilter::from_bounds(None, Some(25.0)),
            Some(PriceFilter::Exact(25.0))
        );
        assert_eq!(PriceFilter::from_bounds(None, None), None);
    }

    #[test]
    fn price_round_trip() {
        for encoded in ["10&25", "19.99", "0.5&100.25"] {
            let filter: PriceFilter = encoded.parse().unwrap();
            assert_eq!(filter.to_string(), encoded);
        }
    }

    #[test]
    fn price_rejects_garbage() {
        assert!("abc".parse::<PriceFilter>().is_err());
        assert!("10&".parse::<PriceFilter>().is_err());
        assert!("&25".parse::<PriceFilter>().is_err());
    }

    #[test]
    fn date_from_parts() {
        assert_eq!(
            DateFilter::from_parts(Some(2021), Some(8), Some(15)),
            Some(DateFilter::Day(date!(2021 - 08 - 15)))
        );
        // invalid month
        assert_eq!(DateFilter::from_parts(Some(2021), Some(13), Some(15)), None);
        // invalid day
        assert_eq!(DateFilter::from_parts(Some(2021), Some(2), Some(30)), None);
        // year is required
        assert_eq!(DateFilter::from_parts(None, Some(8), Some(15)), None);
        // day without month is ignored
        assert_eq!(
            DateFilter::from_parts(Some(2021), None, Some(15)),
            Some(DateFilter::Year(2021))
        );
    }

    #[test]
    fn date_round_trip() {
        for encoded in ["2021", "2021-08", "2021-08-15"] {
            let filter: DateFilter = encoded.parse().unwrap();
            assert_eq!(filter.to_string(), encoded);
        }
    }

    #[test]
    fn date_rejects_garbage() {
        assert!("21".parse::<DateFilter>().is_err());
        assert!("2021-13".parse::<DateFilter>().is_err());
        assert!("2021-02-30".parse::<DateFilter>().is_err());
        assert!("yesterday".parse::<DateFilter>().is_err());
    }

    #[test]
    fn blank_needle_collapses() {
        assert_eq!(
            BookFilter::text(TextField::Author, Some("  ".to_string())),
            BookFilter::Text {
                field: TextField::Author,
                needle: None
            }
        );
        assert_eq!(
            BookFilter::text(TextField::Author, Some(" Kay ".to_string())),
            BookFilter::Text {
                field: TextField::Author,
                needle: Some("Kay".to_string())
            }
        );
    }
}
