//! Free-text query parsing
//!
//! Turns `"<Location> <DD-MM-YYYY>"` into a [`Query`].

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{QueryError, Result};

/// Date layout users type
pub const USER_DATE_FORMAT: &str = "%d-%m-%Y";
/// Date layout the datasets are keyed by
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

static QUERY_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s+(\d{2}-\d{2}-\d{4})$").expect("valid query regex"));

/// A parsed location/date request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// Location token, matched case-sensitively
    pub location: String,
    pub date: NaiveDate,
}

impl Query {
    #[must_use]
    pub fn new(location: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            location: location.into(),
            date,
        }
    }

    /// Date in `YYYY-MM-DD` form
    #[must_use]
    pub fn iso_date(&self) -> String {
        self.date.format(ISO_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.location, self.date.format(USER_DATE_FORMAT))
    }
}

/// Parse a `<token> <DD-MM-YYYY>` line.
///
/// Leading and trailing whitespace is ignored. Text that does not have the
/// two-field shape yields [`QueryError::BadFormat`]; a well-shaped date that
/// is not a real calendar day yields [`QueryError::BadDate`].
pub fn parse_query(text: &str) -> Result<Query> {
    let captures = QUERY_SHAPE
        .captures(text.trim())
        .ok_or(QueryError::BadFormat)?;

    let location = &captures[1];
    let date_text = &captures[2];

    let bad_date = || QueryError::BadDate {
        input: date_text.to_string(),
    };
    let date = NaiveDate::parse_from_str(date_text, USER_DATE_FORMAT).map_err(|_| bad_date())?;
    // Calendar years start at 1
    if date.year() < 1 {
        return Err(bad_date());
    }

    Ok(Query::new(location, date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_valid_query() {
        let query = parse_query("Alandur 31-12-2024").unwrap();
        assert_eq!(query.location, "Alandur");
        assert_eq!(query.iso_date(), "2024-12-31");
    }

    #[test]
    fn test_location_case_is_preserved() {
        let query = parse_query("crescent_Chengalpattu 01-03-2025").unwrap();
        assert_eq!(query.location, "crescent_Chengalpattu");
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let query = parse_query("  Salem\t05-01-2025 \n").unwrap();
        assert_eq!(query, Query::new("Salem", NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()));
    }

    #[rstest]
    #[case("Alandur 2024-12-31")]
    #[case("NoDateHere")]
    #[case("")]
    #[case("Tamil Nadu 31-12-2024")]
    #[case("Alandur 31/12/2024")]
    #[case("Alandur 1-12-2024")]
    #[case("Alandur 31-12-2024 extra")]
    #[case("Ala-ndur 31-12-2024")]
    fn test_bad_format(#[case] input: &str) {
        assert_eq!(parse_query(input), Err(QueryError::BadFormat));
    }

    #[rstest]
    #[case("Alandur 31-02-2024", "31-02-2024")]
    #[case("Alandur 29-02-2023", "29-02-2023")]
    #[case("Alandur 00-01-2024", "00-01-2024")]
    #[case("Alandur 15-13-2024", "15-13-2024")]
    #[case("Alandur 31-12-0000", "31-12-0000")]
    fn test_bad_date(#[case] input: &str, #[case] date: &str) {
        assert_eq!(
            parse_query(input),
            Err(QueryError::BadDate {
                input: date.to_string()
            })
        );
    }

    #[test]
    fn test_leap_day_is_accepted() {
        let query = parse_query("Ooty 29-02-2024").unwrap();
        assert_eq!(query.iso_date(), "2024-02-29");
    }

    #[test]
    fn test_display_round_trips_user_format() {
        let query = parse_query("Vellore 07-08-2025").unwrap();
        assert_eq!(query.to_string(), "Vellore 07-08-2025");
    }
}
