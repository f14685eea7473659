//! Location/date lookup against a [`ForecastStore`]

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::{AqiCategory, HriCategory, classify_aqi, classify_hri};
use super::error::{QueryError, Result};
use super::query::Query;
use crate::dataset::ForecastStore;
use crate::models::ForecastRecord;

/// A forecast row together with its AQI and HRI bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub record: ForecastRecord,
    pub aqi_category: AqiCategory,
    pub aqi_message: String,
    pub hri_category: HriCategory,
    pub hri_risk: String,
    pub hri_message: String,
}

impl ForecastReport {
    /// Classify both metrics of a record at their displayed precision, so
    /// the category always agrees with the number shown next to it
    #[must_use]
    pub fn from_record(record: ForecastRecord) -> Self {
        let aqi_category = classify_aqi(record.display_aqi());
        let hri_category = classify_hri(record.display_hri());
        Self {
            record,
            aqi_category,
            aqi_message: aqi_category.message().to_string(),
            hri_category,
            hri_risk: hri_category.risk().to_string(),
            hri_message: hri_category.message().to_string(),
        }
    }
}

/// Find the single record for an exact location and date.
///
/// Unknown locations report every known location (sorted); a known location
/// without a row for the date reports [`QueryError::NoDataForDate`].
pub fn lookup_forecast<S: ForecastStore + ?Sized>(query: &Query, store: &S) -> Result<ForecastRecord> {
    let locations = store.all_locations();
    if !locations.contains(&query.location) {
        debug!(location = %query.location, "Unknown location requested");
        return Err(QueryError::LocationNotFound {
            location: query.location.clone(),
            available: locations.into_iter().collect(),
        });
    }

    store
        .lookup(&query.location, query.date)
        .ok_or_else(|| QueryError::NoDataForDate {
            location: query.location.clone(),
            date: query.date,
        })
}

/// Parse, look up and classify in one step
pub fn answer_query<S: ForecastStore + ?Sized>(text: &str, store: &S) -> Result<ForecastReport> {
    let query = super::parse_query(text)?;
    let record = lookup_forecast(&query, store)?;
    Ok(ForecastReport::from_record(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ForecastDataset;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> ForecastDataset {
        let mut dataset = ForecastDataset::default();
        for (location, aqi, hri) in [("Salem", 160.0, 4.7), ("Alandur", 50.0, 1.55), ("Ooty", 20.0, 0.4)] {
            dataset.insert_aqi(location, date(2024, 12, 31), aqi);
            dataset.insert_hri(location, date(2024, 12, 31), hri);
        }
        dataset.insert_hri("Manali", date(2025, 1, 1), 3.0);
        dataset
    }

    #[test]
    fn test_lookup_and_classify() {
        let query = Query::new("Alandur", date(2024, 12, 31));
        let report = ForecastReport::from_record(lookup_forecast(&query, &store()).unwrap());
        assert_eq!(report.aqi_category, AqiCategory::Good);
        assert_eq!(report.hri_category, HriCategory::Moderate);
        assert_eq!(report.hri_risk, "Moderate health risk.");
    }

    #[test]
    fn test_unknown_location_lists_all_sorted() {
        let query = Query::new("Atlantis", date(2024, 12, 31));
        let err = lookup_forecast(&query, &store()).unwrap_err();
        assert_eq!(
            err,
            QueryError::LocationNotFound {
                location: "Atlantis".to_string(),
                available: vec!["Alandur", "Manali", "Ooty", "Salem"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }
        );
    }

    #[test]
    fn test_known_location_missing_date() {
        let query = Query::new("Salem", date(2025, 6, 1));
        assert!(matches!(
            lookup_forecast(&query, &store()),
            Err(QueryError::NoDataForDate { .. })
        ));
    }

    #[test]
    fn test_location_with_partial_data_reports_no_data() {
        let query = Query::new("Manali", date(2025, 1, 1));
        assert!(matches!(
            lookup_forecast(&query, &store()),
            Err(QueryError::NoDataForDate { .. })
        ));
    }

    #[test]
    fn test_repeated_answers_are_identical() {
        let store = store();
        let first = answer_query("Salem 31-12-2024", &store).unwrap();
        for _ in 0..10 {
            assert_eq!(answer_query("Salem 31-12-2024", &store).unwrap(), first);
        }
        assert_eq!(first.aqi_category, AqiCategory::Unhealthy);
        assert_eq!(first.hri_category, HriCategory::VeryHigh);
    }

    #[rstest]
    #[case(50.004, 1.549_96, AqiCategory::Good, HriCategory::Moderate)]
    #[case(50.006, 1.549_94, AqiCategory::Moderate, HriCategory::Low)]
    #[case(300.001, 4.639_96, AqiCategory::VeryUnhealthy, HriCategory::VeryHigh)]
    fn test_classifies_displayed_values(
        #[case] aqi: f64,
        #[case] hri: f64,
        #[case] aqi_category: AqiCategory,
        #[case] hri_category: HriCategory,
    ) {
        let record = ForecastRecord::new("Salem", date(2024, 12, 31), aqi, hri);
        let report = ForecastReport::from_record(record);
        assert_eq!(report.aqi_category, aqi_category);
        assert_eq!(report.hri_category, hri_category);
    }

    #[test]
    fn test_answer_query_surfaces_parse_errors() {
        assert_eq!(answer_query("Salem", &store()), Err(QueryError::BadFormat));
    }
}
