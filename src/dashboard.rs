//! Forecast dashboard view model
//!
//! Assembles everything the forecast page shows for one location and day:
//! the location and date pickers, the AQI and HRI panels, summary figures
//! and the chart series. Rendering is left to the client.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dataset::{ForecastStore, UNKNOWN_LOCATION};
use crate::forecast::{AqiCategory, HriCategory, QueryError, classify_aqi, classify_hri};
use crate::models::SeriesPoint;
use crate::models::forecast::{AQI_DECIMALS, HRI_DECIMALS, round_to};

/// How many days of the forecast the charts cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForecastDuration {
    #[serde(rename = "7_days")]
    SevenDays,
    #[serde(rename = "14_days")]
    FourteenDays,
    #[default]
    #[serde(rename = "28_days")]
    TwentyEightDays,
}

impl ForecastDuration {
    #[must_use]
    pub fn days(self) -> usize {
        match self {
            ForecastDuration::SevenDays => 7,
            ForecastDuration::FourteenDays => 14,
            ForecastDuration::TwentyEightDays => 28,
        }
    }
}

/// Duration text other than `7_days`, `14_days` or `28_days`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid duration '{0}'. Must be one of: 7_days, 14_days, 28_days")]
pub struct InvalidDuration(pub String);

impl FromStr for ForecastDuration {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7_days" => Ok(ForecastDuration::SevenDays),
            "14_days" => Ok(ForecastDuration::FourteenDays),
            "28_days" => Ok(ForecastDuration::TwentyEightDays),
            other => Err(InvalidDuration(other.to_string())),
        }
    }
}

/// Picker state sent by the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: ForecastDuration,
}

/// AQI figure for the selected day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiPanel {
    pub value: Option<f64>,
    pub category: Option<AqiCategory>,
    pub message: Option<String>,
    pub color: Option<String>,
}

/// HRI figure for the selected day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HriPanel {
    pub value: Option<f64>,
    pub category: Option<HriCategory>,
    pub risk: Option<String>,
    pub message: Option<String>,
    pub color: Option<String>,
}

/// Whole-forecast figures for the selected location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub average_aqi: Option<f64>,
    pub average_hri: Option<f64>,
    pub latest_aqi_date: Option<NaiveDate>,
    pub latest_hri_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub locations: Vec<String>,
    pub selected_location: String,
    pub available_dates: Vec<NaiveDate>,
    pub selected_date: Option<NaiveDate>,
    pub duration: ForecastDuration,
    pub aqi: AqiPanel,
    pub hri: HriPanel,
    pub summary: ForecastSummary,
    pub aqi_series: Vec<SeriesPoint>,
    pub hri_series: Vec<SeriesPoint>,
}

/// Build the dashboard for the requested location and day.
///
/// Without a location the first known one is selected; without a date the
/// first day of the location's HRI forecast is selected.
pub fn build_dashboard<S: ForecastStore + ?Sized>(
    store: &S,
    request: &DashboardRequest,
) -> Result<DashboardView, QueryError> {
    let locations: Vec<String> = store.all_locations().into_iter().collect();

    let selected_location = match &request.location {
        Some(location) if locations.contains(location) => location.clone(),
        Some(location) => {
            return Err(QueryError::LocationNotFound {
                location: location.clone(),
                available: locations,
            });
        }
        None => locations
            .first()
            .cloned()
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
    };

    let aqi_points = store.aqi_series(&selected_location);
    let hri_points = store.hri_series(&selected_location);

    let available_dates: Vec<NaiveDate> = hri_points.iter().map(|p| p.date).collect();
    let selected_date = request.date.or_else(|| available_dates.first().copied());
    debug!(location = %selected_location, ?selected_date, "Building dashboard");

    let aqi_value = selected_date
        .and_then(|d| value_on(&aqi_points, d))
        .map(|v| round_to(v, AQI_DECIMALS));
    let hri_value = selected_date
        .and_then(|d| value_on(&hri_points, d))
        .map(|v| round_to(v, HRI_DECIMALS));

    let aqi_category = aqi_value.map(classify_aqi);
    let hri_category = hri_value.map(classify_hri);

    let summary = ForecastSummary {
        average_aqi: mean(&aqi_points).map(|v| round_to(v, 2)),
        average_hri: mean(&hri_points).map(|v| round_to(v, 6)),
        latest_aqi_date: aqi_points.iter().map(|p| p.date).max(),
        latest_hri_date: hri_points.iter().map(|p| p.date).max(),
    };

    let days = request.duration.days();

    Ok(DashboardView {
        locations,
        selected_location,
        available_dates,
        selected_date,
        duration: request.duration,
        aqi: AqiPanel {
            value: aqi_value,
            category: aqi_category,
            message: aqi_category.map(|c| c.message().to_string()),
            color: aqi_category.map(|c| c.color().to_string()),
        },
        hri: HriPanel {
            value: hri_value,
            category: hri_category,
            risk: hri_category.map(|c| c.risk().to_string()),
            message: hri_category.map(|c| c.message().to_string()),
            color: hri_category.map(|c| c.color().to_string()),
        },
        summary,
        aqi_series: aqi_points.into_iter().take(days).collect(),
        hri_series: hri_points.into_iter().take(days).collect(),
    })
}

fn value_on(points: &[SeriesPoint], date: NaiveDate) -> Option<f64> {
    points.iter().find(|p| p.date == date).map(|p| p.value)
}

fn mean(points: &[SeriesPoint]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    let total: f64 = points.iter().map(|p| p.value).sum();
    #[allow(clippy::cast_precision_loss)]
    Some(total / points.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ForecastDataset;
    use chrono::Duration;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn store() -> ForecastDataset {
        let mut dataset = ForecastDataset::default();
        for day in 0..28 {
            let date = start() + Duration::days(day);
            dataset.insert_aqi("Vellore", date, 40.0 + day as f64 * 5.0);
            dataset.insert_hri("Vellore", date, 1.0 + day as f64 * 0.2);
        }
        dataset.insert_aqi("Alandur", start(), 120.123);
        dataset.insert_hri("Alandur", start(), 3.5);
        dataset
    }

    #[test]
    fn test_defaults_to_first_location_and_date() {
        let view = build_dashboard(&store(), &DashboardRequest::default()).unwrap();
        assert_eq!(view.locations, vec!["Alandur", "Vellore"]);
        assert_eq!(view.selected_location, "Alandur");
        assert_eq!(view.selected_date, Some(start()));
        assert_eq!(view.aqi.value, Some(120.12));
        assert_eq!(view.aqi.category, Some(AqiCategory::UnhealthyForSensitiveGroups));
        assert_eq!(view.hri.category, Some(HriCategory::High));
        assert_eq!(view.hri.risk.as_deref(), Some("High health risk."));
    }

    #[test]
    fn test_duration_limits_chart_series() {
        let request = DashboardRequest {
            location: Some("Vellore".to_string()),
            date: None,
            duration: ForecastDuration::SevenDays,
        };
        let view = build_dashboard(&store(), &request).unwrap();
        assert_eq!(view.aqi_series.len(), 7);
        assert_eq!(view.hri_series.len(), 7);
        assert_eq!(view.available_dates.len(), 28);
        assert_eq!(view.summary.latest_aqi_date, Some(start() + Duration::days(27)));
    }

    #[test]
    fn test_summary_averages() {
        let request = DashboardRequest {
            location: Some("Vellore".to_string()),
            ..Default::default()
        };
        let view = build_dashboard(&store(), &request).unwrap();
        assert_eq!(view.summary.average_aqi, Some(107.5));
        assert_eq!(view.summary.average_hri, Some(3.7));
    }

    #[test]
    fn test_date_without_data_leaves_panels_empty() {
        let request = DashboardRequest {
            location: Some("Alandur".to_string()),
            date: Some(start() + Duration::days(3)),
            ..Default::default()
        };
        let view = build_dashboard(&store(), &request).unwrap();
        assert_eq!(view.aqi.value, None);
        assert_eq!(view.hri.category, None);
    }

    #[test]
    fn test_unknown_location_is_an_error() {
        let request = DashboardRequest {
            location: Some("Atlantis".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_dashboard(&store(), &request),
            Err(QueryError::LocationNotFound { .. })
        ));
    }

    #[test]
    fn test_empty_store_selects_unknown() {
        let view = build_dashboard(&ForecastDataset::default(), &DashboardRequest::default()).unwrap();
        assert_eq!(view.selected_location, UNKNOWN_LOCATION);
        assert!(view.locations.is_empty());
        assert!(view.selected_date.is_none());
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!("14_days".parse::<ForecastDuration>(), Ok(ForecastDuration::FourteenDays));
        assert_eq!(
            "3_days".parse::<ForecastDuration>(),
            Err(InvalidDuration("3_days".to_string()))
        );
    }
}
