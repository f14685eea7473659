//! Forecast record model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Decimal places AQI values are shown and classified at
pub const AQI_DECIMALS: u32 = 2;
/// Decimal places HRI values are shown and classified at
pub const HRI_DECIMALS: u32 = 4;

/// One precomputed forecast row for a location and day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastRecord {
    /// Monitoring station name
    pub location: String,
    /// Forecast day
    pub date: NaiveDate,
    /// Forecast Air Quality Index
    pub aqi_value: f64,
    /// Forecast Health Risk Index
    pub hri_value: f64,
}

impl ForecastRecord {
    #[must_use]
    pub fn new(location: impl Into<String>, date: NaiveDate, aqi_value: f64, hri_value: f64) -> Self {
        Self {
            location: location.into(),
            date,
            aqi_value,
            hri_value,
        }
    }

    /// AQI rounded for display (2 decimals)
    #[must_use]
    pub fn display_aqi(&self) -> f64 {
        round_to(self.aqi_value, AQI_DECIMALS)
    }

    /// HRI rounded for display (4 decimals)
    #[must_use]
    pub fn display_hri(&self) -> f64 {
        round_to(self.hri_value, HRI_DECIMALS)
    }
}

/// A single (date, value) point of a chart series
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Round half away from zero to `decimals` places
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let multiplier = 10_f64.powi(i32::try_from(decimals).unwrap_or(4));
    (value * multiplier).round() / multiplier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounding() {
        let record = ForecastRecord::new(
            "Alandur",
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            87.456_78,
            2.123_456,
        );
        assert_eq!(record.display_aqi(), 87.46);
        assert_eq!(record.display_hri(), 2.1235);
    }

    #[test]
    fn test_serializes_iso_date() {
        let record = ForecastRecord::new("Salem", NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(), 40.0, 1.0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2025-01-05");
        assert_eq!(json["location"], "Salem");
    }
}
