//! AQI and HRI band classification
//!
//! Both classifiers are total step functions over `f64`. Breakpoints live in
//! the `*_BANDS` tables below, which are the single source of truth for the
//! dashboard, the API and the chat bot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// AQI bands, ordered from cleanest to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[serde(rename = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    #[serde(rename = "Hazardous")]
    Hazardous,
}

/// Health risk bands, ordered from lowest to highest risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HriCategory {
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

/// Inclusive upper bounds: a value belongs to the first band whose bound it
/// does not exceed. Anything above the last bound is `Hazardous`.
pub const AQI_BANDS: [(f64, AqiCategory); 5] = [
    (50.0, AqiCategory::Good),
    (100.0, AqiCategory::Moderate),
    (150.0, AqiCategory::UnhealthyForSensitiveGroups),
    (200.0, AqiCategory::Unhealthy),
    (300.0, AqiCategory::VeryUnhealthy),
];

/// Exclusive upper bounds: a value belongs to the first band whose bound it
/// is strictly below. Anything else is `VeryHigh`.
pub const HRI_BANDS: [(f64, HriCategory); 3] = [
    (1.55, HriCategory::Low),
    (3.09, HriCategory::Moderate),
    (4.64, HriCategory::High),
];

/// Fallback text for labels with no table entry
pub const UNKNOWN_CATEGORY_MESSAGE: &str = "No information available for this category.";

/// Classify an AQI value. NaN falls through to `Hazardous`.
#[must_use]
pub fn classify_aqi(value: f64) -> AqiCategory {
    AQI_BANDS
        .iter()
        .find(|(upper, _)| value <= *upper)
        .map_or(AqiCategory::Hazardous, |(_, category)| *category)
}

/// Classify an HRI value. NaN falls through to `VeryHigh`.
#[must_use]
pub fn classify_hri(value: f64) -> HriCategory {
    HRI_BANDS
        .iter()
        .find(|(upper, _)| value < *upper)
        .map_or(HriCategory::VeryHigh, |(_, category)| *category)
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    /// Public health status line for this band
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            AqiCategory::Good => {
                "Air quality is satisfactory, and air pollution poses little or no risk."
            }
            AqiCategory::Moderate => {
                "Air quality is acceptable. However, there may be a risk for some people, particularly those who are unusually sensitive to air pollution."
            }
            AqiCategory::UnhealthyForSensitiveGroups => {
                "Members of sensitive groups may experience health effects. The general public is less likely to be affected."
            }
            AqiCategory::Unhealthy => {
                "Some members of the general public may experience health effects; members of sensitive groups may experience more serious health effects."
            }
            AqiCategory::VeryUnhealthy => {
                "Health alert: The risk of health effects is increased for everyone."
            }
            AqiCategory::Hazardous => {
                "Health warning of emergency conditions: everyone is more likely to be affected."
            }
        }
    }

    /// Display colour (hex RGB)
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            AqiCategory::Good => "#4CAF50",
            AqiCategory::Moderate => "#CDDC39",
            AqiCategory::UnhealthyForSensitiveGroups => "#FFC107",
            AqiCategory::Unhealthy => "#FF9800",
            AqiCategory::VeryUnhealthy => "#F44336",
            AqiCategory::Hazardous => "#9C27B0",
        }
    }
}

impl HriCategory {
    pub const ALL: [HriCategory; 4] = [
        HriCategory::Low,
        HriCategory::Moderate,
        HriCategory::High,
        HriCategory::VeryHigh,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            HriCategory::Low => "Low",
            HriCategory::Moderate => "Moderate",
            HriCategory::High => "High",
            HriCategory::VeryHigh => "Very High",
        }
    }

    /// Short risk description
    #[must_use]
    pub fn risk(self) -> &'static str {
        match self {
            HriCategory::Low => "Low health risk.",
            HriCategory::Moderate => "Moderate health risk.",
            HriCategory::High => "High health risk.",
            HriCategory::VeryHigh => "Severe health risk.",
        }
    }

    /// Advice shown alongside the risk description
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            HriCategory::Low => {
                "Air quality is good. Continue with normal outdoor activities but follow general health guidelines."
            }
            HriCategory::Moderate => {
                "Individuals with respiratory or heart conditions should be cautious. Consider limiting prolonged outdoor activities."
            }
            HriCategory::High => {
                "There is a high risk of respiratory and cardiovascular issues such as asthma and heart disease. Preventive measures include: purchasing high quality masks and air purifiers, and covering your face while going outside."
            }
            HriCategory::VeryHigh => {
                "Air quality is very poor! Everyone should take precautions. Avoid going outside, use high-quality masks, and consider air purifiers indoors."
            }
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            HriCategory::Low => "#4CAF50",
            HriCategory::Moderate => "#FFC107",
            HriCategory::High => "#F44336",
            HriCategory::VeryHigh => "#9C27B0",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for HriCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label did not name any known band
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for AqiCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AqiCategory::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl FromStr for HriCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HriCategory::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// AQI status message keyed by category label
#[must_use]
pub fn aqi_message_for(label: &str) -> &'static str {
    label
        .parse::<AqiCategory>()
        .map_or(UNKNOWN_CATEGORY_MESSAGE, AqiCategory::message)
}

/// HRI `(risk, message)` pair keyed by category label
#[must_use]
pub fn risk_info_for(label: &str) -> Option<(&'static str, &'static str)> {
    label
        .parse::<HriCategory>()
        .ok()
        .map(|c| (c.risk(), c.message()))
}
