//! Query failures shared by the bot, the API and the CLI

use chrono::NaiveDate;
use thiserror::Error;

/// Reasons a location/date query cannot be answered.
///
/// Every variant is recoverable; the `Display` text is what the chat bot
/// sends back to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Please use the format: <Location> <DD-MM-YYYY>\nFor example: 'Alandur 31-12-2024'")]
    BadFormat,

    #[error("Invalid date format. Please use DD-MM-YYYY format, e.g., '31-12-2024'")]
    BadDate { input: String },

    #[error("Location '{location}' not found. Available locations: {}", .available.join(", "))]
    LocationNotFound {
        location: String,
        /// Every known location, sorted ascending.
        available: Vec<String>,
    },

    #[error("Sorry, no forecast data available for {location} on {date}.")]
    NoDataForDate { location: String, date: NaiveDate },
}

impl QueryError {
    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::BadFormat => "BAD_FORMAT",
            QueryError::BadDate { .. } => "BAD_DATE",
            QueryError::LocationNotFound { .. } => "LOCATION_NOT_FOUND",
            QueryError::NoDataForDate { .. } => "NO_DATA_FOR_DATE",
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
