//! Error types and handling for the `VitalAir` application

use thiserror::Error;

use crate::forecast::QueryError;

/// Main error type for the `VitalAir` application
#[derive(Error, Debug)]
pub enum VitalAirError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Forecast dataset loading errors
    #[error("Data error: {message}")]
    Data { message: String },

    /// Chat bot transport errors
    #[error("Bot error: {message}")]
    Bot { message: String },

    /// A user query that could not be answered
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl VitalAirError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new dataset error
    pub fn data<S: Into<String>>(message: S) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Create a new bot transport error
    pub fn bot<S: Into<String>>(message: S) -> Self {
        Self::Bot {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            VitalAirError::Config { .. } => {
                "Configuration error. Please check your config file and environment variables."
                    .to_string()
            }
            VitalAirError::Data { .. } => {
                "Sorry, forecast data is currently unavailable. Please try again later.".to_string()
            }
            VitalAirError::Bot { .. } => {
                "Unable to reach the chat service. Please check your internet connection."
                    .to_string()
            }
            VitalAirError::Query(err) => err.to_string(),
        }
    }
}

impl From<csv::Error> for VitalAirError {
    fn from(err: csv::Error) -> Self {
        VitalAirError::data(format!("Failed to read forecast CSV: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = VitalAirError::config("missing token");
        assert!(matches!(config_err, VitalAirError::Config { .. }));

        let data_err = VitalAirError::data("missing column");
        assert!(matches!(data_err, VitalAirError::Data { .. }));

        let bot_err = VitalAirError::bot("connection failed");
        assert!(matches!(bot_err, VitalAirError::Bot { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = VitalAirError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let data_err = VitalAirError::data("test");
        assert!(data_err.user_message().contains("forecast data is currently unavailable"));
    }

    #[test]
    fn test_query_error_passes_through_user_text() {
        let err: VitalAirError = QueryError::BadFormat.into();
        assert!(err.user_message().starts_with("Please use the format"));
        assert_eq!(err.to_string(), QueryError::BadFormat.to_string());
    }

    #[test]
    fn test_csv_error_is_a_data_error() {
        let mut reader = csv::Reader::from_reader("a,b\n1,2,3\n".as_bytes());
        let err: VitalAirError = reader.records().next().unwrap().unwrap_err().into();
        assert!(matches!(err, VitalAirError::Data { .. }));
    }
}
