//! Forecast query core
//!
//! Pure, synchronous functions shared by the dashboard, the HTTP API and the
//! chat bot:
//! - Query parsing of `<Location> <DD-MM-YYYY>` text
//! - AQI / HRI band classification with fixed breakpoints
//! - Exact location/date lookup against a forecast store

pub mod classifier;
pub mod error;
pub mod lookup;
pub mod query;

pub use classifier::{
    AQI_BANDS, AqiCategory, HRI_BANDS, HriCategory, aqi_message_for, classify_aqi, classify_hri,
    risk_info_for,
};
pub use error::QueryError;
pub use lookup::{ForecastReport, answer_query, lookup_forecast};
pub use query::{Query, parse_query};
