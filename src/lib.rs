//! `VitalAir` - Air quality and health risk forecasts for Tamil Nadu
//!
//! This library loads precomputed AQI and HRI forecasts and serves them
//! through a web dashboard API and a Telegram chat bot.

pub mod api;
pub mod bot;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod forecast;
pub mod models;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use config::VitalAirConfig;
pub use dashboard::{DashboardRequest, DashboardView, ForecastDuration, build_dashboard};
pub use dataset::{ForecastDataset, ForecastStore, ReloadingDataset};
pub use error::VitalAirError;
pub use forecast::{
    AqiCategory, ForecastReport, HriCategory, Query, QueryError, answer_query, classify_aqi,
    classify_hri, lookup_forecast, parse_query,
};
pub use models::{ForecastRecord, SeriesPoint};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, VitalAirError>;
