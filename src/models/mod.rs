//! Data models for the VitalAir application
//!
//! - Forecast: one precomputed (location, date) row and chart series points

pub mod forecast;

pub use forecast::{ForecastRecord, SeriesPoint};
