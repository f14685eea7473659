//! Chat bot
//!
//! Replies to `<Location> <DD-MM-YYYY>` messages with the AQI and HRI
//! forecast for that day. The transport (Telegram) and the polling loop live
//! in submodules; everything here is plain text in, plain text out.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use crate::dataset::ForecastStore;
use crate::forecast::query::USER_DATE_FORMAT;
use crate::forecast::{ForecastReport, answer_query};
use crate::{Result, VitalAirError};

pub mod runner;
pub mod telegram;

pub use runner::BotHandle;
pub use telegram::TelegramClient;

/// An incoming text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub text: String,
}

/// Result of one poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollBatch {
    /// Offset acknowledging everything in this batch, if anything arrived
    pub next_offset: Option<i64>,
    /// Text messages only; other updates are acknowledged and dropped
    pub messages: Vec<IncomingMessage>,
}

/// A chat service the bot can poll and reply through
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Wait up to `timeout_seconds` for updates with id >= `offset`
    async fn poll(&self, offset: i64, timeout_seconds: u32) -> Result<PollBatch>;

    async fn send(&self, chat_id: i64, text: &str) -> Result<()>;
}

pub const WELCOME_TEXT: &str = "Welcome to VitalAir Forecast Bot! 👋\n\n\
I can provide you with Air Quality Index (AQI) and Health Risk Index (HRI) forecasts for various locations in Tamil Nadu.\n\n\
To get a forecast, send a message in this format:\n\
<Location> <DD-MM-YYYY>\n\n\
For example: 'Alandur 31-12-2024'";

/// Help text, listing the locations the store knows about
#[must_use]
pub fn help_text<S: ForecastStore + ?Sized>(store: &S) -> String {
    let locations: Vec<String> = store.all_locations().into_iter().collect();
    let mut text = String::from(
        "VitalAir Bot Help 🆘\n\n\
To get an air quality and health risk forecast, send a message in this format:\n\
<Location> <DD-MM-YYYY>\n\n\
For example: 'Alandur 31-12-2024'",
    );
    if !locations.is_empty() {
        text.push_str("\n\nAvailable locations include: ");
        text.push_str(&locations.join(", "));
        text.push('.');
    }
    text
}

/// Reply to any incoming text. Unknown `/commands` get no reply.
#[must_use]
pub fn reply_for<S: ForecastStore + ?Sized>(text: &str, store: &S) -> Option<String> {
    let trimmed = text.trim();
    if let Some(command) = trimmed.strip_prefix('/') {
        // "/help@VitalAirBot extra" -> "help"
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default();
        return match name {
            "start" => Some(WELCOME_TEXT.to_string()),
            "help" => Some(help_text(store)),
            _ => None,
        };
    }
    Some(handle_message(trimmed, store))
}

/// Answer a query against freshly refreshed data
pub fn answer<S: ForecastStore + ?Sized>(text: &str, store: &S) -> Result<ForecastReport> {
    store.refresh()?;
    Ok(answer_query(text, store)?)
}

/// Answer a location/date query, or explain why it cannot be answered
#[must_use]
pub fn handle_message<S: ForecastStore + ?Sized>(text: &str, store: &S) -> String {
    match answer(text, store) {
        Ok(report) => format_report(&report),
        Err(err) => {
            if !matches!(err, VitalAirError::Query(_)) {
                warn!("Cannot answer '{text}': {err}");
            }
            err.user_message()
        }
    }
}

/// Render a report the way the bot sends it
#[must_use]
pub fn format_report(report: &ForecastReport) -> String {
    let record = &report.record;
    format!(
        "📊 Air Quality & Health Risk Forecast 📊\n\n\
📍 Location: {location}\n\
📅 Date: {date}\n\n\
🌬️ Air Quality Index (AQI): {aqi}\n\
🔹 Category: {aqi_category}\n\
🔹 Status: {aqi_message}\n\n\
⚠️ Health Risk Index (HRI): {hri}\n\
🔹 Risk Level: {hri_category}\n",
        location = record.location,
        date = display_date(record.date),
        aqi = display_number(record.display_aqi()),
        aqi_category = report.aqi_category,
        aqi_message = report.aqi_message,
        hri = display_number(record.display_hri()),
        hri_category = report.hri_category,
    )
}

fn display_date(date: NaiveDate) -> String {
    date.format(USER_DATE_FORMAT).to_string()
}

/// Whole numbers keep one decimal place: `50.0`, `87.46`
fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ForecastDataset;

    fn store() -> ForecastDataset {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let mut dataset = ForecastDataset::default();
        dataset.insert_aqi("Alandur", date, 87.456_7);
        dataset.insert_hri("Alandur", date, 2.123_456);
        dataset.insert_aqi("Crescent_chengalpattu", date, 20.0);
        dataset.insert_hri("Crescent_chengalpattu", date, 0.5);
        dataset
    }

    #[test]
    fn test_forecast_reply() {
        let reply = handle_message("Alandur 31-12-2024", &store());
        assert!(reply.starts_with("📊 Air Quality & Health Risk Forecast 📊"));
        assert!(reply.contains("📍 Location: Alandur\n"));
        assert!(reply.contains("📅 Date: 31-12-2024\n"));
        assert!(reply.contains("(AQI): 87.46\n"));
        assert!(reply.contains("🔹 Category: Moderate\n"));
        assert!(reply.contains("(HRI): 2.1235\n"));
        assert!(reply.contains("🔹 Risk Level: Moderate\n"));
    }

    #[test]
    fn test_error_replies() {
        let store = store();
        assert!(handle_message("Alandur 2024-12-31", &store).starts_with("Please use the format"));
        assert!(handle_message("Alandur 31-02-2024", &store).starts_with("Invalid date format"));
        assert_eq!(
            handle_message("Atlantis 31-12-2024", &store),
            "Location 'Atlantis' not found. Available locations: Alandur, Crescent_chengalpattu"
        );
        assert_eq!(
            handle_message("Alandur 01-01-2025", &store),
            "Sorry, no forecast data available for Alandur on 2025-01-01."
        );
    }

    #[test]
    fn test_whole_numbers_keep_a_decimal() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let mut dataset = ForecastDataset::default();
        dataset.insert_aqi("Salem", date, 50.0);
        dataset.insert_hri("Salem", date, 2.0);
        let reply = handle_message("Salem 31-12-2024", &dataset);
        assert!(reply.contains("(AQI): 50.0\n"));
        assert!(reply.contains("(HRI): 2.0\n"));
    }

    #[test]
    fn test_category_matches_displayed_value() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let mut dataset = ForecastDataset::default();
        dataset.insert_aqi("Salem", date, 50.004);
        dataset.insert_hri("Salem", date, 1.549_96);
        let reply = handle_message("Salem 31-12-2024", &dataset);
        assert!(reply.contains("(AQI): 50.0\n🔹 Category: Good\n"));
        assert!(reply.contains("(HRI): 1.55\n🔹 Risk Level: Moderate\n"));
    }

    struct UnavailableStore;

    impl ForecastStore for UnavailableStore {
        fn lookup(&self, _: &str, _: NaiveDate) -> Option<crate::models::ForecastRecord> {
            None
        }

        fn all_locations(&self) -> std::collections::BTreeSet<String> {
            std::collections::BTreeSet::new()
        }

        fn aqi_series(&self, _: &str) -> Vec<crate::models::SeriesPoint> {
            Vec::new()
        }

        fn hri_series(&self, _: &str) -> Vec<crate::models::SeriesPoint> {
            Vec::new()
        }

        fn refresh(&self) -> Result<()> {
            Err(VitalAirError::data("AQI CSV file does not contain a Date column."))
        }
    }

    #[test]
    fn test_unavailable_data_gets_apology() {
        assert_eq!(
            handle_message("Alandur 31-12-2024", &UnavailableStore),
            "Sorry, forecast data is currently unavailable. Please try again later."
        );
    }

    #[test]
    fn test_commands() {
        let store = store();
        assert_eq!(reply_for("/start", &store).as_deref(), Some(WELCOME_TEXT));
        let help = reply_for("/help@VitalAirBot", &store).unwrap();
        assert!(help.contains("Available locations include: Alandur, Crescent_chengalpattu."));
        assert!(reply_for("/settings", &store).is_none());
    }

    #[test]
    fn test_plain_text_goes_to_query_handler() {
        let reply = reply_for("  Crescent_chengalpattu 31-12-2024 ", &store()).unwrap();
        assert!(reply.contains("Location: Crescent_chengalpattu"));
        assert!(reply.contains("Category: Good"));
    }
}
