//! Lookup, classification and rendering checks over every fixture row

use std::path::PathBuf;

use vitalair::bot::handle_message;
use vitalair::forecast::query::USER_DATE_FORMAT;
use vitalair::{
    DashboardRequest, ForecastDataset, ForecastDuration, ForecastReport, ForecastStore, Query,
    build_dashboard, lookup_forecast,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn dataset() -> ForecastDataset {
    ForecastDataset::from_csv_paths(&fixture("aqi.csv"), &fixture("hri.csv")).unwrap()
}

/// Every (location, date) pair the fixtures carry in either file
fn fixture_pairs(store: &ForecastDataset) -> Vec<Query> {
    let mut pairs = Vec::new();
    for location in store.all_locations() {
        let mut dates: Vec<_> = store
            .aqi_series(&location)
            .into_iter()
            .chain(store.hri_series(&location))
            .map(|p| p.date)
            .collect();
        dates.sort();
        dates.dedup();
        pairs.extend(dates.into_iter().map(|date| Query::new(location.clone(), date)));
    }
    pairs
}

#[test]
fn test_lookup_and_classification_are_repeatable() {
    let store = dataset();
    let pairs = fixture_pairs(&store);
    assert_eq!(pairs.len(), 7);

    for query in &pairs {
        let first = lookup_forecast(query, &store).map(ForecastReport::from_record);
        for _ in 0..5 {
            let again = lookup_forecast(query, &store).map(ForecastReport::from_record);
            assert_eq!(again, first, "{query}");
        }
    }
}

#[test]
fn test_bot_and_dashboard_agree_on_categories() {
    let store = dataset();
    let mut checked = 0;

    for query in fixture_pairs(&store) {
        let Ok(record) = lookup_forecast(&query, &store) else {
            continue;
        };
        let report = ForecastReport::from_record(record);

        let view = build_dashboard(
            &store,
            &DashboardRequest {
                location: Some(query.location.clone()),
                date: Some(query.date),
                duration: ForecastDuration::default(),
            },
        )
        .unwrap();
        assert_eq!(view.aqi.category, Some(report.aqi_category), "{query}");
        assert_eq!(view.hri.category, Some(report.hri_category), "{query}");
        assert_eq!(view.aqi.value, Some(report.record.display_aqi()), "{query}");
        assert_eq!(view.hri.value, Some(report.record.display_hri()), "{query}");

        let text = format!("{} {}", query.location, query.date.format(USER_DATE_FORMAT));
        let reply = handle_message(&text, &store);
        assert!(reply.contains(&format!("🔹 Category: {}\n", report.aqi_category)), "{reply}");
        assert!(reply.contains(&format!("🔹 Risk Level: {}\n", report.hri_category)), "{reply}");
        checked += 1;
    }

    assert_eq!(checked, 7);
}

#[test]
fn test_rounding_boundary_row() {
    let store = dataset();
    let reply = handle_message("Crescent_chengalpattu 02-01-2025", &store);
    assert!(reply.contains("(AQI): 50.0\n🔹 Category: Good\n"));
    assert!(reply.contains("(HRI): 1.55\n🔹 Risk Level: Moderate\n"));
}
