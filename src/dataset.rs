//! Forecast dataset store
//!
//! Loads the precomputed AQI and HRI forecast CSV files into memory and
//! answers exact (location, date) lookups. [`ReloadingDataset`] picks up
//! new forecast files without a restart.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::models::{ForecastRecord, SeriesPoint};
use crate::{Result, VitalAirError};

/// Rows whose file has no `Location` column are filed under this name
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Read access to precomputed forecasts
pub trait ForecastStore: Send + Sync {
    /// Record for an exact location and date, if both metrics are present
    fn lookup(&self, location: &str, date: NaiveDate) -> Option<ForecastRecord>;

    /// Every location present in either dataset
    fn all_locations(&self) -> BTreeSet<String>;

    /// Date-ordered AQI forecast for a location
    fn aqi_series(&self, location: &str) -> Vec<SeriesPoint>;

    /// Date-ordered HRI forecast for a location
    fn hri_series(&self, location: &str) -> Vec<SeriesPoint>;

    /// Bring the data up to date with its source. Stores without a
    /// backing source are always current.
    fn refresh(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct AqiRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Location")]
    location: Option<String>,
    #[serde(rename = "AQI_Forecast")]
    aqi_forecast: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HriRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Location")]
    location: Option<String>,
    #[serde(rename = "HRI")]
    hri: Option<f64>,
}

type Series = BTreeMap<String, BTreeMap<NaiveDate, f64>>;

/// In-memory AQI and HRI forecasts, keyed by location then date
#[derive(Debug, Default, Clone)]
pub struct ForecastDataset {
    aqi: Series,
    hri: Series,
}

impl ForecastDataset {
    /// Load both CSV files from disk
    #[instrument]
    pub fn from_csv_paths(aqi_path: &Path, hri_path: &Path) -> Result<Self> {
        let aqi_file = File::open(aqi_path).map_err(|e| {
            VitalAirError::data(format!("Cannot open {}: {e}", aqi_path.display()))
        })?;
        let hri_file = File::open(hri_path).map_err(|e| {
            VitalAirError::data(format!("Cannot open {}: {e}", hri_path.display()))
        })?;

        let dataset = Self::from_readers(aqi_file, hri_file)?;
        info!(
            "Loaded forecasts for {} locations ({} AQI rows, {} HRI rows)",
            dataset.all_locations().len(),
            dataset.aqi.values().map(BTreeMap::len).sum::<usize>(),
            dataset.hri.values().map(BTreeMap::len).sum::<usize>(),
        );
        Ok(dataset)
    }

    /// Load both datasets from CSV readers
    pub fn from_readers<A: Read, H: Read>(aqi: A, hri: H) -> Result<Self> {
        let mut dataset = Self::default();

        let mut reader = csv::Reader::from_reader(aqi);
        require_date_column(&mut reader, "AQI")?;
        for (index, row) in reader.deserialize().enumerate() {
            let row: AqiRow = row?;
            let Some(value) = row.aqi_forecast else {
                warn!("Skipping AQI row {} without a forecast value", index + 2);
                continue;
            };
            let date = parse_dataset_date(&row.date)?;
            let location = row.location.unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
            dataset.insert_aqi(location, date, value);
        }

        let mut reader = csv::Reader::from_reader(hri);
        require_date_column(&mut reader, "HRI")?;
        for (index, row) in reader.deserialize().enumerate() {
            let row: HriRow = row?;
            let Some(value) = row.hri else {
                warn!("Skipping HRI row {} without a forecast value", index + 2);
                continue;
            };
            let date = parse_dataset_date(&row.date)?;
            let location = row.location.unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
            dataset.insert_hri(location, date, value);
        }

        Ok(dataset)
    }

    /// Add an AQI value. The first value for a location and date wins.
    pub fn insert_aqi(&mut self, location: impl Into<String>, date: NaiveDate, value: f64) {
        insert_first(&mut self.aqi, location.into(), date, value);
    }

    /// Add an HRI value. The first value for a location and date wins.
    pub fn insert_hri(&mut self, location: impl Into<String>, date: NaiveDate, value: f64) {
        insert_first(&mut self.hri, location.into(), date, value);
    }
}

fn insert_first(series: &mut Series, location: String, date: NaiveDate, value: f64) {
    let days = series.entry(location).or_default();
    if days.contains_key(&date) {
        debug!(%date, "Ignoring duplicate forecast row");
        return;
    }
    days.insert(date, value);
}

impl ForecastStore for ForecastDataset {
    fn lookup(&self, location: &str, date: NaiveDate) -> Option<ForecastRecord> {
        let aqi = self.aqi.get(location)?.get(&date)?;
        let hri = self.hri.get(location)?.get(&date)?;
        debug!(location, %date, "Forecast row found");
        Some(ForecastRecord::new(location, date, *aqi, *hri))
    }

    fn all_locations(&self) -> BTreeSet<String> {
        self.aqi.keys().chain(self.hri.keys()).cloned().collect()
    }

    fn aqi_series(&self, location: &str) -> Vec<SeriesPoint> {
        to_points(self.aqi.get(location))
    }

    fn hri_series(&self, location: &str) -> Vec<SeriesPoint> {
        to_points(self.hri.get(location))
    }
}

/// Modification times of both forecast files
type FileStamp = (SystemTime, SystemTime);

struct Snapshot {
    dataset: Arc<ForecastDataset>,
    stamp: Option<FileStamp>,
}

/// CSV-backed store that reloads whenever either file changes on disk.
///
/// A failed reload leaves the previous forecasts in place and reports the
/// error from [`ForecastStore::refresh`] until the files are readable again.
pub struct ReloadingDataset {
    aqi_path: PathBuf,
    hri_path: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl ReloadingDataset {
    /// Create an empty store; the first [`ForecastStore::refresh`] loads it
    #[must_use]
    pub fn new(aqi_path: impl Into<PathBuf>, hri_path: impl Into<PathBuf>) -> Self {
        Self {
            aqi_path: aqi_path.into(),
            hri_path: hri_path.into(),
            snapshot: RwLock::new(Snapshot {
                dataset: Arc::new(ForecastDataset::default()),
                stamp: None,
            }),
        }
    }

    fn current(&self) -> Arc<ForecastDataset> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .dataset
            .clone()
    }

    fn file_stamp(&self) -> Result<FileStamp> {
        let modified = |path: &Path| {
            fs::metadata(path).and_then(|m| m.modified()).map_err(|e| {
                VitalAirError::data(format!("Cannot read {}: {e}", path.display()))
            })
        };
        Ok((modified(&self.aqi_path)?, modified(&self.hri_path)?))
    }
}

impl ForecastStore for ReloadingDataset {
    fn lookup(&self, location: &str, date: NaiveDate) -> Option<ForecastRecord> {
        self.current().lookup(location, date)
    }

    fn all_locations(&self) -> BTreeSet<String> {
        self.current().all_locations()
    }

    fn aqi_series(&self, location: &str) -> Vec<SeriesPoint> {
        self.current().aqi_series(location)
    }

    fn hri_series(&self, location: &str) -> Vec<SeriesPoint> {
        self.current().hri_series(location)
    }

    fn refresh(&self) -> Result<()> {
        let stamp = self.file_stamp()?;
        let loaded = self
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .stamp;
        if loaded == Some(stamp) {
            return Ok(());
        }

        let dataset = ForecastDataset::from_csv_paths(&self.aqi_path, &self.hri_path)?;
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.dataset = Arc::new(dataset);
        snapshot.stamp = Some(stamp);
        if loaded.is_some() {
            info!("Forecast files changed, reloaded");
        }
        Ok(())
    }
}

fn to_points(series: Option<&BTreeMap<NaiveDate, f64>>) -> Vec<SeriesPoint> {
    series
        .map(|s| {
            s.iter()
                .map(|(date, value)| SeriesPoint {
                    date: *date,
                    value: *value,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn require_date_column<R: Read>(reader: &mut csv::Reader<R>, dataset: &str) -> Result<()> {
    if reader.headers()?.iter().any(|h| h == "Date") {
        Ok(())
    } else {
        Err(VitalAirError::data(format!(
            "{dataset} CSV file does not contain a Date column."
        )))
    }
}

/// Normalise a dataset `Date` cell to a calendar day
pub fn parse_dataset_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }

    Err(VitalAirError::data(format!(
        "Unrecognised date '{value}' in forecast data"
    )))
}
