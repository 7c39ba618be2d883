//! Batch results to CSV: one `hourly.csv` row per solved slot and one
//! `daily.csv` row per day, failed days included.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::{BatchReport, DayResult, Room};

pub const HOURLY_FILE: &str = "hourly.csv";
pub const DAILY_FILE: &str = "daily.csv";

pub const DAILY_COLUMNS: [&str; 4] = ["day", "status", "total_cost", "error"];

pub const HOURLY_COLUMNS: [&str; 11] = [
    "day",
    "hour",
    "price",
    "occupancy_room1",
    "occupancy_room2",
    "temp_room1",
    "temp_room2",
    "heater_room1",
    "heater_room2",
    "ventilation",
    "humidity",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRow {
    pub day: usize,
    pub hour: usize,
    pub price: f64,
    pub occupancy_room1: f64,
    pub occupancy_room2: f64,
    pub temp_room1: f64,
    pub temp_room2: f64,
    pub heater_room1: f64,
    pub heater_room2: f64,
    pub ventilation: f64,
    pub humidity: f64,
}

impl HourlyRow {
    pub fn from_day(result: &DayResult) -> Vec<Self> {
        result
            .hours
            .iter()
            .map(|h| Self {
                day: result.day,
                hour: h.hour,
                price: h.price,
                occupancy_room1: h.occupancy[Room::One],
                occupancy_room2: h.occupancy[Room::Two],
                temp_room1: h.temperature[Room::One],
                temp_room2: h.temperature[Room::Two],
                heater_room1: h.heater_power[Room::One],
                heater_room2: h.heater_power[Room::Two],
                ventilation: h.ventilation,
                humidity: h.humidity,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub day: usize,
    /// `solved`, or the error kind of a failed day
    pub status: String,
    pub total_cost: Option<f64>,
    pub error: Option<String>,
}

/// Writes a [`BatchReport`] into an output directory.
#[derive(Debug, Clone)]
pub struct CsvResultSink {
    dir: PathBuf,
}

impl CsvResultSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn hourly_path(&self) -> PathBuf {
        self.dir.join(HOURLY_FILE)
    }

    pub fn daily_path(&self) -> PathBuf {
        self.dir.join(DAILY_FILE)
    }

    pub fn write_report(&self, report: &BatchReport) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory {}", self.dir.display()))?;

        let mut hourly = open_writer(&self.hourly_path(), &HOURLY_COLUMNS)?;
        for result in report.solved() {
            for row in HourlyRow::from_day(result) {
                hourly.serialize(row)?;
            }
        }
        hourly.flush().context("Failed to flush hourly results")?;

        let mut daily = open_writer(&self.daily_path(), &DAILY_COLUMNS)?;
        for (&day, outcome) in &report.days {
            let row = match outcome {
                Ok(result) => DailyRow {
                    day,
                    status: "solved".into(),
                    total_cost: Some(result.total_cost),
                    error: None,
                },
                Err(e) => DailyRow {
                    day,
                    status: e.kind().into(),
                    total_cost: None,
                    error: Some(e.to_string()),
                },
            };
            daily.serialize(row)?;
        }
        daily.flush().context("Failed to flush daily results")?;

        info!(dir = %self.dir.display(), days = report.days.len(), "results written");
        Ok(())
    }
}

/// CSV writer with `columns` already written, also for an empty report.
fn open_writer(path: &Path, columns: &[&str]) -> Result<csv::Writer<fs::File>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(columns)?;
    Ok(writer)
}

pub fn read_hourly(path: &Path) -> Result<Vec<HourlyRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    reader
        .deserialize()
        .map(|row| row.with_context(|| format!("Failed to read row of {}", path.display())))
        .collect()
}

pub fn read_daily(path: &Path) -> Result<Vec<DailyRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    reader
        .deserialize()
        .map(|row| row.with_context(|| format!("Failed to read row of {}", path.display())))
        .collect()
}
