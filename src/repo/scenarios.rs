//! Scenario-days from CSV.
//!
//! Three files (price, room 1 occupancy, room 2 occupancy), each with a
//! header row. Every data row is one day and every column one hour. Row
//! lengths are not checked here; a day with the wrong number of hours is
//! rejected by the scheduler with an input-shape error for that day only.

use anyhow::{bail, ensure, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::ScenarioInput;

#[derive(Debug, Clone)]
pub struct CsvScenarioSource {
    pub prices: PathBuf,
    pub occupancy_room1: PathBuf,
    pub occupancy_room2: PathBuf,
    /// Leading columns of every row that are not hourly values (e.g. a date).
    pub index_columns: usize,
}

impl CsvScenarioSource {
    pub fn new(
        prices: impl Into<PathBuf>,
        occupancy_room1: impl Into<PathBuf>,
        occupancy_room2: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prices: prices.into(),
            occupancy_room1: occupancy_room1.into(),
            occupancy_room2: occupancy_room2.into(),
            index_columns: 0,
        }
    }

    pub fn with_index_columns(mut self, index_columns: usize) -> Self {
        self.index_columns = index_columns;
        self
    }

    /// Every day of the three files, in row order.
    pub fn load_all(&self) -> Result<Vec<ScenarioInput>> {
        let price = read_rows(&self.prices, self.index_columns)?;
        let occ1 = read_rows(&self.occupancy_room1, self.index_columns)?;
        let occ2 = read_rows(&self.occupancy_room2, self.index_columns)?;

        ensure!(
            price.len() == occ1.len() && price.len() == occ2.len(),
            "scenario files disagree on the number of days: {} has {}, {} has {}, {} has {}",
            self.prices.display(),
            price.len(),
            self.occupancy_room1.display(),
            occ1.len(),
            self.occupancy_room2.display(),
            occ2.len(),
        );

        let scenarios: Vec<ScenarioInput> = price
            .into_iter()
            .zip(occ1)
            .zip(occ2)
            .enumerate()
            .map(|(day, ((price, occ1), occ2))| ScenarioInput::new(day, price, occ1, occ2))
            .collect();

        debug!(days = scenarios.len(), "scenarios loaded");
        Ok(scenarios)
    }

    pub fn load_day(&self, day: usize) -> Result<ScenarioInput> {
        let mut all = self.load_all()?;
        if day >= all.len() {
            bail!("day {day} out of range, the scenario files hold {} days", all.len());
        }
        Ok(all.swap_remove(day))
    }
}

fn read_rows(path: &Path, index_columns: usize) -> Result<Vec<Vec<f64>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open scenario file {}", path.display()))?;

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Failed to read row {row} of {}", path.display()))?;
        let fields: Vec<&str> = record.iter().skip(index_columns).collect();
        // a trailing comma leaves empty cells at the end of the row only
        let len = fields.iter().rposition(|field| !field.is_empty()).map_or(0, |i| i + 1);
        let values = fields[..len]
            .iter()
            .enumerate()
            .map(|(hour, field)| {
                if field.is_empty() {
                    bail!("row {row} of {}: hour {hour} is empty", path.display());
                }
                field.parse::<f64>().with_context(|| {
                    format!("row {row} of {}: `{field}` is not a number", path.display())
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(values);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Room;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn source(dir: &TempDir, price: &str, occ1: &str, occ2: &str) -> CsvScenarioSource {
        CsvScenarioSource::new(
            write(dir, "price.csv", price),
            write(dir, "occ1.csv", occ1),
            write(dir, "occ2.csv", occ2),
        )
    }

    #[test]
    fn test_rows_become_days() {
        let dir = TempDir::new().unwrap();
        let src = source(
            &dir,
            "h0,h1,h2\n1.0,2.0,3.0\n4,5,6\n",
            "h0,h1,h2\n0,10,0\n1,1,1\n",
            "h0,h1,h2\n5,5,5\n0,0,0\n",
        );

        let days = src.load_all().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, 0);
        assert_eq!(days[0].price, vec![1.0, 2.0, 3.0]);
        assert_eq!(days[1].price, vec![4.0, 5.0, 6.0]);
        assert_eq!(days[0].total_occupancy(1), 15.0);
    }

    #[test]
    fn test_short_row_is_loaded_as_is() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir, "a,b,c\n1,2\n", "a,b,c\n0,0,0\n", "a,b,c\n0,0,0\n");

        let day = src.load_day(0).unwrap();
        assert_eq!(day.price.len(), 2);
        assert!(day.check_shape(3).is_err());
    }

    #[test]
    fn test_blank_cell_inside_row_is_an_error() {
        let dir = TempDir::new().unwrap();
        let header = "h0,h1,h2,h3,h4,h5,h6,h7,h8,h9,h10\n";
        let src = source(
            &dir,
            &format!("{header}1,2,,4,5,6,7,8,9,10,11\n"),
            &format!("{header}0,0,0,0,0,0,0,0,0,0\n"),
            &format!("{header}0,0,0,0,0,0,0,0,0,0\n"),
        );

        let err = format!("{:#}", src.load_all().unwrap_err());
        assert!(err.contains("row 0"), "{err}");
        assert!(err.contains("hour 2 is empty"), "{err}");
    }

    #[test]
    fn test_trailing_comma_is_ignored() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir, "a,b,c,d\n1,2,3,\n", "a,b,c\n0,0,0\n", "a,b,c\n0,0,0\n");

        let day = src.load_day(0).unwrap();
        assert_eq!(day.price, vec![1.0, 2.0, 3.0]);
        assert!(day.check_shape(3).is_ok());
    }

    #[test]
    fn test_index_columns_are_skipped() {
        let dir = TempDir::new().unwrap();
        let src = source(
            &dir,
            "date,h0,h1\n2024-01-01,1,2\n",
            "date,h0,h1\n2024-01-01,3,4\n",
            "date,h0,h1\n2024-01-01,5,6\n",
        )
        .with_index_columns(1);

        let day = src.load_day(0).unwrap();
        assert_eq!(day.price, vec![1.0, 2.0]);
        assert_eq!(day.occupancy(Room::Two), &[5.0, 6.0]);
    }

    #[test]
    fn test_row_count_mismatch_is_an_error() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir, "a\n1\n2\n", "a\n1\n", "a\n1\n2\n");

        let err = src.load_all().unwrap_err();
        assert!(err.to_string().contains("disagree on the number of days"));
    }

    #[test]
    fn test_bad_number_and_missing_file() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir, "a,b\n1,x\n", "a,b\n1,1\n", "a,b\n1,1\n");
        assert!(format!("{:#}", src.load_all().unwrap_err()).contains("`x` is not a number"));

        let missing = CsvScenarioSource::new(dir.path().join("nope.csv"), "a", "b");
        assert!(missing.load_all().is_err());
    }

    #[test]
    fn test_day_out_of_range() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir, "a\n1\n", "a\n1\n", "a\n1\n");
        assert!(src.load_day(1).is_err());
    }
}
