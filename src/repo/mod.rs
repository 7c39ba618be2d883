pub mod results;
pub mod scenarios;

pub use results::{read_daily, read_hourly, CsvResultSink, DailyRow, HourlyRow, HOURLY_COLUMNS};
pub use scenarios::CsvScenarioSource;
