//! Day-ahead heating and ventilation scheduler for a two-room building.
//!
//! Each scenario-day (hourly price and room occupancy) is solved as an
//! independent mixed-integer linear program; a batch of days runs in
//! parallel and is aggregated into a [`domain::BatchReport`].

pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod optimizer;
pub mod repo;
pub mod simulation;
pub mod telemetry;
