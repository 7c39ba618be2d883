//! Scheduling strategies
//!
//! - MILP: exact day-ahead schedule via mixed-integer linear programming

pub mod milp;

pub use milp::*;
