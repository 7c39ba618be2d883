//! # Replay Simulation Module
//!
//! Re-runs a solved day through the physical building model and the overrule
//! state machines, independently of the solver.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hvac_planner::simulation::ReplayVerifier;
//!
//! let violations = ReplayVerifier::new(0.01, 1e-6).verify(&params, &scenario, &result);
//! assert!(violations.is_empty());
//! ```

pub mod replay;

pub use replay::{verify_day, ReplayVerifier, Violation};
