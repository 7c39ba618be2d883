pub mod bounds;
pub mod constraints;
pub mod model;
pub mod strategies;
pub mod types;

pub use bounds::{derive_big_m, Interval, StateBounds};
pub use model::{DayModel, DayVariables};
pub use strategies::*;
pub use types::*;
