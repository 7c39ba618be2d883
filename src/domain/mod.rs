pub mod overrule;
pub mod parameters;
pub mod result;
pub mod scenario;
pub mod types;

pub use overrule::*;
pub use parameters::*;
pub use result::*;
pub use scenario::*;
pub use types::*;
