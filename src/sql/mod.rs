//! Safe SQL builder: identifiers are fixed or come from validated settings, values are parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
