//! HTTP handlers for the student pages.

pub mod students;
pub use students::*;
