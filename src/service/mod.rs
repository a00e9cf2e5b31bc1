//! StudentService: list and CRUD workflows over a per-request context.

mod students;
pub use students::*;
