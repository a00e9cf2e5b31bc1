//! School records: students, their enrollments, and a paginated, searchable student list
//! served over HTTP from PostgreSQL.

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod pagination;
pub mod query;
pub mod response;
pub mod routes;
pub mod seed;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::Settings;
pub use context::{SchoolContext, Tracked};
pub use error::{AppError, ConfigError, StoreError};
pub use migration::{apply_migrations, ensure_database_exists};
pub use model::{Course, Enrollment, Grade, Student, StudentDetail, StudentForm};
pub use pagination::{PageSource, PaginatedList};
pub use routes::{app, common_routes, student_routes};
pub use seed::seed_if_empty;
pub use service::StudentService;
pub use state::AppState;
pub use store::{InMemoryStore, PgStore, SchoolStore};
