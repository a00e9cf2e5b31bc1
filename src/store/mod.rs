//! Data access: the store seam every handler goes through, with PostgreSQL and in-memory backends.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use crate::error::StoreError;
use crate::model::{Course, Enrollment, Grade, NewStudent, Student, StudentChange, StudentDetail};
use crate::query::StudentQuery;
use async_trait::async_trait;

/// Persistent student records. Every call is its own unit of work; nothing spans entities.
#[async_trait]
pub trait SchoolStore: Send + Sync {
    /// Cheap round-trip used by readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn count_students(&self, query: &StudentQuery) -> Result<i64, StoreError>;

    async fn fetch_students(
        &self,
        query: &StudentQuery,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Student>, StoreError>;

    async fn find_student(&self, id: i32) -> Result<Option<Student>, StoreError>;

    /// Student with enrollments and their course titles, eagerly joined.
    async fn find_student_detail(&self, id: i32) -> Result<Option<StudentDetail>, StoreError>;

    async fn insert_student(&self, student: &NewStudent) -> Result<Student, StoreError>;

    /// Write the given columns. Fails with `NoRowsAffected` when the row is gone.
    async fn update_student(&self, id: i32, changes: &[StudentChange]) -> Result<Student, StoreError>;

    /// Returns false when no row had that id.
    async fn delete_student(&self, id: i32) -> Result<bool, StoreError>;

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError>;

    async fn insert_enrollment(
        &self,
        student_id: i32,
        course_id: i32,
        grade: Option<Grade>,
    ) -> Result<Enrollment, StoreError>;
}
