//! PostgreSQL store: executes statements from the SQL builder against a pool.

use crate::error::StoreError;
use crate::model::{Course, Enrollment, EnrollmentDetail, Grade, NewStudent, Student, StudentChange, StudentDetail};
use crate::query::StudentQuery;
use crate::sql::{self, to_arguments, QueryBuf};
use crate::store::SchoolStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

#[derive(sqlx::FromRow)]
struct StudentDetailRow {
    id: i32,
    last_name: String,
    first_mid_name: String,
    enrollment_date: NaiveDate,
    enrollments: Json<Vec<EnrollmentDetail>>,
}

impl PgStore {
    /// `schema` must already be validated as a plain identifier (see `Settings`).
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    async fn fetch_optional_student(&self, q: &QueryBuf) -> Result<Option<Student>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = sqlx::query_as_with::<_, Student, _>(&q.sql, to_arguments(&q.params)?)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl SchoolStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn count_students(&self, query: &StudentQuery) -> Result<i64, StoreError> {
        let q = sql::count_students(&self.schema, query);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let count = sqlx::query_scalar_with::<_, i64, _>(&q.sql, to_arguments(&q.params)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn fetch_students(
        &self,
        query: &StudentQuery,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Student>, StoreError> {
        let q = sql::select_students(&self.schema, query, offset, limit);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = sqlx::query_as_with::<_, Student, _>(&q.sql, to_arguments(&q.params)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_student(&self, id: i32) -> Result<Option<Student>, StoreError> {
        self.fetch_optional_student(&sql::select_student_by_id(&self.schema, id))
            .await
    }

    async fn find_student_detail(&self, id: i32) -> Result<Option<StudentDetail>, StoreError> {
        let q = sql::select_student_detail(&self.schema, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = sqlx::query_as_with::<_, StudentDetailRow, _>(&q.sql, to_arguments(&q.params)?)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| StudentDetail {
            student: Student {
                id: r.id,
                last_name: r.last_name,
                first_mid_name: r.first_mid_name,
                enrollment_date: r.enrollment_date,
            },
            enrollments: r.enrollments.0,
        }))
    }

    async fn insert_student(&self, student: &NewStudent) -> Result<Student, StoreError> {
        let q = sql::insert_student(&self.schema, student);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = sqlx::query_as_with::<_, Student, _>(&q.sql, to_arguments(&q.params)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_student(&self, id: i32, changes: &[StudentChange]) -> Result<Student, StoreError> {
        let row = match sql::update_student(&self.schema, id, changes) {
            Some(q) => self.fetch_optional_student(&q).await?,
            None => self.find_student(id).await?,
        };
        row.ok_or(StoreError::NoRowsAffected { entity: "student", id })
    }

    async fn delete_student(&self, id: i32) -> Result<bool, StoreError> {
        let q = sql::delete_student(&self.schema, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let done = sqlx::query_with(&q.sql, to_arguments(&q.params)?)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError> {
        let q = sql::insert_course(&self.schema, course);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        sqlx::query_with(&q.sql, to_arguments(&q.params)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_enrollment(
        &self,
        student_id: i32,
        course_id: i32,
        grade: Option<Grade>,
    ) -> Result<Enrollment, StoreError> {
        let q = sql::insert_enrollment(&self.schema, student_id, course_id, grade);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let enrollment_id = sqlx::query_scalar_with::<_, i32, _>(&q.sql, to_arguments(&q.params)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(Enrollment {
            enrollment_id,
            course_id,
            student_id,
            grade,
        })
    }
}
