//! Database bootstrap: create the database if missing, then idempotent DDL for the school tables.
//! Order follows PostgreSQL dependencies: schema, enum type, course, student, enrollment.

use crate::error::{AppError, ConfigError};
use crate::model::Grade;
use crate::sql::{qualified_table, quoted, COURSE_TABLE, ENROLLMENT_TABLE, STUDENT_TABLE};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// DDL statements in execution order. Every statement is safe to re-run.
pub fn ddl_statements(schema: &str) -> Vec<String> {
    let grade_type = qualified_table(schema, "grade");
    let letters: Vec<String> = Grade::ALL.iter().map(|g| format!("'{}'", g.as_str())).collect();
    let course = qualified_table(schema, COURSE_TABLE);
    let student = qualified_table(schema, STUDENT_TABLE);
    let enrollment = qualified_table(schema, ENROLLMENT_TABLE);
    vec![
        format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)),
        format!(
            "DO $$ BEGIN CREATE TYPE {} AS ENUM ({}); EXCEPTION WHEN duplicate_object THEN NULL; END $$",
            grade_type,
            letters.join(", ")
        ),
        format!(
            r#"CREATE TABLE IF NOT EXISTS {course} (
                "course_id" INTEGER PRIMARY KEY,
                "title" VARCHAR(50) NOT NULL,
                "credits" INTEGER NOT NULL
            )"#
        ),
        format!(
            r#"CREATE TABLE IF NOT EXISTS {student} (
                "id" INTEGER GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
                "last_name" VARCHAR(50) NOT NULL,
                "first_mid_name" VARCHAR(50) NOT NULL,
                "enrollment_date" DATE NOT NULL
            )"#
        ),
        format!(
            r#"CREATE TABLE IF NOT EXISTS {enrollment} (
                "enrollment_id" INTEGER GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
                "course_id" INTEGER NOT NULL REFERENCES {course} ("course_id") ON DELETE CASCADE,
                "student_id" INTEGER NOT NULL REFERENCES {student} ("id") ON DELETE CASCADE,
                "grade" {grade_type}
            )"#
        ),
        format!(
            r#"CREATE INDEX IF NOT EXISTS "ix_enrollment_student_id" ON {enrollment} ("student_id")"#
        ),
        format!(
            r#"CREATE INDEX IF NOT EXISTS "ix_enrollment_course_id" ON {enrollment} ("course_id")"#
        ),
    ]
}

/// Create schema, enum and tables when they do not exist yet.
pub async fn apply_migrations(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    for ddl in ddl_statements(schema) {
        tracing::debug!(sql = %ddl, "migration");
        sqlx::query(&ddl).execute(pool).await?;
    }
    tracing::info!(schema = %schema, "school schema ready");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| invalid_url(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn invalid_url(reason: String) -> ConfigError {
    ConfigError::Invalid {
        name: "DATABASE_URL",
        reason,
    }
}

/// Split a connection URL into the admin URL (same server, `postgres` database) and the database name.
fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let path_start = url.rfind('/').ok_or_else(|| invalid_url("no path".into()))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim();
    let query = parts.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres{}", base, query), db_name.to_string()))
}
