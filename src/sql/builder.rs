//! Builds parameterized statements for the student, course and enrollment tables.

use crate::model::{Course, Grade, NewStudent, StudentChange};
use crate::query::StudentQuery;
use crate::sql::SqlParam;

pub const STUDENT_TABLE: &str = "student";
pub const COURSE_TABLE: &str = "course";
pub const ENROLLMENT_TABLE: &str = "enrollment";

const STUDENT_COLUMNS: &[&str] = &["id", "last_name", "first_mid_name", "enrollment_date"];

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: impl Into<SqlParam>) -> usize {
        self.params.push(v.into());
        self.params.len()
    }
}

fn student_column_list(alias: Option<&str>) -> String {
    STUDENT_COLUMNS
        .iter()
        .map(|c| match alias {
            Some(a) => format!("{}.{}", a, quoted(c)),
            None => quoted(c),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// WHERE clause for the name search; binds the search text once and references it twice.
fn push_search(q: &mut QueryBuf, query: &StudentQuery) -> String {
    match query.search() {
        Some(text) => {
            let n = q.push_param(text);
            format!(
                " WHERE strpos({}, ${n}) > 0 OR strpos({}, ${n}) > 0",
                quoted("last_name"),
                quoted("first_mid_name"),
            )
        }
        None => String::new(),
    }
}

/// SELECT COUNT(*) over the filtered students. Ordering does not affect the count.
pub fn count_students(schema: &str, query: &StudentQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, STUDENT_TABLE);
    let where_clause = push_search(&mut q, query);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", table, where_clause);
    q
}

/// SELECT one page of filtered students ordered by the single active key.
pub fn select_students(schema: &str, query: &StudentQuery, offset: i64, limit: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, STUDENT_TABLE);
    let where_clause = push_search(&mut q, query);
    let order = query.order();
    let direction = if order.descending() { "DESC" } else { "ASC" };
    let limit_param = q.push_param(limit);
    let offset_param = q.push_param(offset);
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} {} LIMIT ${} OFFSET ${}",
        student_column_list(None),
        table,
        where_clause,
        quoted(order.column()),
        direction,
        limit_param,
        offset_param
    );
    q
}

pub fn select_student_by_id(schema: &str, id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        student_column_list(None),
        qualified_table(schema, STUDENT_TABLE),
        quoted("id"),
        n
    );
    q
}

/// Student row with its enrollments and their course titles in a single statement.
/// Enrollments come back as a JSON array (empty when the student has none).
pub fn select_student_detail(schema: &str, id: i32) -> QueryBuf {
    const MAIN_ALIAS: &str = "main";
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    let enrollments = format!(
        "(SELECT COALESCE(json_agg(row_to_json(sub) ORDER BY sub.enrollment_id), '[]'::json) FROM (\
         SELECT e.{eid} AS enrollment_id, e.{cid} AS course_id, c.{title} AS course_title, e.{grade}::text AS grade \
         FROM {enr} e JOIN {course} c ON c.{cid} = e.{cid} WHERE e.{sid} = {main}.{id}) sub)",
        eid = quoted("enrollment_id"),
        cid = quoted("course_id"),
        title = quoted("title"),
        grade = quoted("grade"),
        enr = qualified_table(schema, ENROLLMENT_TABLE),
        course = qualified_table(schema, COURSE_TABLE),
        sid = quoted("student_id"),
        main = MAIN_ALIAS,
        id = quoted("id"),
    );
    q.sql = format!(
        "SELECT {}, {} AS {} FROM {} {} WHERE {}.{} = ${}",
        student_column_list(Some(MAIN_ALIAS)),
        enrollments,
        quoted("enrollments"),
        qualified_table(schema, STUDENT_TABLE),
        MAIN_ALIAS,
        MAIN_ALIAS,
        quoted("id"),
        n
    );
    q
}

/// INSERT a student; the identity is generated by the database.
pub fn insert_student(schema: &str, s: &NewStudent) -> QueryBuf {
    let mut q = QueryBuf::new();
    let p1 = q.push_param(s.last_name.as_str());
    let p2 = q.push_param(s.first_mid_name.as_str());
    let p3 = q.push_param(s.enrollment_date);
    q.sql = format!(
        "INSERT INTO {} ({}, {}, {}) VALUES (${}, ${}, ${}) RETURNING {}",
        qualified_table(schema, STUDENT_TABLE),
        quoted("last_name"),
        quoted("first_mid_name"),
        quoted("enrollment_date"),
        p1,
        p2,
        p3,
        student_column_list(None)
    );
    q
}

/// UPDATE by id: SET only the changed columns. Returns None when there is nothing to write.
pub fn update_student(schema: &str, id: i32, changes: &[StudentChange]) -> Option<QueryBuf> {
    if changes.is_empty() {
        return None;
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(changes.len());
    for change in changes {
        let n = match change {
            StudentChange::LastName(v) | StudentChange::FirstMidName(v) => q.push_param(v.as_str()),
            StudentChange::EnrollmentDate(d) => q.push_param(*d),
        };
        sets.push(format!("{} = ${}", quoted(change.column()), n));
    }
    let id_param = q.push_param(id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        qualified_table(schema, STUDENT_TABLE),
        sets.join(", "),
        quoted("id"),
        id_param,
        student_column_list(None)
    );
    Some(q)
}

/// DELETE by id. Enrollments go with it through the foreign key's ON DELETE CASCADE.
pub fn delete_student(schema: &str, id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${}",
        qualified_table(schema, STUDENT_TABLE),
        quoted("id"),
        n
    );
    q
}

pub fn insert_course(schema: &str, c: &Course) -> QueryBuf {
    let mut q = QueryBuf::new();
    let p1 = q.push_param(c.course_id);
    let p2 = q.push_param(c.title.as_str());
    let p3 = q.push_param(c.credits);
    q.sql = format!(
        "INSERT INTO {} ({}, {}, {}) VALUES (${}, ${}, ${})",
        qualified_table(schema, COURSE_TABLE),
        quoted("course_id"),
        quoted("title"),
        quoted("credits"),
        p1,
        p2,
        p3
    );
    q
}

/// INSERT an enrollment; the grade letter is bound as text and cast to the enum type.
pub fn insert_enrollment(schema: &str, student_id: i32, course_id: i32, grade: Option<Grade>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let p1 = q.push_param(course_id);
    let p2 = q.push_param(student_id);
    let p3 = q.push_param(SqlParam::OptText(grade.map(|g| g.as_str().to_string())));
    q.sql = format!(
        "INSERT INTO {} ({}, {}, {}) VALUES (${}, ${}, ${}::{}) RETURNING {}",
        qualified_table(schema, ENROLLMENT_TABLE),
        quoted("course_id"),
        quoted("student_id"),
        quoted("grade"),
        p1,
        p2,
        p3,
        qualified_table(schema, "grade"),
        quoted("enrollment_id")
    );
    q
}
