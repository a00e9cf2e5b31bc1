//! Sample rows for a fresh database: eight students, seven courses and their enrollments.

use crate::error::StoreError;
use crate::model::{Course, Grade, NewStudent};
use crate::query::StudentQuery;
use crate::store::SchoolStore;
use chrono::NaiveDate;

const STUDENTS: &[(&str, &str, (i32, u32, u32))] = &[
    ("Alexander", "Carson", (2005, 9, 1)),
    ("Alonso", "Meredith", (2002, 9, 1)),
    ("Anand", "Arturo", (2003, 9, 1)),
    ("Barzdukas", "Gytis", (2002, 9, 1)),
    ("Li", "Yan", (2002, 9, 1)),
    ("Justice", "Peggy", (2001, 9, 1)),
    ("Norman", "Laura", (2003, 9, 1)),
    ("Olivetto", "Nino", (2005, 9, 1)),
];

const COURSES: &[(i32, &str, i32)] = &[
    (1050, "Chemistry", 3),
    (4022, "Microeconomics", 3),
    (4041, "Macroeconomics", 3),
    (1045, "Calculus", 4),
    (3141, "Trigonometry", 4),
    (2021, "Composition", 3),
    (2042, "Literature", 4),
];

/// (index into STUDENTS, course id, grade)
const ENROLLMENTS: &[(usize, i32, Option<Grade>)] = &[
    (0, 1050, Some(Grade::A)),
    (0, 4022, Some(Grade::C)),
    (0, 4041, Some(Grade::B)),
    (1, 1045, Some(Grade::B)),
    (1, 3141, Some(Grade::F)),
    (1, 2021, Some(Grade::F)),
    (2, 1050, None),
    (3, 1050, None),
    (3, 4022, Some(Grade::F)),
    (4, 4041, Some(Grade::C)),
    (5, 1045, None),
    (6, 3141, Some(Grade::A)),
];

/// Insert the sample rows unless a student already exists. Returns whether anything was written.
pub async fn seed_if_empty(store: &dyn SchoolStore) -> Result<bool, StoreError> {
    if store.count_students(&StudentQuery::new()).await? > 0 {
        return Ok(false);
    }

    let mut ids = Vec::with_capacity(STUDENTS.len());
    for (last, first, (y, m, d)) in STUDENTS {
        let enrollment_date = NaiveDate::from_ymd_opt(*y, *m, *d)
            .ok_or_else(|| StoreError::Rejected(format!("invalid seed date {}-{}-{}", y, m, d)))?;
        let row = store
            .insert_student(&NewStudent {
                last_name: last.to_string(),
                first_mid_name: first.to_string(),
                enrollment_date,
            })
            .await?;
        ids.push(row.id);
    }

    for (course_id, title, credits) in COURSES {
        store
            .insert_course(&Course {
                course_id: *course_id,
                title: title.to_string(),
                credits: *credits,
            })
            .await?;
    }

    for (student, course_id, grade) in ENROLLMENTS {
        store.insert_enrollment(ids[*student], *course_id, *grade).await?;
    }

    tracing::info!(
        students = STUDENTS.len(),
        courses = COURSES.len(),
        enrollments = ENROLLMENTS.len(),
        "seeded sample data"
    );
    Ok(true)
}
