//! In-process store with the same observable behavior as the PostgreSQL one.
//! Writes can be made to fail on demand to exercise the save-failure paths.

use crate::error::StoreError;
use crate::model::{Course, Enrollment, EnrollmentDetail, Grade, NewStudent, Student, StudentChange, StudentDetail};
use crate::query::StudentQuery;
use crate::store::SchoolStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    students: BTreeMap<i32, Student>,
    courses: BTreeMap<i32, Course>,
    enrollments: BTreeMap<i32, Enrollment>,
    last_student_id: i32,
    last_enrollment_id: i32,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every insert, update and delete is rejected.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// While set, `ping` fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn student_count(&self) -> usize {
        self.lock().map(|s| s.students.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Rejected("store lock poisoned".into()))
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("writes are disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SchoolStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("store is offline".into()));
        }
        Ok(())
    }

    async fn count_students(&self, query: &StudentQuery) -> Result<i64, StoreError> {
        let state = self.lock()?;
        Ok(state.students.values().filter(|s| query.matches(s)).count() as i64)
    }

    async fn fetch_students(
        &self,
        query: &StudentQuery,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Student>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<Student> = state.students.values().filter(|s| query.matches(s)).cloned().collect();
        let order = query.order();
        rows.sort_by(|a, b| order.compare(a, b));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn find_student(&self, id: i32) -> Result<Option<Student>, StoreError> {
        Ok(self.lock()?.students.get(&id).cloned())
    }

    async fn find_student_detail(&self, id: i32) -> Result<Option<StudentDetail>, StoreError> {
        let state = self.lock()?;
        let Some(student) = state.students.get(&id).cloned() else {
            return Ok(None);
        };
        let enrollments = state
            .enrollments
            .values()
            .filter(|e| e.student_id == id)
            .map(|e| EnrollmentDetail {
                enrollment_id: e.enrollment_id,
                course_id: e.course_id,
                course_title: state
                    .courses
                    .get(&e.course_id)
                    .map(|c| c.title.clone())
                    .unwrap_or_default(),
                grade: e.grade,
            })
            .collect();
        Ok(Some(StudentDetail { student, enrollments }))
    }

    async fn insert_student(&self, student: &NewStudent) -> Result<Student, StoreError> {
        self.check_writable()?;
        let mut state = self.lock()?;
        state.last_student_id += 1;
        let row = Student {
            id: state.last_student_id,
            last_name: student.last_name.clone(),
            first_mid_name: student.first_mid_name.clone(),
            enrollment_date: student.enrollment_date,
        };
        state.students.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_student(&self, id: i32, changes: &[StudentChange]) -> Result<Student, StoreError> {
        self.check_writable()?;
        let mut state = self.lock()?;
        let row = state
            .students
            .get_mut(&id)
            .ok_or(StoreError::NoRowsAffected { entity: "student", id })?;
        for change in changes {
            change.apply(row);
        }
        Ok(row.clone())
    }

    async fn delete_student(&self, id: i32) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut state = self.lock()?;
        let existed = state.students.remove(&id).is_some();
        if existed {
            state.enrollments.retain(|_, e| e.student_id != id);
        }
        Ok(existed)
    }

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut state = self.lock()?;
        if state.courses.contains_key(&course.course_id) {
            return Err(StoreError::Rejected(format!("course {} already exists", course.course_id)));
        }
        state.courses.insert(course.course_id, course.clone());
        Ok(())
    }

    async fn insert_enrollment(
        &self,
        student_id: i32,
        course_id: i32,
        grade: Option<Grade>,
    ) -> Result<Enrollment, StoreError> {
        self.check_writable()?;
        let mut state = self.lock()?;
        if !state.students.contains_key(&student_id) {
            return Err(StoreError::Rejected(format!("student {} does not exist", student_id)));
        }
        if !state.courses.contains_key(&course_id) {
            return Err(StoreError::Rejected(format!("course {} does not exist", course_id)));
        }
        state.last_enrollment_id += 1;
        let row = Enrollment {
            enrollment_id: state.last_enrollment_id,
            course_id,
            student_id,
            grade,
        };
        state.enrollments.insert(row.enrollment_id, row.clone());
        Ok(row)
    }
}
