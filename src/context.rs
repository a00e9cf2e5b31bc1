//! Per-request data context: untracked reads, tracked entities, and a pending-change list
//! flushed by `save_changes`. One context per request; it is never shared.

use crate::error::StoreError;
use crate::model::{NewStudent, Student, StudentChange, StudentDetail};
use crate::pagination::PageSource;
use crate::query::{StudentOrder, StudentQuery};
use crate::store::SchoolStore;
use async_trait::async_trait;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A loaded student whose later edits are diffed against the snapshot taken at load time.
#[derive(Clone, Debug)]
pub struct Tracked<T> {
    original: T,
    current: T,
}

impl<T: Clone> Tracked<T> {
    fn new(entity: T) -> Self {
        Tracked {
            original: entity.clone(),
            current: entity,
        }
    }

    pub fn into_inner(self) -> T {
        self.current
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.current
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.current
    }
}

impl Tracked<Student> {
    /// Allow-listed columns that differ from the loaded row. The identity never appears.
    pub fn changes(&self) -> Vec<StudentChange> {
        let (o, c) = (&self.original, &self.current);
        let mut out = Vec::new();
        if o.last_name != c.last_name {
            out.push(StudentChange::LastName(c.last_name.clone()));
        }
        if o.first_mid_name != c.first_mid_name {
            out.push(StudentChange::FirstMidName(c.first_mid_name.clone()));
        }
        if o.enrollment_date != c.enrollment_date {
            out.push(StudentChange::EnrollmentDate(c.enrollment_date));
        }
        out
    }

    /// Id the row was loaded with, regardless of what was assigned since.
    pub fn key(&self) -> i32 {
        self.original.id
    }
}

#[derive(Debug)]
enum PendingChange {
    Insert(NewStudent),
    Update { id: i32, changes: Vec<StudentChange> },
    Remove(i32),
}

#[derive(Debug, Default)]
pub struct SaveSummary {
    pub inserted: Vec<Student>,
    pub updated: Vec<Student>,
    /// Ids actually removed; ids that were already gone are not listed.
    pub removed: Vec<i32>,
}

/// Deferred, untracked student query bound to a store. Nothing runs until it is counted or sliced.
pub struct StudentSet<'a> {
    store: &'a dyn SchoolStore,
    query: StudentQuery,
}

impl<'a> StudentSet<'a> {
    pub fn name_contains(mut self, text: impl Into<String>) -> Self {
        self.query = self.query.name_contains(text);
        self
    }

    pub fn order_by(mut self, order: StudentOrder) -> Self {
        self.query = self.query.order_by(order);
        self
    }

    pub async fn to_vec(&self) -> Result<Vec<Student>, StoreError> {
        let count = self.store.count_students(&self.query).await?;
        self.store.fetch_students(&self.query, 0, count).await
    }
}

#[async_trait]
impl PageSource for StudentSet<'_> {
    type Item = Student;

    async fn count(&self) -> Result<i64, StoreError> {
        self.store.count_students(&self.query).await
    }

    async fn slice(&self, offset: i64, limit: i64) -> Result<Vec<Student>, StoreError> {
        self.store.fetch_students(&self.query, offset, limit).await
    }
}

pub struct SchoolContext {
    store: Arc<dyn SchoolStore>,
    pending: Vec<PendingChange>,
}

impl SchoolContext {
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        SchoolContext {
            store,
            pending: Vec::new(),
        }
    }

    pub fn students(&self) -> StudentSet<'_> {
        StudentSet {
            store: self.store.as_ref(),
            query: StudentQuery::new(),
        }
    }

    /// Untracked single read.
    pub async fn find_student(&self, id: i32) -> Result<Option<Student>, StoreError> {
        self.store.find_student(id).await
    }

    /// Untracked read with enrollments and course titles.
    pub async fn student_detail(&self, id: i32) -> Result<Option<StudentDetail>, StoreError> {
        self.store.find_student_detail(id).await
    }

    pub async fn find_student_tracked(&self, id: i32) -> Result<Option<Tracked<Student>>, StoreError> {
        Ok(self.store.find_student(id).await?.map(Tracked::new))
    }

    pub fn add(&mut self, student: NewStudent) {
        self.pending.push(PendingChange::Insert(student));
    }

    /// Queue the changed columns of a tracked student. Unchanged entities queue nothing.
    pub fn update(&mut self, student: &Tracked<Student>) {
        let changes = student.changes();
        if !changes.is_empty() {
            self.pending.push(PendingChange::Update {
                id: student.key(),
                changes,
            });
        }
    }

    pub fn remove(&mut self, id: i32) {
        self.pending.push(PendingChange::Remove(id));
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Persist queued changes in order, each as its own write. The queue is cleared either way;
    /// changes before a failing one stay persisted.
    pub async fn save_changes(&mut self) -> Result<SaveSummary, StoreError> {
        let mut summary = SaveSummary::default();
        for change in std::mem::take(&mut self.pending) {
            match change {
                PendingChange::Insert(s) => {
                    let row = self.store.insert_student(&s).await?;
                    tracing::info!(student_id = row.id, "student created");
                    summary.inserted.push(row);
                }
                PendingChange::Update { id, changes } => {
                    let row = self.store.update_student(id, &changes).await?;
                    tracing::info!(student_id = id, columns = changes.len(), "student updated");
                    summary.updated.push(row);
                }
                PendingChange::Remove(id) => {
                    if self.store.delete_student(id).await? {
                        tracing::info!(student_id = id, "student deleted");
                        summary.removed.push(id);
                    }
                }
            }
        }
        Ok(summary)
    }
}
