//! Student workflows: list/search/sort/paginate and the create, read, edit, delete round-trips.

use crate::context::SchoolContext;
use crate::error::AppError;
use crate::model::{FieldError, Student, StudentDetail, StudentForm};
use crate::pagination::PaginatedList;
use crate::query::StudentOrder;
use serde::{Deserialize, Deserializer, Serialize};

/// Students per list page.
pub const PAGE_SIZE: i64 = 3;

pub const SAVE_FAILED_MESSAGE: &str =
    "Unable to save changes. Try again, and if the problem persists see your system administrator.";

pub const DELETE_FAILED_MESSAGE: &str =
    "Delete failed. Try again, and if the problem persists see your system administrator.";

/// List request. `search_string` present (even empty) restarts paging at 1;
/// absent means keep filtering by `current_filter`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort_order: Option<String>,
    pub search_string: Option<String>,
    pub current_filter: Option<String>,
    #[serde(default, deserialize_with = "lenient_page")]
    pub page: Option<i64>,
}

/// Blank or non-numeric page values bind as absent, which lists page 1.
fn lenient_page<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse::<i64>().ok()))
}

/// One list page plus the state needed to build sort and paging links.
#[derive(Clone, Debug, Serialize)]
pub struct StudentIndex {
    pub current_sort: Option<String>,
    /// Token for the last-name header link.
    pub name_sort_parm: &'static str,
    /// Token for the enrollment-date header link.
    pub date_sort_parm: &'static str,
    pub current_filter: Option<String>,
    pub page_index: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub students: Vec<Student>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionKind {
    Invalid,
    SaveFailed,
}

/// A form that could not be saved, returned with what the caller attempted.
#[derive(Clone, Debug, Serialize)]
pub struct FormRejection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub values: StudentForm,
    pub errors: Vec<FieldError>,
    #[serde(skip)]
    pub kind: RejectionKind,
}

impl FormRejection {
    fn invalid(id: Option<i32>, values: StudentForm, errors: Vec<FieldError>) -> Self {
        FormRejection {
            id,
            values,
            errors,
            kind: RejectionKind::Invalid,
        }
    }

    fn save_failed(id: Option<i32>, values: StudentForm) -> Self {
        FormRejection {
            id,
            values,
            errors: vec![FieldError::form(SAVE_FAILED_MESSAGE)],
            kind: RejectionKind::SaveFailed,
        }
    }
}

#[derive(Clone, Debug)]
pub enum FormOutcome {
    Saved(Student),
    Rejected(FormRejection),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing to delete; treated as success so double submits are harmless.
    AlreadyAbsent,
    Failed,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeleteConfirmation {
    pub student: Student,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<&'static str>,
}

fn require_id(id: Option<i32>) -> Result<i32, AppError> {
    id.ok_or_else(|| AppError::NotFound("student id not specified".into()))
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("student {}", id))
}

pub struct StudentService;

impl StudentService {
    pub async fn list(ctx: &SchoolContext, params: ListParams) -> Result<StudentIndex, AppError> {
        let ListParams {
            sort_order,
            search_string,
            current_filter,
            mut page,
        } = params;

        let search = match search_string {
            Some(s) => {
                page = Some(1);
                Some(s)
            }
            None => current_filter,
        };

        let order = StudentOrder::from_token(sort_order.as_deref());
        let mut students = ctx.students().order_by(order);
        if let Some(text) = search.as_deref().filter(|s| !s.is_empty()) {
            students = students.name_contains(text);
        }
        let list = PaginatedList::create(&students, page, PAGE_SIZE).await?;

        let name_sort_parm = if sort_order.as_deref().map_or(true, str::is_empty) {
            "name_desc"
        } else {
            ""
        };
        let date_sort_parm = if sort_order.as_deref() == Some("Date") {
            "date_desc"
        } else {
            "Date"
        };
        Ok(StudentIndex {
            current_sort: sort_order,
            name_sort_parm,
            date_sort_parm,
            current_filter: search,
            page_index: list.page_index,
            page_size: list.page_size,
            total_count: list.total_count,
            total_pages: list.total_pages,
            has_previous_page: list.has_previous_page(),
            has_next_page: list.has_next_page(),
            students: list.items,
        })
    }

    pub async fn detail(ctx: &SchoolContext, id: Option<i32>) -> Result<StudentDetail, AppError> {
        let id = require_id(id)?;
        ctx.student_detail(id).await?.ok_or_else(|| not_found(id))
    }

    /// Only the allow-listed form members reach the new row.
    pub async fn create(ctx: &mut SchoolContext, form: StudentForm) -> Result<FormOutcome, AppError> {
        let student = match form.validate() {
            Ok(s) => s,
            Err(errors) => return Ok(FormOutcome::Rejected(FormRejection::invalid(None, form, errors))),
        };
        ctx.add(student);
        match ctx.save_changes().await {
            Ok(summary) => match summary.inserted.into_iter().next() {
                Some(row) => Ok(FormOutcome::Saved(row)),
                None => Ok(FormOutcome::Rejected(FormRejection::save_failed(None, form))),
            },
            Err(e) => {
                tracing::warn!(error = %e, "unable to save new student");
                Ok(FormOutcome::Rejected(FormRejection::save_failed(None, form)))
            }
        }
    }

    pub async fn load_for_edit(ctx: &SchoolContext, id: Option<i32>) -> Result<Student, AppError> {
        let id = require_id(id)?;
        ctx.find_student(id).await?.ok_or_else(|| not_found(id))
    }

    /// Load the persisted row, copy the allow-listed members present in `form`, save.
    /// Concurrent edits are not detected; the last save wins.
    pub async fn apply_edit(
        ctx: &mut SchoolContext,
        id: Option<i32>,
        form: StudentForm,
    ) -> Result<FormOutcome, AppError> {
        let id = require_id(id)?;
        let mut student = ctx.find_student_tracked(id).await?.ok_or_else(|| not_found(id))?;
        if let Err(errors) = form.apply_to(&mut student) {
            return Ok(FormOutcome::Rejected(FormRejection::invalid(Some(id), form, errors)));
        }
        ctx.update(&student);
        match ctx.save_changes().await {
            Ok(summary) => {
                let row = summary.updated.into_iter().next().unwrap_or_else(|| student.into_inner());
                Ok(FormOutcome::Saved(row))
            }
            Err(e) => {
                tracing::warn!(student_id = id, error = %e, "unable to save student changes");
                Ok(FormOutcome::Rejected(FormRejection::save_failed(Some(id), form)))
            }
        }
    }

    pub async fn confirm_delete(
        ctx: &SchoolContext,
        id: Option<i32>,
        save_changes_error: Option<bool>,
    ) -> Result<DeleteConfirmation, AppError> {
        let id = require_id(id)?;
        let student = ctx.find_student(id).await?.ok_or_else(|| not_found(id))?;
        Ok(DeleteConfirmation {
            student,
            error_message: save_changes_error.unwrap_or(false).then_some(DELETE_FAILED_MESSAGE),
        })
    }

    /// Idempotent: a missing row is success. Storage failures come back as `Failed`.
    pub async fn execute_delete(ctx: &mut SchoolContext, id: i32) -> DeleteOutcome {
        match ctx.find_student(id).await {
            Ok(Some(_)) => {}
            Ok(None) => return DeleteOutcome::AlreadyAbsent,
            Err(e) => {
                tracing::warn!(student_id = id, error = %e, "unable to load student for delete");
                return DeleteOutcome::Failed;
            }
        }
        ctx.remove(id);
        match ctx.save_changes().await {
            Ok(summary) if summary.removed.is_empty() => DeleteOutcome::AlreadyAbsent,
            Ok(_) => DeleteOutcome::Deleted,
            Err(e) => {
                tracing::warn!(student_id = id, error = %e, "unable to delete student");
                DeleteOutcome::Failed
            }
        }
    }
}
