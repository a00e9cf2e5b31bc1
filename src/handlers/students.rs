//! Student handlers: index, details, create, edit, delete.
//! Successful writes answer with a 303 to the list; rejected forms come back with their values.

use crate::error::AppError;
use crate::model::StudentForm;
use crate::response::{form_rejection, success_one_ok};
use crate::service::{DeleteOutcome, FormOutcome, ListParams, StudentService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;

pub const STUDENTS_PATH: &str = "/students";

/// Ids that do not parse are treated as unspecified.
fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    pub save_changes_error: Option<bool>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.context();
    let index = StudentService::list(&ctx, params).await?;
    Ok(success_one_ok(index))
}

pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.context();
    let detail = StudentService::detail(&ctx, parse_id(&id)).await?;
    Ok(success_one_ok(detail))
}

/// Blank create form.
pub async fn new_form() -> impl IntoResponse {
    success_one_ok(StudentForm::default())
}

pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<StudentForm>,
) -> Result<Response, AppError> {
    let mut ctx = state.context();
    Ok(match StudentService::create(&mut ctx, form).await? {
        FormOutcome::Saved(_) => Redirect::to(STUDENTS_PATH).into_response(),
        FormOutcome::Rejected(r) => form_rejection(r),
    })
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.context();
    let student = StudentService::load_for_edit(&ctx, parse_id(&id)).await?;
    Ok(success_one_ok(student))
}

pub async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<StudentForm>,
) -> Result<Response, AppError> {
    let mut ctx = state.context();
    Ok(match StudentService::apply_edit(&mut ctx, parse_id(&id), form).await? {
        FormOutcome::Saved(_) => Redirect::to(STUDENTS_PATH).into_response(),
        FormOutcome::Rejected(r) => form_rejection(r),
    })
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.context();
    let confirmation = StudentService::confirm_delete(&ctx, parse_id(&id), params.save_changes_error).await?;
    Ok(success_one_ok(confirmation))
}

/// Always redirects. An id that does not parse names no row, so like an already-deleted
/// student it goes back to the list.
pub async fn delete_confirmed(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return Redirect::to(STUDENTS_PATH).into_response();
    };
    let mut ctx = state.context();
    match StudentService::execute_delete(&mut ctx, id).await {
        DeleteOutcome::Deleted | DeleteOutcome::AlreadyAbsent => Redirect::to(STUDENTS_PATH).into_response(),
        DeleteOutcome::Failed => {
            Redirect::to(&format!("{}/{}/delete?save_changes_error=true", STUDENTS_PATH, id)).into_response()
        }
    }
}
