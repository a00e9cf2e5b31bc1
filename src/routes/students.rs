//! Student routes: list, details, create, edit, delete (confirm + execute).

use crate::handlers::students::{create, delete, delete_confirmed, details, edit, edit_post, index, new_form};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn student_routes(state: AppState) -> Router {
    Router::new()
        .route("/students", get(index).post(create))
        .route("/students/new", get(new_form))
        .route("/students/:id", get(details))
        .route("/students/:id/edit", get(edit).post(edit_post))
        .route("/students/:id/delete", get(delete).post(delete_confirmed))
        .with_state(state)
}
