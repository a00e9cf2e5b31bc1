//! Standard response envelope helpers.

use crate::error::{ErrorBody, ErrorDetail};
use crate::service::{FormRejection, RejectionKind, SAVE_FAILED_MESSAGE};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data }))
}

/// Re-display a rejected form: 422 for invalid input, 500 when the store refused the write.
/// `details` carries the attempted values and the per-field errors.
pub fn form_rejection(rejection: FormRejection) -> Response {
    let (status, code, message) = match rejection.kind {
        RejectionKind::Invalid => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "The form contains invalid values.",
        ),
        RejectionKind::SaveFailed => (StatusCode::INTERNAL_SERVER_ERROR, "save_failed", SAVE_FAILED_MESSAGE),
    };
    let body = ErrorBody {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
            details: serde_json::to_value(&rejection).ok(),
        },
    };
    (status, Json(body)).into_response()
}
