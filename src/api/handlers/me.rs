//! Guarded probe for the admin area.
//!
//! The route guard runs before this handler and attaches the resolved
//! subject; the handler itself never sees an unauthenticated request.

use axum::{Json, extract::Extension, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

use super::auth::AdminContext;

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub subject: String,
}

#[utoipa::path(
    get,
    path = "/v1/admin/me",
    responses(
        (status = 200, description = "The authenticated admin subject.", body = MeResponse),
        (status = 401, description = "Missing or invalid session."),
    ),
    tag = "admin"
)]
pub async fn me(Extension(context): Extension<AdminContext>) -> impl IntoResponse {
    Json(MeResponse {
        subject: context.subject,
    })
}
