//! TOTP enrollment step: generate a pending secret and serve its QR code.

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::{machine::LoginStage, state::AuthState, types::EnrollmentResponse};
use crate::credentials::repo;
use crate::totp::TotpEngine;

#[derive(Deserialize)]
pub struct SetupQuery {
    login_id: String,
}

#[utoipa::path(
    get,
    path = "/v1/auth/setup-2fa",
    params(
        ("login_id" = String, Query, description = "Login attempt handle from the password step")
    ),
    responses(
        (status = 200, description = "Enrollment QR for the pending secret", body = EnrollmentResponse),
        (status = 401, description = "No pending first login for this handle", body = String),
        (status = 500, description = "Secret generation failed", body = String)
    ),
    tag = "auth"
)]
pub async fn setup_2fa(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<SetupQuery>,
) -> impl IntoResponse {
    let Ok(login_id) = Uuid::parse_str(query.login_id.trim()) else {
        return (StatusCode::UNAUTHORIZED, "Invalid login".to_string()).into_response();
    };

    // Attempts are single-use; put this one back only if we can still serve it.
    let Some(attempt) = auth_state.flows().take(login_id).await else {
        return (StatusCode::UNAUTHORIZED, "Invalid login".to_string()).into_response();
    };

    if attempt.stage != LoginStage::AwaitingEnrollmentAck {
        // Already enrolled logins have no business here; the attempt is gone.
        return (StatusCode::UNAUTHORIZED, "Invalid login".to_string()).into_response();
    }

    // Persist the fresh secret in the pending state before showing the QR,
    // so verify-totp can find it. It only becomes the active second factor
    // after the first valid code.
    let secret = TotpEngine::generate_secret();
    if let Err(err) = repo::set_pending_totp_secret(&pool, &secret).await {
        error!("Failed to store pending TOTP secret: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Enrollment failed".to_string(),
        )
            .into_response();
    }

    let qr_code = match auth_state.totp().qr_data_url(&secret) {
        Ok(qr) => qr,
        Err(err) => {
            error!("Failed to render enrollment QR: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Enrollment failed".to_string(),
            )
                .into_response();
        }
    };
    let otpauth_uri = match auth_state.totp().provisioning_uri(&secret) {
        Ok(uri) => uri,
        Err(err) => {
            error!("Failed to build provisioning URI: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Enrollment failed".to_string(),
            )
                .into_response();
        }
    };

    // Still awaiting the scan acknowledgment; keep the attempt alive under
    // the same handle. Fetching the QR twice regenerates the pending secret,
    // which is fine: last write wins and nothing was confirmed yet.
    auth_state.flows().restore(login_id, attempt).await;

    (
        StatusCode::OK,
        Json(EnrollmentResponse {
            qr_code,
            otpauth_uri,
        }),
    )
        .into_response()
}
