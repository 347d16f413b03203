//! TOTP verification step: the end of the login flow.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::{
    machine::{CodeOutcome, LoginStage},
    rate_limit::LoginRateLimiter,
    session::session_cookie,
    state::AuthState,
    storage::insert_session,
    types::{SessionStatusResponse, VerifyTotpRequest},
    utils::extract_client_ip,
};
use crate::credentials::{self, repo};

#[utoipa::path(
    post,
    path = "/v1/auth/verify-totp",
    request_body = VerifyTotpRequest,
    responses(
        (status = 200, description = "Code accepted; session cookie set", body = SessionStatusResponse),
        (status = 401, description = "Invalid credentials", body = String),
        (status = 429, description = "Rate limited", body = String),
        (status = 500, description = "Login unavailable", body = String)
    ),
    tag = "auth"
)]
pub async fn verify_totp(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    limiter: Extension<Arc<LoginRateLimiter>>,
    payload: Option<Json<VerifyTotpRequest>>,
) -> impl IntoResponse {
    let request: VerifyTotpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let client_ip = extract_client_ip(&headers);
    let attempt_id = match limiter.register_attempt(client_ip.as_deref()).await {
        Ok(attempt_id) => attempt_id,
        Err(err) => {
            info!("TOTP attempt throttled: {err}");
            return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
        }
    };

    let Ok(login_id) = Uuid::parse_str(request.login_id.trim()) else {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
    };

    // Single use: a failed code consumes the attempt and the client restarts
    // from the password step.
    let Some(attempt) = auth_state.flows().take(login_id).await else {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
    };

    // Submitting a code doubles as the "I scanned it" acknowledgment when
    // the attempt was still showing the QR.
    let stage = match attempt.stage {
        LoginStage::AwaitingEnrollmentAck => attempt.stage.on_enrollment_ack(),
        stage => stage,
    };
    if stage != LoginStage::AwaitingTotp {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
    }

    let admin = match repo::fetch_admin(&pool).await {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            error!("Administrator record is not provisioned");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
        Err(err) => {
            error!("Failed to fetch administrator record: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
    };

    let Some(secret) = admin.totp_secret.as_deref() else {
        // Password step passed but no secret exists, pending or otherwise;
        // the client skipped enrollment.
        return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
    };

    let outcome = match auth_state.totp().verify(secret, request.code.trim()) {
        Ok(true) => CodeOutcome::Valid,
        Ok(false) => CodeOutcome::Invalid,
        Err(err) => {
            error!("TOTP verification failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
    };

    if stage.on_totp(outcome) != LoginStage::Authenticated {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
    }

    // First valid code proves possession; commit the pending secret.
    if attempt.enrolling
        && let Err(err) = repo::confirm_totp_secret(&pool).await
    {
        error!("Failed to confirm TOTP secret: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Login failed".to_string(),
        )
            .into_response();
    }

    limiter.record_success(attempt_id).await;

    let ttl_seconds = auth_state.config().session_ttl_seconds();
    let token = match insert_session(&pool, credentials::ADMIN_ID, ttl_seconds).await {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
    };

    let mut response_headers = HeaderMap::new();
    match session_cookie(&auth_state, &token) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
    }

    (
        StatusCode::OK,
        response_headers,
        Json(SessionStatusResponse {
            authenticated: true,
        }),
    )
        .into_response()
}
