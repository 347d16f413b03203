//! Password step of the login flow.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};

use super::{
    machine::{LoginStage, PasswordOutcome},
    rate_limit::LoginRateLimiter,
    state::AuthState,
    types::{PasswordLoginRequest, PasswordLoginResponse},
    utils::extract_client_ip,
};
use crate::credentials::{password::verify_password, repo};

#[utoipa::path(
    post,
    path = "/v1/auth/password",
    request_body = PasswordLoginRequest,
    responses(
        (status = 200, description = "Password accepted; continue with enrollment or a TOTP code", body = PasswordLoginResponse),
        (status = 401, description = "Invalid credentials", body = String),
        (status = 429, description = "Rate limited", body = String),
        (status = 500, description = "Login unavailable", body = String)
    ),
    tag = "auth"
)]
pub async fn password_login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    limiter: Extension<Arc<LoginRateLimiter>>,
    payload: Option<Json<PasswordLoginRequest>>,
) -> impl IntoResponse {
    let request: PasswordLoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let client_ip = extract_client_ip(&headers);
    let attempt_id = match limiter.register_attempt(client_ip.as_deref()).await {
        Ok(attempt_id) => attempt_id,
        Err(err) => {
            info!("Password attempt throttled: {err}");
            return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
        }
    };

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

    let outcome = match verify_password(&request.password, &admin.password_hash) {
        Ok(true) => PasswordOutcome::Match,
        Ok(false) => PasswordOutcome::Mismatch,
        Err(err) => {
            error!("Password verification failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
    };

    let enrolled = admin.has_totp_secret();
    let stage = LoginStage::AwaitingPassword.on_password(outcome, enrolled);
    if stage == LoginStage::Rejected {
        // Generic message; do not reveal which factor failed.
        return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
    }

    // The password alone does not finish the login, but it is a well-formed
    // attempt; the TOTP step registers its own.
    limiter.record_success(attempt_id).await;

    let is_first_login = !enrolled;
    let login_id = auth_state.flows().store(stage, is_first_login).await;

    (
        StatusCode::OK,
        Json(PasswordLoginResponse {
            is_first_login,
            login_id: login_id.to_string(),
        }),
    )
        .into_response()
}
