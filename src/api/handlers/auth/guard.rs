//! Route guard for admin-only paths.
//!
//! Runs as middleware ahead of every protected handler: it resolves the
//! session token and either attaches the subject to the request or stops
//! the request cold. Browser navigations get a redirect to the login page;
//! API calls get a plain 401.

use axum::{
    extract::{Extension, Request},
    http::{HeaderMap, StatusCode, header::ACCEPT},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;
use std::sync::Arc;

use super::{session::authenticate_session, state::AuthState};

/// Subject attached to the request once the guard has passed.
#[derive(Clone, Debug)]
pub struct AdminContext {
    pub subject: String,
}

/// Reject the request unless it carries a valid session.
pub async fn require_session(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate_session(request.headers(), &pool).await {
        Ok(Some(record)) => {
            request.extensions_mut().insert(AdminContext {
                subject: record.subject,
            });
            next.run(request).await
        }
        // Missing, invalid, and expired tokens are indistinguishable here.
        Ok(None) => deny(request.headers(), &auth_state),
        Err(status) => status.into_response(),
    }
}

fn deny(headers: &HeaderMap, auth_state: &AuthState) -> Response {
    if wants_html(headers) {
        Redirect::to(&auth_state.config().login_url()).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

/// Browser navigations advertise `text/html`; programmatic clients do not.
fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn browser_accept_header_is_detected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        assert!(wants_html(&headers));
    }

    #[test]
    fn api_accept_header_is_not_html() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!wants_html(&headers));
        assert!(!wants_html(&HeaderMap::new()));
    }

    #[test]
    fn deny_redirects_browsers_to_login() {
        use crate::api::handlers::auth::state::{AuthConfig, AuthState};

        let state = AuthState::new(AuthConfig::new("https://atelier.dev".to_string()));
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let response = deny(&headers, &state);
        assert!(response.status().is_redirection());
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|value| value.to_str().ok()),
            Some("https://atelier.dev/admin/login")
        );

        let response = deny(&HeaderMap::new(), &state);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
