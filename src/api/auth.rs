//! Admin Authentication
//!
//! HTTP Basic Auth against the single configured admin credential.
//!
//! - [`AdminUser`]: extractor for write routes, rejects with 401 + challenge
//! - [`MaybeAdmin`]: extractor for read routes that only want to know
//! - `GET /login` - forces the browser prompt, then redirects home
//! - `GET /logout-clear` - answers 401 under a fresh realm so the browser
//!   forgets the cached credential
//!
//! There is no session state; the browser resends the credential.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use std::convert::Infallible;
use std::sync::Arc;

use crate::api::dto::SessionResponse;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::config::AuthConfig;

/// An authenticated admin; holds the username
#[derive(Debug, Clone)]
pub struct AdminUser(pub String);

/// The admin username when valid credentials were sent, otherwise None
#[derive(Debug, Clone)]
pub struct MaybeAdmin(pub Option<String>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(&parts.headers, &state.auth) {
            Some(username) => Ok(AdminUser(username)),
            None => Err(ApiError::Unauthorized {
                realm: state.auth.realm.clone(),
            }),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAdmin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAdmin(authenticate(&parts.headers, &state.auth)))
    }
}

/// Check the Authorization header against the configured credential.
///
/// Missing, malformed, or non-Basic headers count as unauthenticated.
pub fn authenticate(headers: &HeaderMap, auth: &AuthConfig) -> Option<String> {
    let (username, password) = basic_credentials(headers)?;

    // Evaluate both comparisons so timing does not reveal which one failed
    let user_ok = constant_time_eq(username.as_bytes(), auth.username.as_bytes());
    let pass_ok = constant_time_eq(password.as_bytes(), auth.password.as_bytes());

    if user_ok & pass_ok {
        Some(username)
    } else {
        None
    }
}

/// Decode `Authorization: Basic <base64(user:pass)>`
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// GET /login
///
/// Triggers the Basic Auth prompt; once the browser supplies valid
/// credentials, sends the admin back to the dashboard.
pub async fn login(AdminUser(username): AdminUser) -> Redirect {
    tracing::info!(user = %username, "Admin logged in");
    Redirect::to("/")
}

/// GET /logout-clear
///
/// Always 401. The realm is unique per call, which makes browsers drop the
/// credential they cached for the real realm.
pub async fn logout_clear() -> Response {
    let realm = format!("Basic realm=\"Logout-{}\"", Utc::now().timestamp());

    let mut response = (StatusCode::UNAUTHORIZED, "Credentials cleared").into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&realm) {
        headers.insert(header::WWW_AUTHENTICATE, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

/// GET /api/session
///
/// Lets the static pages decide whether to show admin controls.
pub async fn session(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(user): MaybeAdmin,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        is_admin: user.is_some(),
        current_user: user,
        realm: state.auth.realm.clone(),
    })
}
