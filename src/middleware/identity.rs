// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Caller identity middleware.
//!
//! The caller is named by the `X-User-Id` header. There is no session or
//! credential check; the header only has to name an existing, active user.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> u64 {
        self.user.id
    }
}

/// User id named by the request headers, if any.
pub fn caller_id(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Middleware that requires an existing, active user.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = caller_id(request.headers()).ok_or(AppError::Unauthorized)?;

    let now = crate::time_utils::now_rfc3339();
    let user = state
        .db
        .update_user(user_id, |u| u.last_active = now)
        .ok_or(AppError::Unauthorized)?;

    if user.is_suspended() {
        tracing::warn!(user_id, "Blocked request from suspended user");
        return Err(AppError::Forbidden("Account is suspended".to_string()));
    }

    request.extensions_mut().insert(AuthUser { user });

    Ok(next.run(request).await)
}

/// Middleware that requires the user resolved by [`require_user`] to be an admin.
///
/// Must be layered inside `require_user`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;

    if !auth_user.user.is_admin() {
        tracing::warn!(
            user_id = auth_user.id(),
            path = %request.uri().path(),
            "Blocked admin request from non-admin user"
        );
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_caller_id_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_id(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" 42 "));
        assert_eq!(caller_id(&headers), Some(42));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(caller_id(&headers), None);
    }
}
