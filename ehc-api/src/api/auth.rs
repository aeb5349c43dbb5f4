//! Role-gating middleware
//!
//! The fronting auth layer forwards the signed-in user's email in the
//! `x-user-email` header. Roles come from the active admin and staff
//! directories, never from the request.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use ehc_common::roles::lookup_role;
use ehc_common::Role;
use tracing::debug;

use crate::{ApiError, AppState};

/// Header carrying the caller's email
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Authenticated caller, inserted as a request extension by the gates below
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Caller email from the request headers, lowercased; blank counts as absent
pub fn caller_email(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
}

async fn authorize(
    state: &AppState,
    mut request: Request,
    next: Next,
    minimum: Role,
) -> Result<Response, ApiError> {
    let email = caller_email(request.headers()).ok_or(ApiError::Unauthorized)?;
    let role = lookup_role(&state.db, &email).await?;

    if role < minimum {
        debug!(email = %email, role = %role, required = %minimum, "Access denied");
        let message = match minimum {
            Role::Admin => "Admin access required",
            _ => "Staff access required",
        };
        return Err(ApiError::Forbidden(message.to_string()));
    }

    request.extensions_mut().insert(CurrentUser { email, role });
    Ok(next.run(request).await)
}

/// Allow active staff and admins; 401 without identity, 403 otherwise
pub async fn require_staff_or_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, request, next, Role::Staff).await
}

/// Allow active admins only; 401 without identity, 403 otherwise
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, request, next, Role::Admin).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_caller_email() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_email(&headers), None);

        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("  "));
        assert_eq!(caller_email(&headers), None);

        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static(" Pro@Club.Example "));
        assert_eq!(caller_email(&headers).as_deref(), Some("pro@club.example"));
    }
}
