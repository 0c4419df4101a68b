//! Access gate middleware.
//! Checks the shared basic-auth credential before any gateway route runs.
//!
//! The gate either forwards the request unchanged or answers it itself; the
//! gateway and store never see credentials or rejected requests.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use signage_core::AccessConfig;
use std::sync::Arc;
use tracing::warn;

use crate::response::ApiError;

/// Outcome of checking a request's credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Credentials match
    Allow,
    /// No basic-auth credentials presented
    Challenge,
    /// Credentials presented but wrong or malformed
    Deny,
}

/// Shared-credential gate
#[derive(Clone)]
pub struct AccessGate {
    username: String,
    password: String,
}

impl AccessGate {
    /// Create a gate from configuration
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Check the `Authorization` header
    pub fn check(&self, headers: &HeaderMap) -> GateDecision {
        let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        else {
            return GateDecision::Challenge;
        };

        let Some(encoded) = value.strip_prefix("Basic ") else {
            return GateDecision::Challenge;
        };

        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return GateDecision::Deny;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return GateDecision::Deny;
        };
        let Some((username, password)) = decoded.split_once(':') else {
            return GateDecision::Deny;
        };

        // Evaluate both halves so timing does not reveal which one matched.
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        if user_ok & pass_ok {
            GateDecision::Allow
        } else {
            GateDecision::Deny
        }
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn access_gate_middleware(
    State(gate): State<Arc<AccessGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match gate.check(request.headers()) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Challenge => {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Missing credentials"
            );
            ApiError::Unauthorized.into_response()
        }
        GateDecision::Deny => {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected credentials"
            );
            ApiError::Forbidden.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> AccessGate {
        AccessGate::new(&AccessConfig::new("admin", "s3:cret"))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn basic(user_pass: &str) -> HeaderMap {
        headers_with(&format!("Basic {}", STANDARD.encode(user_pass)))
    }

    #[test]
    fn matching_credentials_are_allowed() {
        assert_eq!(gate().check(&basic("admin:s3:cret")), GateDecision::Allow);
    }

    #[test]
    fn missing_or_non_basic_header_is_challenged() {
        assert_eq!(gate().check(&HeaderMap::new()), GateDecision::Challenge);
        assert_eq!(gate().check(&headers_with("Bearer abc")), GateDecision::Challenge);
    }

    #[test]
    fn wrong_or_malformed_credentials_are_denied() {
        assert_eq!(gate().check(&basic("admin:wrong")), GateDecision::Deny);
        assert_eq!(gate().check(&basic("root:s3:cret")), GateDecision::Deny);
        assert_eq!(gate().check(&basic("admin")), GateDecision::Deny);
        assert_eq!(gate().check(&basic("admin:s3")), GateDecision::Deny);
        assert_eq!(gate().check(&headers_with("Basic !!!not-base64")), GateDecision::Deny);
    }

    #[test]
    fn debug_output_hides_password() {
        assert!(!format!("{:?}", gate()).contains("s3:cret"));
    }
}
