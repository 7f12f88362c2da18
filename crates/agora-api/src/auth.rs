//! Bearer-token guard for administrative routes

use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use crate::error::ApiError;
use crate::state::AppState;

/// The configured admin token, if any
#[derive(Clone, Default)]
pub struct AdminAuth {
    token: Option<String>,
}

impl std::fmt::Debug for AdminAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuth")
            .field("configured", &self.token.is_some())
            .finish()
    }
}

impl AdminAuth {
    /// Blank tokens count as unconfigured
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Extract the token from an `Authorization: Bearer ...` header value
    pub fn extract_from_header(header: &str) -> Result<&str, ApiError> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized("Invalid Authorization header format".to_string())
            })
    }

    /// Admin routes are closed entirely until a token is configured
    pub fn verify(&self, presented: Option<&str>) -> Result<(), ApiError> {
        let Some(expected) = self.token.as_deref() else {
            return Err(ApiError::Forbidden(
                "Admin routes are disabled: no admin token configured".to_string(),
            ));
        };
        let header = presented
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        let token = Self::extract_from_header(header)?;
        if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Invalid admin token".to_string()))
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extractor that admits only requests carrying the admin token
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        match state.admin().verify(presented) {
            Ok(()) => Ok(Admin),
            Err(e) => {
                tracing::warn!(path = %parts.uri.path(), error = %e, "Admin access denied");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_header() {
        assert_eq!(AdminAuth::extract_from_header("Bearer s3cret").unwrap(), "s3cret");
        assert!(AdminAuth::extract_from_header("Basic abc").is_err());
        assert!(AdminAuth::extract_from_header("Bearer   ").is_err());
    }

    #[test]
    fn test_unconfigured_is_forbidden() {
        let auth = AdminAuth::new(Some("  ".into()));
        assert!(!auth.is_configured());
        assert!(matches!(
            auth.verify(Some("Bearer anything")),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_verify_token() {
        let auth = AdminAuth::new(Some("s3cret".into()));
        assert!(auth.verify(Some("Bearer s3cret")).is_ok());
        assert!(matches!(auth.verify(Some("Bearer nope")), Err(ApiError::Unauthorized(_))));
        assert!(matches!(auth.verify(None), Err(ApiError::Unauthorized(_))));
    }
}
