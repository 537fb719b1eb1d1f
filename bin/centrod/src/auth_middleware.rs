//! JWT authentication middleware.
//!
//! Extracts JWT from `Authorization: Bearer <token>`, validates it,
//! and provides `Claims` to downstream handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::bootstrap::ROOT_ROLE_ID;

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: "root" for the superadmin.
    pub sub: String,
    /// Display name.
    pub name: String,
    /// Roles assigned. Root has ["root"].
    #[serde(default)]
    pub roles: Vec<String>,
    /// Session id.
    pub sid: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Check if this user is the virtual root superadmin.
    pub fn is_root(&self) -> bool {
        self.roles.iter().any(|r| r == ROOT_ROLE_ID)
    }
}

/// Shared JWT configuration for the middleware.
#[derive(Clone)]
pub struct JwtState {
    pub decoding_key: DecodingKey,
    pub validation: Validation,
}

/// Error type for authentication failures.
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "missing authorization token".to_string(),
            AuthError::InvalidToken(e) => format!("invalid token: {}", e),
        };
        let body = serde_json::json!({
            "code": "UNAUTHENTICATED",
            "message": message,
        });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Middleware that extracts and validates JWT from the Authorization header.
///
/// If the request path is in the public list, the middleware passes through.
/// Otherwise, it requires a valid JWT and stores Claims in request extensions.
pub async fn auth_middleware(
    State(jwt_state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let path = request.uri().path().to_string();

    if is_public_path(&path) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let token_data =
        jsonwebtoken::decode::<Claims>(token, &jwt_state.decoding_key, &jwt_state.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    request.extensions_mut().insert(token_data.claims);

    Ok(next.run(request).await)
}

/// Check if a request path is public (no auth required).
pub fn is_public_path(path: &str) -> bool {
    matches!(path, "/health" | "/version") || path.starts_with("/auth/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/health"));
        assert!(is_public_path("/version"));
        assert!(is_public_path("/auth/login"));
        assert!(!is_public_path("/crm/customers"));
        assert!(!is_public_path("/"));
    }

    #[test]
    fn test_claims_roundtrip() {
        use jsonwebtoken::{EncodingKey, Header, decode, encode};

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "root".to_string(),
            name: "Root".to_string(),
            roles: vec![ROOT_ROLE_ID.to_string()],
            sid: "s1".to_string(),
            iat: now,
            exp: now + 3600,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, "root");
        assert!(decoded.claims.is_root());

        assert!(
            decode::<Claims>(
                &token,
                &DecodingKey::from_secret(b"other"),
                &Validation::default(),
            )
            .is_err()
        );
    }
}
