use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::state::AppState;

const ACCESS_TOKEN_TYPE: &str = "access";

/// Access-token claims issued by the account service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: Option<String>,
    pub token_type: String,
    pub exp: usize,
}

/// Identity of the caller, attached to the request by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: u64,
    pub role: String,
}

/// HS256 verifier for access tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    fn verify(&self, token: &str) -> Result<AuthUser, &'static str> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|_| "invalid token")?;
        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err("wrong token type");
        }
        Ok(AuthUser {
            user_id: data.claims.user_id,
            role: data.claims.role,
        })
    }
}

pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api") || path == "/api/health" {
        return next.run(req).await;
    }

    let Some(header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("authorization header is required");
    };
    let Some(token) = extract_bearer(header) else {
        return unauthorized("invalid authorization header format");
    };

    match state.jwt.verify(&token) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(message) => {
            tracing::debug!(reason = message, "Rejected access token");
            unauthorized(message)
        }
    }
}

fn extract_bearer(header: &HeaderValue) -> Option<String> {
    let value = header.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": message}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, token_type: &str, exp_offset: i64) -> String {
        let claims = Claims {
            user_id: 42,
            role: "user".to_string(),
            status: Some("active".to_string()),
            token_type: token_type.to_string(),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_verify_access_token() {
        let verifier = JwtVerifier::new("secret");
        let user = verifier.verify(&token("secret", "access", 600)).unwrap();
        assert_eq!(user, AuthUser { user_id: 42, role: "user".to_string() });
    }

    #[test]
    fn test_rejects_refresh_expired_and_foreign_tokens() {
        let verifier = JwtVerifier::new("secret");
        assert_eq!(verifier.verify(&token("secret", "refresh", 600)), Err("wrong token type"));
        assert_eq!(verifier.verify(&token("secret", "access", -3600)), Err("invalid token"));
        assert_eq!(verifier.verify(&token("other", "access", 600)), Err("invalid token"));
        assert_eq!(verifier.verify("garbage"), Err("invalid token"));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(
            extract_bearer(&HeaderValue::from_static("Bearer abc ")).as_deref(),
            Some("abc")
        );
        assert!(extract_bearer(&HeaderValue::from_static("Basic abc")).is_none());
        assert!(extract_bearer(&HeaderValue::from_static("Bearer  ")).is_none());
    }
}
