use std::env;

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verifies an HS256 token and returns its subject.
pub fn verify_token(token: &str, secret: &str) -> Result<String, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::InvalidToken(e.to_string()),
    })?;
    Ok(data.claims.sub)
}

/// Reads the subject without checking the signature. Only valid behind an
/// API Gateway authorizer that has already verified the token.
pub fn decode_unverified(token: &str) -> Result<String, AuthError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::InvalidToken("token is not a JWT".into()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidToken(format!("bad payload encoding: {}", e)))?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidToken(format!("bad claims: {}", e)))?;

    if let Some(exp) = claims.exp {
        if (exp as i64) < Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }
    }
    Ok(claims.sub)
}

pub fn user_id_from_token(token: &str) -> Result<String, AuthError> {
    match env::var("JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => verify_token(token, &secret),
        _ => decode_unverified(token),
    }
}

/// Resolves the caller from the bearer token and stores the user id as an
/// `Extension<String>` for the handlers.
pub async fn auth_middleware(mut req: Request, next: Next) -> Response {
    let user_id = match bearer_token(req.headers())
        .ok_or(AuthError::MissingToken)
        .and_then(user_id_from_token)
    {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!("Rejecting request to {}: {}", req.uri(), e);
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": e.to_string() })),
            )
                .into_response();
        }
    };

    debug!("Authenticated user {}", user_id);
    req.extensions_mut().insert(user_id);
    next.run(req).await
}

#[cfg(any(test, feature = "test_utils"))]
pub const TEST_JWT_SECRET: &str = "test-secret";

/// Signs a token for `user_id` with `JWT_SECRET`, or the test secret when unset.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_token(user_id: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let secret = env::var("JWT_SECRET").unwrap_or_else(|_| TEST_JWT_SECRET.to_string());
    let claims = Claims {
        sub: user_id.to_string(),
        exp: Some((Utc::now().timestamp() + 3600) as usize),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to sign test token")
}

/// Builds an authenticated JSON request for router tests.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_request(
    method: &str,
    uri: &str,
    user_id: &str,
    body: Option<serde_json::Value>,
) -> axum::http::Request<axum::body::Body> {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", create_test_token(user_id)));
    build_json_request(builder, body)
}

/// Builds an unauthenticated JSON request for the public routes.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_public_request(
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> axum::http::Request<axum::body::Body> {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    build_json_request(builder, body)
}

#[cfg(any(test, feature = "test_utils"))]
fn build_json_request(
    builder: axum::http::request::Builder,
    body: Option<serde_json::Value>,
) -> axum::http::Request<axum::body::Body> {
    match body {
        Some(json) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .expect("failed to build test request"),
        None => builder
            .body(axum::body::Body::empty())
            .expect("failed to build test request"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    #[test]
    fn test_verify_token_round_trip() {
        let token = {
            use jsonwebtoken::{encode, EncodingKey, Header};
            let claims = Claims {
                sub: "host-1".to_string(),
                exp: Some((Utc::now().timestamp() + 60) as usize),
            };
            encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret(b"s3cret"),
            )
            .unwrap()
        };

        assert_eq!(verify_token(&token, "s3cret").unwrap(), "host-1");
        assert!(matches!(
            verify_token(&token, "wrong"),
            Err(AuthError::InvalidToken(_))
        ));
        assert_eq!(decode_unverified(&token).unwrap(), "host-1");
    }

    #[test]
    fn test_decode_unverified_rejects_garbage_and_expired() {
        assert!(decode_unverified("not-a-jwt").is_err());

        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"host-1","exp":1}"#);
        let token = format!("e30.{}.sig", payload);
        assert!(matches!(decode_unverified(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());
        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[tokio::test]
    async fn test_middleware_sets_user_extension() {
        let app = Router::new()
            .route(
                "/whoami",
                get(|Extension(user_id): Extension<String>| async move { user_id }),
            )
            .layer(middleware::from_fn(auth_middleware));

        let response = app
            .clone()
            .oneshot(create_test_request("GET", "/whoami", "host-1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(create_public_request("GET", "/whoami", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
