use axum::{
    extract::{FromRequest, FromRequestParts, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tracing::debug;

use shared_models::auth::Identity;
use shared_models::error::AppError;

use crate::jwt::validate_token;
use crate::state::AppState;

/// JSON body extractor whose rejections become 400 validation errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections become 400 validation errors.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    if headers.get(http::header::AUTHORIZATION).is_none() {
        return Err(AppError::Auth("Missing authorization header".to_string()));
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

/// Resolves the caller's identity when a valid bearer token is present.
/// Absent or invalid tokens both read as "unauthenticated".
pub fn resolve_identity(headers: &HeaderMap, jwt_secret: &str) -> Option<Identity> {
    let token = extract_bearer_token(headers).ok()?;
    match validate_token(&token, jwt_secret) {
        Ok(identity) => Some(identity),
        Err(e) => {
            debug!("Ignoring invalid session token: {}", e);
            None
        }
    }
}

/// Rejects requests without a valid session token and stores the
/// resulting `Identity` in request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;

    let identity = validate_token(&token, &state.config.identity_jwt_secret)
        .map_err(AppError::Auth)?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_and_malformed_headers_are_auth_errors() {
        let headers = HeaderMap::new();
        assert_matches!(
            extract_bearer_token(&headers),
            Err(AppError::Auth(msg)) if msg == "Missing authorization header"
        );

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert_matches!(
            extract_bearer_token(&headers),
            Err(AppError::Auth(msg)) if msg == "Invalid authorization header format"
        );
    }

    #[test]
    fn resolve_identity_treats_bad_tokens_as_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer not-a-jwt"));
        assert!(resolve_identity(&headers, "secret").is_none());
        assert!(resolve_identity(&HeaderMap::new(), "secret").is_none());
    }
}
