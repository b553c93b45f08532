use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{validate_jwt, ActingUser};
use crate::error::ApiError;

/// Resolve the acting user from a bearer token, if one was sent.
///
/// Requests without an Authorization header pass through anonymously; a
/// header that is malformed or carries an invalid token is rejected with 401.
pub async fn acting_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_jwt_from_headers(request.headers())? {
        let claims = validate_jwt(&token, &state.security.jwt_secret)?;
        let user = ActingUser::from(claims);
        tracing::debug!("Request acting as user {} ({})", user.name, user.id);
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err(ApiError::unauthorized("Empty JWT token")),
        Some(token) => Ok(Some(token.trim().to_string())),
        None => Err(ApiError::unauthorized("Authorization header must use Bearer token format")),
    }
}
