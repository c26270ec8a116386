use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::services::resolver::IdentityResolverService;
use crate::IdentityState;

/// Authentication middleware: validates the bearer token, resolves the
/// principal to a persisted identity, and stores that identity in the request
/// extensions. If resolution cannot be persisted the request fails here;
/// no handler ever sees an unresolved or guessed role.
pub async fn identity_middleware(
    State(state): State<Arc<IdentityState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    let principal = validate_token(token, &state.config.jwt_secret).map_err(AppError::Auth)?;

    let resolver = IdentityResolverService::new(&state);
    let identity = resolver
        .resolve(&principal)
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
