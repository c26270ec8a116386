use axum::{extract::Extension, Json};
use serde_json::{json, Value};

use shared_models::auth::Identity;
use shared_models::error::AppError;

/// Return the caller's resolved identity. The actual resolution (and
/// first-login record creation) happens in the auth middleware, so by the
/// time this handler runs the identity is already persisted.
#[axum::debug_handler]
pub async fn resolve_identity(
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({ "identity": identity })))
}
