use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT authentication middleware. Verifies the bearer token and injects the
/// caller's `Identity` into request extensions; nothing downstream runs otherwise.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Non-UTF8 header values count as no credential
    let raw_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let identity = state.verifier.verify(raw_header).map_err(|e| {
        tracing::debug!(reason = %e, path = %request.uri().path(), "rejected unauthenticated request");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
