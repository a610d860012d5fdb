use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::typed_header::TypedHeaderRejection;
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use rokadan_shared::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// HS256 token claims. `sub` is the user id; roles are never read from the
/// token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: UserId,
    pub exp: usize,
}

/// The authenticated requester, inserted into request extensions
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // missing and malformed headers are both a 401
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|e| {
        AppError::AuthenticationError(if e.is_missing() {
            "Missing bearer token".to_string()
        } else {
            "Malformed authorization header".to_string()
        })
    })?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;

    req.extensions_mut().insert(AuthUser(token_data.claims.sub));

    Ok(next.run(req).await)
}
