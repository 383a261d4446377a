//! Staff JWT authentication for the management API
//!
//! Tokens are issued by the shop back office; this service only verifies
//! them. Every staff query is scoped by the token's `shop_id`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// JWT claims for staff authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct StaffClaims {
    /// Staff user ID
    pub sub: i64,
    /// Shop the staff member works for
    pub shop_id: i64,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated staff identity extracted from JWT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffIdentity {
    pub user_id: i64,
    pub shop_id: i64,
}

const JWT_EXPIRY_HOURS: i64 = 12;

/// Create a staff token (back office, tests and local tooling)
pub fn create_token(
    user_id: i64,
    shop_id: i64,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = StaffClaims {
        sub: user_id,
        shop_id,
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Middleware that extracts and verifies the staff JWT from the Authorization header
pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::TokenInvalid, "Invalid Authorization format")
        })?;

    let token_data = jsonwebtoken::decode::<StaffClaims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::new(ErrorCode::TokenExpired)
            }
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })?;

    request.extensions_mut().insert(StaffIdentity {
        user_id: token_data.claims.sub,
        shop_id: token_data.claims.shop_id,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = create_token(7, 42, "secret").unwrap();
        let data = jsonwebtoken::decode::<StaffClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, 7);
        assert_eq!(data.claims.shop_id, 42);

        let wrong = jsonwebtoken::decode::<StaffClaims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::default(),
        );
        assert!(wrong.is_err());
    }
}
