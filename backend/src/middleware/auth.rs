//! Authentication middleware
//!
//! JWT authentication and farmer/consumer access checks

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::{decode_access_token, Claims};
use crate::AppState;
use shared::UserType;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub user_type: UserType,
}

impl AuthUser {
    pub fn is_farmer(&self) -> bool {
        self.user_type.is_farmer()
    }

    /// Fail unless the user is a farmer
    pub fn require_farmer(&self) -> AppResult<()> {
        if self.is_farmer() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only farmers can perform this action".to_string(),
            ))
        }
    }

    /// Fail unless the user is a consumer
    pub fn require_consumer(&self) -> AppResult<()> {
        if self.user_type == UserType::Consumer {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only consumers can perform this action".to_string(),
            ))
        }
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;
        let profile_id = Uuid::parse_str(&claims.profile_id)
            .map_err(|_| AppError::Unauthorized("Invalid profile ID in token".to_string()))?;

        Ok(AuthUser {
            user_id,
            profile_id,
            user_type: claims.user_type,
        })
    }
}

/// Authentication middleware that requires a valid bearer token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token,
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response()
        }
    };

    match authenticate(&state, token) {
        Ok(auth_user) => {
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Attaches the user when a valid token is present; anonymous requests pass through
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&request) {
        match authenticate(&state, token) {
            Ok(auth_user) => {
                request.extensions_mut().insert(auth_user);
            }
            Err(e) => tracing::debug!("Ignoring invalid token on public route: {}", e),
        }
    }
    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let claims = decode_access_token(&state.config.jwt.secret, token)?;
    AuthUser::try_from(claims)
}

/// Extractor for authenticated user
/// Use this in handlers behind `auth_middleware`
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor for routes that serve both anonymous and signed-in users
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
