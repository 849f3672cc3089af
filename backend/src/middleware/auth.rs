//! Authentication middleware
//!
//! Bearer JWT validation and the branch access policy derived from its claims

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared::models::Branch;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Role carried in the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    CompanyAdmin,
    InstitutionAdmin,
    BranchAdmin,
    Staff,
    Parent,
}

/// What a caller wants to do with a branch's inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Manage,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub role: Role,
    #[serde(default)]
    pub institution_id: Option<Uuid>,
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub institution_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
}

impl AuthUser {
    /// Whether this user may perform `access` on `branch`
    pub fn can_access(&self, branch: &Branch, access: Access) -> bool {
        match self.role {
            Role::CompanyAdmin => true,
            Role::InstitutionAdmin => self.institution_id == Some(branch.institution_id),
            Role::BranchAdmin => self.branch_id == Some(branch.id),
            Role::Staff => access == Access::Read && self.branch_id == Some(branch.id),
            Role::Parent => false,
        }
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;

        Ok(Self {
            user_id,
            role: claims.role,
            institution_id: claims.institution_id,
            branch_id: claims.branch_id,
        })
    }
}

/// Decode and validate JWT token
pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

/// Authentication middleware that validates the bearer token and stores the
/// caller as an [`AuthUser`] request extension
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(|| {
        AppError::Unauthorized("Missing or invalid Authorization header".to_string())
    })?;

    let claims = decode_token(bearer.token(), &state.config.jwt.secret)?;
    let auth_user = AuthUser::try_from(claims)?;

    tracing::debug!(user_id = %auth_user.user_id, role = ?auth_user.role, "request authenticated");
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
