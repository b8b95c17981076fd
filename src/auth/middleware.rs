// Role guards for protected routes
//
// Each guard is an extractor: it reads the bearer token, checks it with the
// shared TokenCodec and hands the verified identity to the handler.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use crate::auth::{
    error::AuthError,
    models::{parse_subject, Claims, Role},
    token::TokenCodec,
};

/// Extract the token from `Authorization: Bearer <token>`.
/// A token wrapped in double quotes is unwrapped.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorization)?
        .trim();

    let token = if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        &token[1..token.len() - 1]
    } else {
        token
    };

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }
    Ok(token.to_string())
}

/// Role required by a `RoleGuard`
pub trait RequiredRole: Send + Sync + 'static {
    const ROLE: Role;
}

#[derive(Debug, Clone, Copy)]
pub struct CustomerRole;
#[derive(Debug, Clone, Copy)]
pub struct MechanicRole;
#[derive(Debug, Clone, Copy)]
pub struct AdminRole;

impl RequiredRole for CustomerRole {
    const ROLE: Role = Role::Customer;
}

impl RequiredRole for MechanicRole {
    const ROLE: Role = Role::Mechanic;
}

impl RequiredRole for AdminRole {
    const ROLE: Role = Role::Admin;
}

/// Caller verified to hold role `R`; `id` is the token subject
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard<R> {
    pub id: i32,
    _role: PhantomData<fn() -> R>,
}

impl<R: RequiredRole> RoleGuard<R> {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            _role: PhantomData,
        }
    }
}

pub type CustomerAuth = RoleGuard<CustomerRole>;
pub type MechanicAuth = RoleGuard<MechanicRole>;
pub type AdminAuth = RoleGuard<AdminRole>;

#[async_trait]
impl<S, R> FromRequestParts<S> for RoleGuard<R>
where
    Arc<TokenCodec>: FromRef<S>,
    S: Send + Sync,
    R: RequiredRole,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = Arc::<TokenCodec>::from_ref(state);
        let token = bearer_token(&parts.headers).map_err(|e| {
            warn!("Rejected request to {}: {}", parts.uri.path(), e);
            e
        })?;

        let id = codec.verify(&token, R::ROLE).map_err(|e| {
            warn!(
                "Token rejected for {} ({} required): {}",
                parts.uri.path(),
                R::ROLE,
                e
            );
            AuthError::from(e)
        })?;

        debug!("Authorized {} {} for {}", R::ROLE, id, parts.uri.path());
        Ok(Self::new(id))
    }
}

/// Verified identity with its role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: i32,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_mechanic(&self) -> bool {
        self.role == Role::Mechanic
    }
}

/// Admin or mechanic caller; customer tokens are refused with 403
#[derive(Debug, Clone, Copy)]
pub struct StaffCaller(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for StaffCaller
where
    Arc<TokenCodec>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = Arc::<TokenCodec>::from_ref(state);
        let token = bearer_token(&parts.headers)?;
        let claims = codec.decode(&token).map_err(|e| {
            warn!("Token rejected for {}: {}", parts.uri.path(), e);
            AuthError::from(e)
        })?;

        let role = match claims.role {
            Some(role @ (Role::Admin | Role::Mechanic)) => role,
            other => return Err(AuthError::insufficient("Admin or mechanic", other)),
        };
        let id = claims
            .sub
            .as_deref()
            .and_then(parse_subject)
            .ok_or(AuthError::InvalidToken)?;

        Ok(StaffCaller(Caller { id, role }))
    }
}

/// Any token that decodes, without a role check
#[derive(Debug, Clone)]
pub struct AnyCaller {
    pub subject_id: Option<i32>,
    pub claims: Claims,
}

#[async_trait]
impl<S> FromRequestParts<S> for AnyCaller
where
    Arc<TokenCodec>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = Arc::<TokenCodec>::from_ref(state);
        let token = bearer_token(&parts.headers)?;
        let claims = codec.decode(&token).map_err(AuthError::from)?;

        Ok(AnyCaller {
            subject_id: claims.subject_id(),
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(SECRET))
    }

    fn parts_with_auth(auth_value: &str) -> Parts {
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, auth_value)
            .body(())
            .unwrap();
        req.into_parts().0
    }

    fn parts_without_auth() -> Parts {
        let req = Request::builder().uri("/").body(()).unwrap();
        req.into_parts().0
    }

    fn bearer(codec: &TokenCodec, id: i32, role: Role) -> String {
        format!("Bearer {}", codec.issue(id, role).unwrap())
    }

    #[tokio::test]
    async fn test_role_guard_accepts_matching_role() {
        let state = codec();
        let mut parts = parts_with_auth(&bearer(&state, 42, Role::Mechanic));

        let guard = MechanicAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(guard.id, 42);
    }

    #[tokio::test]
    async fn test_role_guard_rejects_other_role_with_403() {
        let state = codec();
        let mut parts = parts_with_auth(&bearer(&state, 42, Role::Customer));

        let err = AdminAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::InsufficientRole {
                actual: Some(Role::Customer),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_header() {
        let state = codec();
        let mut parts = parts_without_auth();

        let err = CustomerAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_invalid_bearer_format() {
        let state = codec();
        for auth_value in ["InvalidFormat token", "token_without_bearer", "Basic dXNlcjpwYXNz", "Bearer ", "Bearer \"\""] {
            let mut parts = parts_with_auth(auth_value);
            let err = CustomerAuth::from_request_parts(&mut parts, &state)
                .await
                .unwrap_err();
            assert!(
                matches!(err, AuthError::InvalidAuthorization),
                "{} gave {:?}",
                auth_value,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_quoted_token_accepted() {
        let state = codec();
        let token = state.issue(5, Role::Customer).unwrap();
        let mut parts = parts_with_auth(&format!("Bearer \"{}\"", token));

        let guard = CustomerAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(guard.id, 5);
    }

    #[tokio::test]
    async fn test_expired_token_is_401() {
        let state = codec();
        let token = state
            .issue_with_ttl(1, Role::Admin, Duration::seconds(-500))
            .unwrap();
        let mut parts = parts_with_auth(&format!("Bearer {}", token));

        let err = AdminAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[tokio::test]
    async fn test_malformed_tokens_rejected() {
        let state = codec();
        for token in [
            "Bearer invalid_token",
            "Bearer not.a.valid.jwt",
            "Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature",
        ] {
            let mut parts = parts_with_auth(token);
            let err = MechanicAuth::from_request_parts(&mut parts, &state)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidToken));
        }
    }

    #[tokio::test]
    async fn test_staff_caller_roles() {
        let state = codec();

        let mut parts = parts_with_auth(&bearer(&state, 1, Role::Admin));
        let StaffCaller(admin) = StaffCaller::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(admin.is_admin());

        let mut parts = parts_with_auth(&bearer(&state, 9, Role::Mechanic));
        let StaffCaller(mechanic) = StaffCaller::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(mechanic, Caller { id: 9, role: Role::Mechanic });

        let mut parts = parts_with_auth(&bearer(&state, 9, Role::Customer));
        let err = StaffCaller::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InsufficientRole { .. }));
    }

    #[tokio::test]
    async fn test_any_caller_accepts_legacy_claims() {
        let state = codec();
        let now = Utc::now().timestamp();
        let legacy = serde_json::json!({ "customer_id": 12, "iat": now, "exp": now + 60 });
        let token = encode(
            &Header::default(),
            &legacy,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let mut parts = parts_with_auth(&format!("Bearer {}", token));
        let caller = AnyCaller::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(caller.subject_id, Some(12));
        assert_eq!(caller.claims.role, None);

        // role-bound guards refuse the same token
        let mut parts = parts_with_auth(&format!("Bearer {}", token));
        assert!(CustomerAuth::from_request_parts(&mut parts, &state)
            .await
            .is_err());
    }

    #[test]
    fn test_bearer_token_trims_whitespace() {
        let parts = parts_with_auth("Bearer   abc.def.ghi  ");
        assert_eq!(bearer_token(&parts.headers).unwrap(), "abc.def.ghi");
    }
}
