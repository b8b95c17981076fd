// JWT token generation and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;

use crate::auth::models::{parse_subject, Claims, Role};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token role {actual:?} does not match required role {expected}")]
    RoleMismatch {
        expected: Role,
        actual: Option<Role>,
    },

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Issues and verifies HS256 tokens for the three caller roles
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token with the role's default lifetime
    pub fn issue(&self, subject_id: i32, role: Role) -> Result<String, TokenError> {
        self.issue_with_ttl(subject_id, role, role.default_ttl())
    }

    pub fn issue_with_ttl(
        &self,
        subject_id: i32,
        role: Role,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Some(subject_id.to_string()),
            customer_id: None,
            role: Some(role),
            iat: now,
            exp: now + ttl.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Signature and expiry check only
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_)
                | ErrorKind::MissingRequiredClaim(_) => TokenError::Malformed,
                _ => TokenError::InvalidSignature,
            })
    }

    /// Full check against the role required by the call site.
    /// Returns the subject id from `sub`.
    pub fn verify(&self, token: &str, expected: Role) -> Result<i32, TokenError> {
        let claims = self.decode(token)?;

        if claims.role != Some(expected) {
            return Err(TokenError::RoleMismatch {
                expected,
                actual: claims.role,
            });
        }

        claims
            .sub
            .as_deref()
            .and_then(parse_subject)
            .ok_or(TokenError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_codec() -> TokenCodec {
        TokenCodec::new("test_secret_key_for_testing_purposes")
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Customer), Just(Role::Mechanic), Just(Role::Admin)]
    }

    #[test]
    fn test_claims_carry_role_and_ttl() {
        let codec = test_codec();

        let token = codec.issue(7, Role::Mechanic).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("7"));
        assert_eq!(claims.role, Some(Role::Mechanic));
        assert_eq!(claims.exp - claims.iat, 480 * 60);

        let token = codec.issue(7, Role::Customer).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 2 * 24 * 3600);
    }

    #[test]
    fn test_role_mismatch() {
        let codec = test_codec();
        let token = codec.issue(3, Role::Customer).unwrap();

        assert_eq!(
            codec.verify(&token, Role::Admin),
            Err(TokenError::RoleMismatch {
                expected: Role::Admin,
                actual: Some(Role::Customer),
            })
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = test_codec();
        let token = codec
            .issue_with_ttl(3, Role::Mechanic, Duration::seconds(-60))
            .unwrap();

        assert_eq!(codec.verify(&token, Role::Mechanic), Err(TokenError::Expired));
        assert_eq!(codec.decode(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenCodec::new("secret1");
        let verifier = TokenCodec::new("secret2");
        let token = issuer.issue(1, Role::Admin).unwrap();

        assert_eq!(
            verifier.verify(&token, Role::Admin),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = test_codec();
        let token = codec.issue(5, Role::Customer).unwrap();
        let admin = codec.issue(5, Role::Admin).unwrap();

        // customer header + signature around the admin payload
        let parts: Vec<&str> = token.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);

        assert_eq!(
            codec.verify(&forged, Role::Admin),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_non_numeric_subject_is_malformed() {
        let codec = test_codec();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Some("not-an-id".into()),
            customer_id: None,
            role: Some(Role::Customer),
            iat: now,
            exp: now + 60,
        };
        let token = encode(&Header::default(), &claims, &codec.encoding_key).unwrap();

        assert!(codec.decode(&token).is_ok());
        assert_eq!(codec.verify(&token, Role::Customer), Err(TokenError::Malformed));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = test_codec();

        assert!(codec.decode("").is_err());
        assert!(codec.decode("not.a.token").is_err());
        assert!(codec.decode("invalid_token_format").is_err());
        assert!(codec
            .decode("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature")
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_issue_then_verify_yields_subject(
            subject_id in 1i32..1_000_000,
            role in role_strategy()
        ) {
            let codec = test_codec();
            let token = codec.issue(subject_id, role)?;
            prop_assert_eq!(codec.verify(&token, role)?, subject_id);
        }

        #[test]
        fn prop_other_roles_are_mismatched(
            subject_id in 1i32..1_000_000,
            role in role_strategy(),
            other in role_strategy()
        ) {
            prop_assume!(role != other);
            let codec = test_codec();
            let token = codec.issue(subject_id, role)?;
            let is_mismatch = matches!(
                codec.verify(&token, other),
                Err(TokenError::RoleMismatch { .. })
            );
            prop_assert!(is_mismatch);
        }

        #[test]
        fn prop_random_strings_rejected(garbage in "[a-zA-Z0-9._-]{0,80}") {
            let codec = test_codec();
            prop_assert!(codec.decode(&garbage).is_err());
        }
    }
}
