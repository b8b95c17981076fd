// Authentication service - credential checks and token issuance

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{
    error::AuthError,
    models::{
        AdminLoginResponse, AdminSummary, CustomerLoginResponse, MechanicLoginResponse, Role,
        ADMIN_ID,
    },
    password::PasswordService,
    token::TokenCodec,
};
use crate::config::AdminCredentials;
use crate::customers::models::normalize_email;
use crate::customers::CustomerRepository;
use crate::error::ApiError;
use crate::mechanics::MechanicRepository;

const TOKEN_TYPE: &str = "Bearer";
const INVALID_LOGIN: &str = "Invalid email or password.";
const INVALID_ADMIN_LOGIN: &str = "Invalid admin credentials.";

/// Authentication service for the three login flows
pub struct AuthService {
    customers: CustomerRepository,
    mechanics: MechanicRepository,
    codec: Arc<TokenCodec>,
    admin_username: String,
    admin_password_hash: String,
}

impl AuthService {
    /// Hashes the configured admin password once at startup
    pub fn new(
        customers: CustomerRepository,
        mechanics: MechanicRepository,
        codec: Arc<TokenCodec>,
        admin: &AdminCredentials,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            customers,
            mechanics,
            codec,
            admin_username: admin.username.clone(),
            admin_password_hash: PasswordService::hash_password(&admin.password)?,
        })
    }

    fn issue(&self, id: i32, role: Role) -> Result<(String, i64), AuthError> {
        let ttl = role.default_ttl();
        let token = self.codec.issue_with_ttl(id, role, ttl)?;
        Ok((token, ttl.num_seconds()))
    }

    /// Unknown email and wrong password fail the same way
    pub async fn login_customer(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerLoginResponse, ApiError> {
        let email = normalize_email(email);
        let customer = match self.customers.find_by_email(&email).await? {
            Some(customer) => customer,
            None => {
                warn!("Customer login failed: unknown email {}", email);
                return Err(AuthError::InvalidCredentials(INVALID_LOGIN).into());
            }
        };
        if !PasswordService::verify_password(password, &customer.password_hash)? {
            warn!("Customer login failed: wrong password for {}", customer.id);
            return Err(AuthError::InvalidCredentials(INVALID_LOGIN).into());
        }

        let (token, expires_in) = self.issue(customer.id, Role::Customer)?;
        info!("Customer {} logged in", customer.id);

        Ok(CustomerLoginResponse {
            message: "Login successful".to_string(),
            token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in,
            customer: (&customer).into(),
        })
    }

    pub async fn login_mechanic(
        &self,
        email: &str,
        password: &str,
    ) -> Result<MechanicLoginResponse, ApiError> {
        let email = normalize_email(email);
        let mechanic = match self.mechanics.find_by_email(&email).await? {
            Some(mechanic) => mechanic,
            None => {
                warn!("Mechanic login failed: unknown email {}", email);
                return Err(AuthError::InvalidCredentials(INVALID_LOGIN).into());
            }
        };
        if !PasswordService::verify_password(password, &mechanic.password_hash)? {
            warn!("Mechanic login failed: wrong password for {}", mechanic.id);
            return Err(AuthError::InvalidCredentials(INVALID_LOGIN).into());
        }

        let (token, expires_in) = self.issue(mechanic.id, Role::Mechanic)?;
        info!("Mechanic {} logged in", mechanic.id);

        Ok(MechanicLoginResponse {
            message: "Login successful".to_string(),
            token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in,
            mechanic: (&mechanic).into(),
        })
    }

    /// Checks against the configured admin account; no database access
    pub fn login_admin(&self, username: &str, password: &str) -> Result<AdminLoginResponse, AuthError> {
        let password_ok = PasswordService::verify_password(password, &self.admin_password_hash)?;
        if username != self.admin_username || !password_ok {
            warn!("Admin login failed for username {}", username);
            return Err(AuthError::InvalidCredentials(INVALID_ADMIN_LOGIN));
        }

        let (token, expires_in) = self.issue(ADMIN_ID, Role::Admin)?;
        info!("Admin {} logged in", self.admin_username);

        Ok(AdminLoginResponse {
            message: "Admin login successful".to_string(),
            token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in,
            admin: AdminSummary {
                id: ADMIN_ID,
                username: self.admin_username.clone(),
                role: Role::Admin,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    fn service() -> (AuthService, Arc<TokenCodec>) {
        // Never connects: the admin flow does not touch the database
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .unwrap();
        let codec = Arc::new(TokenCodec::new(SECRET));
        let admin = AdminCredentials {
            username: "admin".into(),
            password: "admin123".into(),
        };
        let service = AuthService::new(
            CustomerRepository::new(pool.clone()),
            MechanicRepository::new(pool),
            codec.clone(),
            &admin,
        )
        .unwrap();
        (service, codec)
    }

    #[tokio::test]
    async fn test_admin_login_issues_admin_token() {
        let (service, codec) = service();
        let response = service.login_admin("admin", "admin123").unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 12 * 60 * 60);
        assert_eq!(response.admin.id, ADMIN_ID);
        assert_eq!(codec.verify(&response.token, Role::Admin), Ok(ADMIN_ID));
    }

    #[tokio::test]
    async fn test_admin_login_rejects_bad_credentials() {
        let (service, _) = service();
        assert!(matches!(
            service.login_admin("admin", "wrong"),
            Err(AuthError::InvalidCredentials(INVALID_ADMIN_LOGIN))
        ));
        assert!(matches!(
            service.login_admin("root", "admin123"),
            Err(AuthError::InvalidCredentials(_))
        ));
    }
}
