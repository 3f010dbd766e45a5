//! Account service for Quill
//!
//! This module provides:
//! - User registration with Argon2id password hashing
//! - Login issuing a signed identity token
//! - Profile lookup and status updates for the signed-in user

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, FieldError};
use crate::models::{Identity, NewUser, User};
use crate::repositories::utils::normalize_email;
use crate::repositories::DynUserRepository;
use crate::services::policy::{self, Operation};
use crate::services::token::TokenService;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length of names and status lines
pub const MAX_TEXT_LENGTH: usize = 255;

/// Registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
}

/// Registration, login and profile operations
#[derive(Clone)]
pub struct AccountService {
    users: DynUserRepository,
    tokens: TokenService,
    argon2: Argon2<'static>,
    /// Verified against when the email is unknown, so both login failure
    /// paths spend the same time hashing.
    dummy_password_hash: String,
}

impl AccountService {
    pub fn new(users: DynUserRepository, tokens: TokenService) -> ApiResult<Self> {
        Self::with_argon2(users, tokens, Argon2::default())
    }

    /// Create the service with explicit Argon2 parameters
    pub fn with_argon2(
        users: DynUserRepository,
        tokens: TokenService,
        argon2: Argon2<'static>,
    ) -> ApiResult<Self> {
        let dummy_salt = SaltString::generate(&mut OsRng);
        let dummy_password_hash = argon2
            .hash_password(b"quill-login-timing-placeholder", &dummy_salt)
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(Self {
            users,
            tokens,
            argon2,
            dummy_password_hash,
        })
    }

    /// Register a new user account
    ///
    /// # Errors
    /// - `ApiError::Validation` listing every rejected field
    /// - `ApiError::DuplicateEmail` if the email is already registered
    pub async fn register(&self, registration: Registration) -> ApiResult<User> {
        let fields = validate_registration(&registration);
        if !fields.is_empty() {
            return Err(ApiError::invalid_input(fields));
        }

        let password_hash = self.hash_password(&registration.password)?;

        // Uniqueness is left to the store so concurrent registrations race safely.
        let user = self
            .users
            .create(NewUser {
                name: registration.name.trim().to_string(),
                email: normalize_email(&registration.email),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "User registered successfully");

        Ok(user)
    }

    /// Check credentials and issue a token
    ///
    /// # Errors
    /// - `ApiError::InvalidCredentials` for an unknown email or a wrong password
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let user = self.users.find_by_email(email).await?;

        let user = match user {
            Some(user) if self.verify_password(password, &user.password_hash)? => user,
            Some(user) => {
                tracing::warn!(user_id = %user.id, "Login failed: invalid password");
                return Err(ApiError::InvalidCredentials);
            }
            None => {
                let _ = self.verify_password(password, &self.dummy_password_hash);
                tracing::warn!("Login failed: unknown email");
                return Err(ApiError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = %user.id, "User logged in successfully");

        Ok(Session {
            token,
            user_id: user.id,
        })
    }

    /// The signed-in caller's account
    pub async fn profile(&self, identity: &Identity) -> ApiResult<User> {
        let user_id = policy::require_user(Operation::ViewProfile, identity)?;
        self.find(user_id).await
    }

    /// Replace the signed-in caller's status line
    pub async fn update_status(&self, identity: &Identity, status: &str) -> ApiResult<User> {
        let user_id = policy::require_user(Operation::UpdateStatus, identity)?;

        let status = status.trim();
        if status.chars().count() > MAX_TEXT_LENGTH {
            return Err(ApiError::invalid_input(vec![FieldError::new(
                "status",
                format!("Status must be at most {} characters.", MAX_TEXT_LENGTH),
            )]));
        }

        let user = self
            .users
            .update_status(user_id, status)
            .await?
            .ok_or_else(|| ApiError::not_found("user", user_id.to_string()))?;

        tracing::debug!(user_id = %user.id, "Status updated");
        Ok(user)
    }

    /// Look up a user by id
    pub async fn find(&self, user_id: Uuid) -> ApiResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("user", user_id.to_string()))
    }

    fn hash_password(&self, password: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> ApiResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| ApiError::Internal(format!("Invalid password hash format: {}", e)))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

fn validate_registration(registration: &Registration) -> Vec<FieldError> {
    let mut fields = Vec::new();

    let name = registration.name.trim();
    if name.is_empty() {
        fields.push(FieldError::new("name", "Name is required."));
    } else if name.chars().count() > MAX_TEXT_LENGTH {
        fields.push(FieldError::new(
            "name",
            format!("Name must be at most {} characters.", MAX_TEXT_LENGTH),
        ));
    }

    if !is_valid_email(&registration.email) {
        fields.push(FieldError::new("email", "E-Mail is invalid."));
    }

    if registration.password.chars().count() < MIN_PASSWORD_LENGTH {
        fields.push(FieldError::new(
            "password",
            format!(
                "Password must be at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }

    fields
}

/// Simple email validation
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }

    !domain.is_empty() && domain.contains('.') && domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryStore;
    use crate::services::token::TokenConfig;
    use argon2::{Algorithm, Params, Version};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn service() -> (AccountService, TokenService) {
        let tokens = TokenService::new(TokenConfig::new("accounts-test-secret-0123456789abcdef"));
        let argon2 = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(1024, 1, 1, None).unwrap(),
        );
        let accounts =
            AccountService::with_argon2(Arc::new(MemoryStore::new()), tokens.clone(), argon2)
                .unwrap();
        (accounts, tokens)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Ada".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@domain.co.uk"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("missing@domain"));
        assert!(!is_valid_email("@domain.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@@domain.com"));
    }

    #[test]
    fn test_validation_lists_every_field() {
        let fields = validate_registration(&Registration {
            name: "  ".to_string(),
            email: "nope".to_string(),
            password: "short".to_string(),
        });
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["name", "email", "password"]);
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (accounts, tokens) = service();
        let user = accounts
            .register(registration("Ada@Example.com"))
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_ne!(user.password_hash, "correct horse");

        let session = accounts
            .login("ada@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(tokens.verify(&session.token), Ok(user.id));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (accounts, _) = service();
        accounts
            .register(registration("ada@example.com"))
            .await
            .unwrap();

        let wrong_password = accounts
            .login("ada@example.com", "wrong password")
            .await
            .unwrap_err();
        let unknown_email = accounts
            .login("nobody@example.com", "correct horse")
            .await
            .unwrap_err();

        assert_matches!(wrong_password, ApiError::InvalidCredentials);
        assert_matches!(unknown_email, ApiError::InvalidCredentials);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (accounts, _) = service();
        accounts
            .register(registration("ada@example.com"))
            .await
            .unwrap();
        assert_matches!(
            accounts.register(registration("ada@example.com")).await,
            Err(ApiError::DuplicateEmail(_))
        );
    }

    #[tokio::test]
    async fn test_update_status_requires_identity() {
        let (accounts, _) = service();
        assert_matches!(
            accounts.update_status(&Identity::Anonymous, "busy").await,
            Err(ApiError::NotAuthenticated)
        );

        let user = accounts
            .register(registration("ada@example.com"))
            .await
            .unwrap();
        let updated = accounts
            .update_status(&Identity::User(user.id), "  writing  ")
            .await
            .unwrap();
        assert_eq!(updated.status, "writing");
    }

    #[tokio::test]
    async fn test_profile_for_vanished_user() {
        let (accounts, _) = service();
        assert_matches!(
            accounts.profile(&Identity::User(Uuid::new_v4())).await,
            Err(ApiError::NotFound { .. })
        );
    }
}
