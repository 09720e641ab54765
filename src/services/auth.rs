//! Authentication and user directory service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;

use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{RegisterUser, User, UserClaims, UserQuery, UserShort},
        Page,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate user by login and return a JWT token
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, User)> {
        let Some(user) = self.repository.users.get_by_login(login).await? else {
            // Unknown logins pay the same argon2 cost as a wrong password.
            if let Some(hash) = dummy_hash() {
                verify_hash(hash, password)?;
            }
            tracing::info!(login = %login, "Rejected login attempt");
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        };

        if !verify_hash(&user.password, password)? {
            tracing::info!(login = %login, "Rejected login attempt");
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Register a new member account
    pub async fn register(&self, user: RegisterUser) -> AppResult<User> {
        user.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.create_user(user, false).await
    }

    /// Create the configured administrator account when it does not exist yet
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (Some(login), Some(password)) = (&self.config.admin_login, &self.config.admin_password)
        else {
            return Ok(());
        };

        if self.repository.users.login_exists(login).await? {
            return Ok(());
        }

        let admin = RegisterUser {
            login: login.clone(),
            password: password.clone(),
            firstname: "Admin".to_string(),
            lastname: "User".to_string(),
            email: self
                .config
                .admin_email
                .clone()
                .unwrap_or_else(|| format!("{}@localhost", login)),
            phone: None,
        };

        let created = self.create_user(admin, true).await?;
        tracing::info!("Created administrator account '{}' (id {})", created.login, created.id);
        Ok(())
    }

    async fn create_user(&self, user: RegisterUser, is_admin: bool) -> AppResult<User> {
        if self.repository.users.login_exists(&user.login).await? {
            return Err(AppError::Conflict("Login already exists".to_string()));
        }
        if self.repository.users.email_exists(&user.email).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password = self.hash_password(&user.password)?;
        self.repository.users.create(&user, &password, is_admin).await
    }

    /// Create JWT token for a user
    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.login.clone(),
            user_id: user.id,
            is_admin: user.is_admin,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users
    pub async fn search_users(&self, query: &UserQuery, page: Page) -> AppResult<(Vec<UserShort>, i64)> {
        self.repository.users.search(query, page).await
    }
}

/// Verify a password against a stored argon2 hash
fn verify_hash(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash checked when the login does not exist
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(b"unknown-login", &salt)
                .map(|hash| hash.to_string())
                .ok()
        })
        .as_deref()
}
