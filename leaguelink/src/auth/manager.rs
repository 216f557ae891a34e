//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{
        AccessTokenClaims, LoginRequest, NewUser, ProfileUpdate, RegisterRequest, SessionToken,
        User, UserId,
    },
};
use crate::db::UserRepository;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::sync::Arc;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    pepper: String,
    jwt_secret: String,
    access_token_duration: Duration,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - User repository
    /// * `pepper` - Server-side pepper for password hashing
    /// * `jwt_secret` - Secret key for JWT signing
    pub fn new(users: Arc<dyn UserRepository>, pepper: String, jwt_secret: String) -> Self {
        Self {
            users,
            pepper,
            jwt_secret,
            access_token_duration: Duration::hours(24),
        }
    }

    /// Override the lifetime of issued access tokens
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_duration = ttl;
        self
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::UsernameTaken` - Username already exists
    /// * `AuthError::EmailTaken` - Email already exists
    /// * `AuthError::InvalidUsername` - Username format invalid
    /// * `AuthError::InvalidEmail` - Email format invalid
    /// * `AuthError::WeakPassword` - Password too weak
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        validate_username(&request.username)?;
        validate_password(&request.password)?;
        let email = match request.email {
            Some(email) => Some(validate_email(email)?),
            None => None,
        };

        if self
            .users
            .find_credentials(&request.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = self.hash_password(&request.password)?;
        let display_name = request
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| request.username.clone());

        let new_user = NewUser {
            username: request.username,
            email,
            display_name,
            password_hash,
        };

        let user = match self.users.create_user(new_user).await {
            Ok(user) => user,
            Err(crate::db::StoreError::Duplicate("email")) => return Err(AuthError::EmailTaken),
            Err(crate::db::StoreError::Duplicate(_)) => return Err(AuthError::UsernameTaken),
            Err(e) => return Err(e.into()),
        };

        log::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Login a user and issue an access token
    ///
    /// Unknown usernames and wrong passwords both yield
    /// `AuthError::InvalidCredentials`.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, SessionToken)> {
        let (user, password_hash) = self
            .users
            .find_credentials(&request.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.verify_password(&request.password, &password_hash)?;

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Verify an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Fetch a user by id
    pub async fn get_user(&self, user_id: UserId) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update profile fields of a user
    pub async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> AuthResult<User> {
        if update
            .display_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(AuthError::InvalidUsername(
                "Display name cannot be empty".to_string(),
            ));
        }

        self.users
            .update_profile(user_id, &update)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Generate a signed access token for a user
    pub fn issue_token(&self, user: &User) -> AuthResult<SessionToken> {
        let now = Utc::now();
        let expires_at = now + self.access_token_duration;
        let claims = AccessTokenClaims {
            sub: user.id,
            username: user.username.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(SessionToken {
            access_token,
            expires_at,
        })
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

/// Validate username format
fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.len();
    if !(3..=20).contains(&len) {
        return Err(AuthError::InvalidUsername(
            "Username must be 3-20 characters".to_string(),
        ));
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(AuthError::InvalidUsername(
            "Username can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Validate password strength
fn validate_password(password: &str) -> AuthResult<()> {
    if password.len() < 8 {
        return Err(AuthError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());

    if !has_digit || !has_uppercase || !has_lowercase {
        return Err(AuthError::WeakPassword(
            "Password must contain at least one number, one uppercase and one lowercase letter"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_email(email: String) -> AuthResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::InvalidEmail(email)),
    }
}
