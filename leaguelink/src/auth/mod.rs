//! Authentication module providing user registration, login, and bearer tokens.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - HS256 JWT access tokens carrying the user id
//! - Profile lookup and updates
//!
//! ## Example
//!
//! ```no_run
//! use leaguelink::auth::{AuthManager, RegisterRequest};
//! use leaguelink::db::Repositories;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repos = Repositories::in_memory();
//!     let auth = AuthManager::new(
//!         repos.users.clone(),
//!         "secret_pepper".to_string(),
//!         "jwt_secret".to_string(),
//!     );
//!
//!     let request = RegisterRequest {
//!         username: "striker9".to_string(),
//!         password: "SecurePass123".to_string(),
//!         display_name: Some("Striker".to_string()),
//!         email: Some("striker@example.com".to_string()),
//!     };
//!
//!     let user = auth.register(request).await?;
//!     println!("Registered user: {}", user.username);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{
    AccessTokenClaims, LoginRequest, NewUser, ProfileUpdate, RegisterRequest, SessionToken, User,
    UserId,
};
