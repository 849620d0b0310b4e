//! Authentication utilities library
//!
//! Provides the stateless crypto half of the account service:
//! - Password hashing (Argon2id)
//! - Signed tokens in four independent families (activation, access,
//!   refresh, password-reset), each with its own secret and lifetime
//!
//! The service crate sequences these primitives inside its workflows; this
//! crate holds no state and performs no I/O beyond crypto.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest).unwrap());
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{ClaimParts, TokenKind, TokenLifetimes, TokenSecrets, TokenSigner};
//! use uuid::Uuid;
//!
//! let signer = TokenSigner::new(
//!     TokenSecrets {
//!         activation: "activation_secret_at_least_32_bytes!".into(),
//!         access: "access_secret_at_least_32_bytes_long!".into(),
//!         refresh: "refresh_secret_at_least_32_bytes_ok!".into(),
//!         password_reset: "reset_secret_at_least_32_bytes_long!".into(),
//!     },
//!     TokenLifetimes::default(),
//! );
//!
//! let parts = ClaimParts {
//!     user_id: Uuid::new_v4(),
//!     username: "alice".into(),
//!     email: "alice@example.com".into(),
//!     role: "CASHIER".into(),
//! };
//! let token = signer.issue(TokenKind::Access, &parts).unwrap();
//! let claims = signer.verify(TokenKind::Access, &token).unwrap();
//! assert_eq!(claims.username, "alice");
//! ```

pub mod password;
pub mod tokens;

// Re-export commonly used items
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use tokens::ClaimParts;
pub use tokens::TokenClaims;
pub use tokens::TokenError;
pub use tokens::TokenKind;
pub use tokens::TokenLifetimes;
pub use tokens::TokenSecrets;
pub use tokens::TokenSigner;
