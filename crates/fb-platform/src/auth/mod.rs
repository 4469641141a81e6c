//! Authentication Module
//!
//! Token issuance/validation and password hashing.

pub mod auth_service;
pub mod password_service;

pub use auth_service::{AccessTokenClaims, AuthConfig, AuthService};
pub use password_service::{Argon2Config, PasswordService};
