//! Feature Board Platform
//!
//! Core platform providing:
//! - Feature request tracking with embedded votes and comments
//! - Vote toggling as atomic set-membership updates
//! - Account registration and bearer-token authentication
//! - Role-based admin surface for user management
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `api` - REST endpoints

// Core aggregates
pub mod feature;
pub mod user;

// Authentication & authorization
pub mod auth;

// Shared infrastructure
pub mod shared;

// Re-export common types from shared
pub use shared::error::{PlatformError, Result};
pub use shared::tsid::TsidGenerator;
pub use shared::authorization::{checks, AuthContext};
pub use shared::middleware::{AppState, AuthLayer, Authenticated};

// Re-export main entity types for convenience
pub use feature::entity::{Comment, Feature, Reaction, Vote};
pub use user::entity::{Role, User};

// Re-export repositories and services
pub use feature::repository::{FeatureRepository, SortMode};
pub use user::repository::UserRepository;
pub use auth::{AuthConfig, AuthService, PasswordService};
