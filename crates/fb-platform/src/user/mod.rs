//! User Aggregate
//!
//! Accounts, credentials, and the admin user-management surface.

pub mod api;
pub mod entity;
pub mod repository;

pub use entity::{Role, User};
pub use repository::UserRepository;
