//! Feature Aggregate
//!
//! Feature requests with embedded votes and comments.

pub mod api;
pub mod entity;
pub mod repository;

pub use entity::{Comment, Feature, Reaction, Vote};
pub use repository::{FeatureRepository, SortMode};
