//! Shared Module
//!
//! Cross-cutting concerns and shared utilities.

pub mod api_common;
pub mod authorization;
pub mod error;
pub mod indexes;
pub mod middleware;
pub mod tsid;
pub mod validate;

// Re-export commonly used items
pub use api_common::{CountResponse, PageParams, SuccessResponse};
pub use authorization::{checks, AuthContext};
pub use error::{PlatformError, Result};
pub use middleware::{AppState, AuthLayer, Authenticated};
pub use tsid::TsidGenerator;
