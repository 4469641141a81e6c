//! FeatureBoard Common
//!
//! Shared infrastructure used by the platform library and server binaries.

pub mod logging;
