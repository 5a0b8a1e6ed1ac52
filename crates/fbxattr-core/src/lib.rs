//! fbxattr Core Library
//!
//! This crate provides the value types, asset path helpers and error
//! handling shared across all fbxattr components.

pub mod error;
pub mod path;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::path::{attribute_asset_path, has_extension};
    pub use crate::types::*;
}
