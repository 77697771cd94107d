//! Core types and errors for the academic result registry.
//!
//! This crate provides the foundational types shared by the SDK and server:
//! - Domain entities (`ResultRecord`, `RecordKey`, `GradePatch`)
//! - The unified error taxonomy (`RegistryError`) using snafu
//! - Field validation helpers used at the call-construction boundary

pub mod error;
pub mod record;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{ErrorKind, RegistryError, Result};
pub use record::{GradePatch, RecordKey, ResultRecord};
pub use validation::require_field;
