//! Shared types for winup.
//!
//! The data model is intentionally free of behaviour beyond validation and
//! small accessors: the matchers and the removal engine in `winup-core`
//! operate on these values, while the CLI renders and exports them.

pub mod inventory;
pub mod kb;
pub mod types;

// Re-exports
pub use inventory::*;
pub use kb::*;
pub use types::*;

/// Errors raised while constructing or validating schema values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The string is not a `KB<digits>` article identifier.
    #[error("invalid KB identifier: {0:?}")]
    InvalidKb(String),

    /// A resolution was built without a usable mechanism.
    #[error("a resolution needs a removal method other than None")]
    MissingMethod,

    /// A resolution was built with an empty target identity.
    #[error("a resolution needs a non-empty target identity")]
    EmptyTarget,
}
