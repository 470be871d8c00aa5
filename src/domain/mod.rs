//! Domain layer - Business abstractions
//!
//! This layer contains no HTTP concerns (no Axum).
//! Only trait definitions, domain data and error types.

pub mod errors;
pub mod repositories;

pub use errors::DomainError;
pub use repositories::*;
