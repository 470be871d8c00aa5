//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Missing user, book or borrow record. Carries the client-facing message.
    NotFound(String),
    /// The user already holds an open borrow record for this book
    AlreadyBorrowed,
    /// Every copy of the book is currently out
    NoCopiesLeft,
    /// Database/persistence error
    Database(String),
    /// Generic internal error
    Internal(String),
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "{}", msg),
            DomainError::AlreadyBorrowed => write!(f, "You already borrowed this book"),
            DomainError::NoCopiesLeft => write!(f, "No copies left"),
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure and service layers)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Database(e.to_string())
    }
}
