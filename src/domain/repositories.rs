//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::DomainError;
use crate::models::book::Book;

/// Author data for API responses
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct Author {
    pub id: i32,
    pub name: String,
}

/// Library member. Identified by name only, there is no credential.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
}

/// Repository trait for Author entity
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Find all authors
    async fn find_all(&self) -> Result<Vec<Author>, DomainError>;

    /// Find an author by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, DomainError>;
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find all books, ordered by id, with the author name filled in
    async fn find_all(&self) -> Result<Vec<Book>, DomainError>;

    /// Find a single book by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError>;
}

/// Repository trait for User entity
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Exact, case-sensitive lookup by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;
}
