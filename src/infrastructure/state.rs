//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{AuthorRepository, BookRepository, UserRepository};
use crate::infrastructure::{SeaOrmAuthorRepository, SeaOrmBookRepository, SeaOrmUserRepository};
use crate::services::BookLocks;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection, used directly by the borrow service
    db: DatabaseConnection,
    /// Book repository
    pub book_repo: Arc<dyn BookRepository>,
    /// Author repository
    pub author_repo: Arc<dyn AuthorRepository>,
    /// User repository
    pub user_repo: Arc<dyn UserRepository>,
    /// Serializes borrow/return decisions per book
    pub borrow_locks: Arc<BookLocks>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection) -> Self {
        let book_repo = Arc::new(SeaOrmBookRepository::new(db.clone()));
        let author_repo = Arc::new(SeaOrmAuthorRepository::new(db.clone()));
        let user_repo = Arc::new(SeaOrmUserRepository::new(db.clone()));

        Self {
            db,
            book_repo,
            author_repo,
            user_repo,
            borrow_locks: Arc::new(BookLocks::new()),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
