pub mod author;
pub mod books;
pub mod borrow;
pub mod error;
pub mod extract;
pub mod health;
pub mod ids;
pub mod user;

use axum::{
    Router,
    routing::{get, post},
};

use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Books
        .route("/books", get(books::list_books))
        .route("/books/available_qty", get(borrow::available_qty))
        .route("/books/borrow", post(borrow::borrow_book))
        .route("/books/return", post(borrow::return_book))
        .route("/books/:id", get(books::get_book))
        // Authors
        .route("/authors", get(author::list_authors))
        .route("/authors/:id", get(author::get_author))
        // Users
        .route("/users/login", post(user::login))
        .route("/users/:user_id/borrowed_books", get(user::borrowed_books))
        .with_state(state)
}
