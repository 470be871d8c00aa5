use axum::{
    Json,
    extract::State,
};

use crate::api::error::ApiResult;
use crate::api::extract::ApiPath;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::models::Book;

#[utoipa::path(
    get,
    path = "/books",
    responses(
        (status = 200, description = "All books", body = [Book])
    )
)]
pub async fn list_books(State(state): State<AppState>) -> ApiResult<Json<Vec<Book>>> {
    let books = state.book_repo.find_all().await?;
    Ok(Json(books))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "Unknown book", body = crate::api::error::ErrorBody)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<Book>> {
    let book = state
        .book_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Book not found"))?;
    Ok(Json(book))
}
