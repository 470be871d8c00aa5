use axum::{
    Json,
    extract::State,
};

use crate::api::error::ApiResult;
use crate::api::extract::ApiPath;
use crate::domain::{Author, DomainError};
use crate::infrastructure::AppState;

#[utoipa::path(
    get,
    path = "/authors",
    responses(
        (status = 200, description = "All authors", body = [Author])
    )
)]
pub async fn list_authors(State(state): State<AppState>) -> ApiResult<Json<Vec<Author>>> {
    Ok(Json(state.author_repo.find_all().await?))
}

#[utoipa::path(
    get,
    path = "/authors/{id}",
    params(("id" = i32, Path, description = "Author id")),
    responses(
        (status = 200, description = "The author", body = Author),
        (status = 404, description = "Unknown author", body = crate::api::error::ErrorBody)
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<Author>> {
    state
        .author_repo
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| DomainError::not_found("Author not found").into())
}
