use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiPath};
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::services::borrow_service::{self, BorrowedBookRow};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub name: String,
    pub user_id: i32,
}

/// Name lookup only, there is no credential check.
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Known user", body = LoginResponse),
        (status = 404, description = "Unknown user", body = crate::api::error::ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(DomainError::not_found("User not found").into());
    }

    let user = state
        .user_repo
        .find_by_username(name)
        .await?
        .ok_or_else(|| DomainError::not_found("User not found"))?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        name: user.username,
        user_id: user.id,
    }))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/borrowed_books",
    params(("user_id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Every borrow record of the user", body = [BorrowedBookRow]),
        (status = 404, description = "Unknown user", body = crate::api::error::ErrorBody)
    )
)]
pub async fn borrowed_books(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<Json<Vec<BorrowedBookRow>>> {
    let rows = borrow_service::borrowed_books_by_user(state.db(), user_id).await?;
    Ok(Json(rows))
}
