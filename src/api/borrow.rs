use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};

use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::ids;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::services::borrow_service::{self, Availability, BOOK_NOT_FOUND};

/// Body of borrow and return requests
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    #[serde(default, deserialize_with = "ids::optional_id")]
    #[schema(value_type = Option<i32>)]
    pub book_id: Option<i32>,
    #[serde(default, deserialize_with = "ids::optional_id")]
    #[schema(value_type = Option<i32>)]
    pub user_id: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailableQtyQuery {
    /// Book id; omit for every book
    pub fk_book_id: Option<String>,
}

#[utoipa::path(
    post,
    path = "/books/borrow",
    request_body = BorrowRequest,
    responses(
        (status = 200, description = "Borrow recorded"),
        (status = 400, description = "Already borrowed or no copies left", body = crate::api::error::ErrorBody),
        (status = 404, description = "Unknown user or book", body = crate::api::error::ErrorBody),
        (status = 500, description = "Internal error", body = crate::api::error::ErrorBody)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BorrowRequest>,
) -> ApiResult<Json<Value>> {
    borrow_service::borrow_book(
        state.db(),
        &state.borrow_locks,
        payload.book_id,
        payload.user_id,
    )
    .await?;

    Ok(Json(json!({ "msg": "update successfully" })))
}

#[utoipa::path(
    post,
    path = "/books/return",
    request_body = BorrowRequest,
    responses(
        (status = 200, description = "The closed borrow record, as `retunBooks`"),
        (status = 404, description = "No open borrow record", body = crate::api::error::ErrorBody),
        (status = 500, description = "Internal error", body = crate::api::error::ErrorBody)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BorrowRequest>,
) -> ApiResult<Json<Value>> {
    let returned = borrow_service::return_book(
        state.db(),
        &state.borrow_locks,
        payload.book_id,
        payload.user_id,
    )
    .await?;

    // Key spelling is what the browser client reads
    Ok(Json(json!({ "retunBooks": returned })))
}

#[utoipa::path(
    get,
    path = "/books/available_qty",
    params(AvailableQtyQuery),
    responses(
        (status = 200, description = "`{availableQty}` for one book, or a list for all books", body = [crate::services::BookAvailability]),
        (status = 404, description = "Unknown book", body = crate::api::error::ErrorBody)
    )
)]
pub async fn available_qty(
    State(state): State<AppState>,
    Query(query): Query<AvailableQtyQuery>,
) -> ApiResult<Json<Value>> {
    let book_id = match query.fk_book_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            ids::parse_id(raw).ok_or_else(|| DomainError::not_found(BOOK_NOT_FOUND))?,
        ),
    };

    match borrow_service::availability(state.db(), book_id).await? {
        Availability::Single(available) => Ok(Json(json!({ "availableQty": available }))),
        Availability::All(rows) => Ok(Json(json!(rows))),
    }
}
