use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::books::list_books,
        api::books::get_book,
        api::borrow::borrow_book,
        api::borrow::return_book,
        api::borrow::available_qty,
        api::author::list_authors,
        api::author::get_author,
        api::user::login,
        api::user::borrowed_books,
    ),
    components(
        schemas(
            crate::models::Book,
            crate::domain::Author,
            crate::services::BookAvailability,
            crate::services::BorrowedBookRow,
            api::borrow::BorrowRequest,
            api::user::LoginRequest,
            api::user::LoginResponse,
            api::error::ErrorBody,
        )
    ),
    tags(
        (name = "library-desk", description = "Library Desk API")
    )
)]
pub struct ApiDoc;
