use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::user::LoginResponse;
use crate::domain::Author;
use crate::models::Book;
use crate::models::borrowed_book;
use crate::services::{BookAvailability, BorrowedBookRow};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// 404 from the server, with its message
    NotFound(String),
    /// Any other non-success status
    Server {
        status: u16,
        message: Option<String>,
    },
    /// The request never got a usable response
    Network(String),
}

impl ClientError {
    /// Message provided by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::NotFound(msg) => Some(msg),
            ClientError::Server { message, .. } => message.as_deref(),
            ClientError::Network(_) => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ClientError::Server { status, message } => match message {
                Some(msg) => write!(f, "Server returned {}: {}", status, msg),
                None => write!(f, "Server returned {}", status),
            },
            ClientError::Network(msg) => write!(f, "Network error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorPayload {
    // Older servers answered with `msg`
    #[serde(alias = "msg")]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BorrowPayload {
    book_id: i32,
    user_id: i32,
}

#[derive(Deserialize)]
struct ReturnPayload {
    #[serde(rename = "retunBooks")]
    returned: Vec<borrowed_book::Model>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailableQtyPayload {
    available_qty: i64,
}

/// HTTP client for the Library Desk REST API
#[derive(Clone)]
pub struct LibraryClient {
    http: reqwest::Client,
    base_url: String,
}

impl LibraryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(resp: Response) -> Result<Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = resp
            .json::<ErrorPayload>()
            .await
            .ok()
            .and_then(|p| p.message);

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(
                message.unwrap_or_else(|| "Not found".to_string()),
            ));
        }

        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.http.get(self.url(path)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, ClientError> {
        self.get_json("/books").await
    }

    pub async fn list_authors(&self) -> Result<Vec<Author>, ClientError> {
        self.get_json("/authors").await
    }

    pub async fn login(&self, name: &str) -> Result<LoginResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/users/login"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn borrowed_books(&self, user_id: i32) -> Result<Vec<BorrowedBookRow>, ClientError> {
        self.get_json(&format!("/users/{}/borrowed_books", user_id))
            .await
    }

    pub async fn borrow_book(&self, book_id: i32, user_id: i32) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("/books/borrow"))
            .json(&BorrowPayload { book_id, user_id })
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn return_book(
        &self,
        book_id: i32,
        user_id: i32,
    ) -> Result<Vec<borrowed_book::Model>, ClientError> {
        let resp = self
            .http
            .post(self.url("/books/return"))
            .json(&BorrowPayload { book_id, user_id })
            .send()
            .await?;
        let payload: ReturnPayload = Self::check(resp).await?.json().await?;
        Ok(payload.returned)
    }

    pub async fn available_qty(&self, book_id: i32) -> Result<i64, ClientError> {
        let payload: AvailableQtyPayload = self
            .get_json(&format!("/books/available_qty?fk_book_id={}", book_id))
            .await?;
        Ok(payload.available_qty)
    }

    pub async fn all_availability(&self) -> Result<Vec<BookAvailability>, ClientError> {
        self.get_json("/books/available_qty").await
    }
}
