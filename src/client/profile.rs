use super::{ClientError, LibraryClient, Session};
use crate::services::BorrowedBookRow;

/// State behind the profile page: the user's borrow history
#[derive(Debug, Default)]
pub struct ProfilePage {
    pub books: Vec<BorrowedBookRow>,
    pub error_message: String,
    pub notice: Option<String>,
}

impl ProfilePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn greeting(&self, session: &Session) -> String {
        format!("Welcome {}", session.username().unwrap_or_default())
    }

    /// Fetch the borrow history. Does nothing for an anonymous session.
    pub async fn load(&mut self, client: &LibraryClient, session: &Session) {
        let Some(user_id) = session.user_id() else {
            return;
        };

        match client.borrowed_books(user_id).await {
            Ok(books) => {
                self.books = books;
                self.error_message.clear();
            }
            Err(ClientError::Network(e)) => {
                tracing::error!("Error fetching books: {}", e);
                self.error_message = "An error occurred while fetching books.".to_string();
            }
            Err(_) => self.error_message = "Failed to fetch books.".to_string(),
        }
    }

    /// Return a book and drop it from the list on success
    pub async fn return_book(&mut self, client: &LibraryClient, session: &Session, book_id: i32) {
        self.notice = None;

        let Some(user_id) = session.user_id() else {
            self.error_message = "Failed to return the book.".to_string();
            return;
        };

        match client.return_book(book_id, user_id).await {
            Ok(_) => {
                self.books.retain(|book| book.id != book_id);
                self.notice = Some("Book returned successfully".to_string());
            }
            Err(ClientError::Network(e)) => {
                tracing::error!("Error returning book: {}", e);
                self.error_message = "An error occurred while returning the book.".to_string();
            }
            Err(err) => {
                self.error_message = err
                    .server_message()
                    .unwrap_or("Failed to return the book.")
                    .to_string();
            }
        }
    }

    /// Placeholder text when there is nothing to list
    pub fn empty_message(&self) -> Option<&'static str> {
        self.books
            .is_empty()
            .then_some("No books found for this user.")
    }
}
