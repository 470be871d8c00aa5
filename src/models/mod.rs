pub mod author;
pub mod book;
pub mod borrowed_book;
pub mod user;

pub use book::Book;
