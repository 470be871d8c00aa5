//! Borrow Service - borrow accounting without HTTP layer
//!
//! Availability is never stored: it is `quantity - open borrow records` and is
//! computed on every read. Borrow and return decisions for one book are
//! serialized through [`BookLocks`] and run inside a transaction, and the
//! insert itself only succeeds while a copy is free, so the number of open
//! records can never exceed the book's quantity.

use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::DomainError;
use crate::models::book::{self, Entity as Book};
use crate::models::borrowed_book::{self, Entity as BorrowedBook};
use crate::models::user::Entity as User;

pub const USER_NOT_FOUND: &str = "user not found";
pub const BOOK_NOT_FOUND: &str = "Book not found";
pub const NO_OPEN_RECORD: &str = "No open borrow record found";

/// Per-book async mutexes, created on first use and dropped again once
/// nobody holds or waits for them.
#[derive(Default)]
pub struct BookLocks {
    locks: DashMap<i32, Arc<Mutex<()>>>,
}

impl BookLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other borrow/return decision is running for `book_id`.
    pub async fn acquire(&self, book_id: i32) -> BookGuard<'_> {
        let lock = self.locks.entry(book_id).or_default().clone();
        let guard = lock.lock_owned().await;
        BookGuard {
            locks: self,
            book_id,
            guard: Some(guard),
        }
    }

    /// Number of books with a live lock entry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held while a decision for one book runs. Dropping it releases the lock
/// and removes the entry when no other task holds a handle to it.
pub struct BookGuard<'a> {
    locks: &'a BookLocks,
    book_id: i32,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for BookGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold a clone of the Arc, so a count of 1 means only the map is left
        self.locks
            .locks
            .remove_if(&self.book_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Availability figures for one book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult, utoipa::ToSchema)]
pub struct BookAvailability {
    pub id: i32,
    pub title: String,
    pub total_quantity: i32,
    pub available_quantity: i64,
}

/// Result of an availability query
#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    Single(i64),
    All(Vec<BookAvailability>),
}

/// A borrow record joined with its book and author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult, utoipa::ToSchema)]
pub struct BorrowedBookRow {
    pub id: i32,
    pub title: String,
    pub quantity: i32,
    pub author: String,
    pub borrowed_at: String,
    pub returned_at: Option<String>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn available_copies(quantity: i32, open_records: usize) -> i64 {
    i64::from(quantity) - open_records as i64
}

/// Decide whether `user_id` may borrow `book` given its open records.
pub fn check_borrow(
    book: &book::Model,
    open_records: &[borrowed_book::Model],
    user_id: i32,
) -> Result<(), DomainError> {
    if open_records.iter().any(|r| r.fk_user_id == user_id) {
        return Err(DomainError::AlreadyBorrowed);
    }

    if available_copies(book.quantity, open_records.len()) < 1 {
        return Err(DomainError::NoCopiesLeft);
    }

    Ok(())
}

async fn open_records<C: ConnectionTrait>(
    conn: &C,
    book_id: i32,
) -> Result<Vec<borrowed_book::Model>, DomainError> {
    Ok(BorrowedBook::find()
        .filter(borrowed_book::Column::FkBookId.eq(book_id))
        .filter(borrowed_book::Column::ReturnedAt.is_null())
        .order_by_asc(borrowed_book::Column::Id)
        .all(conn)
        .await?)
}

/// Insert an open record only if a copy is free and the user holds none.
/// Returns the new record, or `None` when the guard rejected the insert.
async fn insert_if_available<C: ConnectionTrait>(
    conn: &C,
    book_id: i32,
    user_id: i32,
    borrowed_at: &str,
) -> Result<Option<borrowed_book::Model>, DomainError> {
    Ok(BorrowedBook::find()
        .from_raw_sql(Statement::from_sql_and_values(
            conn.get_database_backend(),
            r#"
            INSERT INTO library_borrowed_books (fk_book_id, fk_user_id, borrowed_at, returned_at)
            SELECT b.id, ?, ?, NULL
            FROM library_books b
            WHERE b.id = ?
              AND b.quantity > (
                  SELECT COUNT(*) FROM library_borrowed_books
                  WHERE fk_book_id = b.id AND returned_at IS NULL
              )
              AND NOT EXISTS (
                  SELECT 1 FROM library_borrowed_books
                  WHERE fk_book_id = b.id AND fk_user_id = ? AND returned_at IS NULL
              )
            RETURNING id, fk_book_id, fk_user_id, borrowed_at, returned_at
            "#,
            [
                user_id.into(),
                borrowed_at.into(),
                book_id.into(),
                user_id.into(),
            ],
        ))
        .one(conn)
        .await?)
}

/// Close the earliest open record of `user_id` for `book_id`.
async fn close_earliest_open<C: ConnectionTrait>(
    conn: &C,
    book_id: i32,
    user_id: i32,
    returned_at: &str,
) -> Result<Option<borrowed_book::Model>, DomainError> {
    Ok(BorrowedBook::find()
        .from_raw_sql(Statement::from_sql_and_values(
            conn.get_database_backend(),
            r#"
            UPDATE library_borrowed_books
            SET returned_at = ?
            WHERE returned_at IS NULL
              AND id = (
                  SELECT id FROM library_borrowed_books
                  WHERE fk_book_id = ? AND fk_user_id = ? AND returned_at IS NULL
                  ORDER BY borrowed_at, id
                  LIMIT 1
              )
            RETURNING id, fk_book_id, fk_user_id, borrowed_at, returned_at
            "#,
            [returned_at.into(), book_id.into(), user_id.into()],
        ))
        .one(conn)
        .await?)
}

async fn ensure_book_exists(
    db: &DatabaseConnection,
    book_id: i32,
) -> Result<(), DomainError> {
    if Book::find_by_id(book_id).one(db).await?.is_none() {
        return Err(DomainError::not_found(BOOK_NOT_FOUND));
    }
    Ok(())
}

/// Borrow a copy of a book for a user
pub async fn borrow_book(
    db: &DatabaseConnection,
    locks: &BookLocks,
    book_id: Option<i32>,
    user_id: Option<i32>,
) -> Result<borrowed_book::Model, DomainError> {
    let user_id = user_id.ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;
    if User::find_by_id(user_id).one(db).await?.is_none() {
        return Err(DomainError::not_found(USER_NOT_FOUND));
    }

    let book_id = book_id.ok_or_else(|| DomainError::not_found(BOOK_NOT_FOUND))?;
    ensure_book_exists(db, book_id).await?;

    let _guard = locks.acquire(book_id).await;

    // The guarded insert is the first statement, so the transaction starts
    // by taking the write lock
    let txn = db.begin().await?;
    let borrowed_at = now();

    let Some(record) = insert_if_available(&txn, book_id, user_id, &borrowed_at).await? else {
        let book = Book::find_by_id(book_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found(BOOK_NOT_FOUND))?;
        let open = open_records(&txn, book_id).await?;
        let err = check_borrow(&book, &open, user_id)
            .err()
            .unwrap_or(DomainError::NoCopiesLeft);
        txn.rollback().await?;

        tracing::warn!(
            "Borrow rejected: book={} user={} open={} quantity={}: {}",
            book_id,
            user_id,
            open.len(),
            book.quantity,
            err
        );
        return Err(err);
    };

    txn.commit().await?;

    tracing::info!(
        "Book {} borrowed by user {} (record {})",
        book_id,
        user_id,
        record.id
    );

    Ok(record)
}

/// Close the user's open borrow record for a book.
///
/// Exactly one record is closed: the earliest by `borrowed_at`, then by id.
pub async fn return_book(
    db: &DatabaseConnection,
    locks: &BookLocks,
    book_id: Option<i32>,
    user_id: Option<i32>,
) -> Result<Vec<borrowed_book::Model>, DomainError> {
    let (Some(book_id), Some(user_id)) = (book_id, user_id) else {
        return Err(DomainError::not_found(NO_OPEN_RECORD));
    };
    ensure_book_exists(db, book_id).await?;

    let _guard = locks.acquire(book_id).await;
    let txn = db.begin().await?;

    let Some(record) = close_earliest_open(&txn, book_id, user_id, &now()).await?
    else {
        txn.rollback().await?;
        return Err(DomainError::not_found(NO_OPEN_RECORD));
    };

    txn.commit().await?;

    tracing::info!(
        "Book {} returned by user {} (record {})",
        book_id,
        user_id,
        record.id
    );

    Ok(vec![record])
}

/// Available copies of one book, or of every book when `book_id` is `None`
pub async fn availability(
    db: &DatabaseConnection,
    book_id: Option<i32>,
) -> Result<Availability, DomainError> {
    let base = r#"
        SELECT b.id AS id,
               b.title AS title,
               b.quantity AS total_quantity,
               b.quantity - COUNT(bb.id) AS available_quantity
        FROM library_books b
        LEFT JOIN library_borrowed_books bb
               ON bb.fk_book_id = b.id AND bb.returned_at IS NULL
    "#;

    match book_id {
        Some(id) => {
            let row = BookAvailability::find_by_statement(Statement::from_sql_and_values(
                db.get_database_backend(),
                format!("{base} WHERE b.id = ? GROUP BY b.id"),
                [id.into()],
            ))
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found(BOOK_NOT_FOUND))?;

            Ok(Availability::Single(row.available_quantity))
        }
        None => {
            let rows = BookAvailability::find_by_statement(Statement::from_string(
                db.get_database_backend(),
                format!("{base} GROUP BY b.id ORDER BY b.id"),
            ))
            .all(db)
            .await?;

            Ok(Availability::All(rows))
        }
    }
}

/// Full borrow history (open and closed) of a user.
///
/// An unknown user is `NotFound`; a known user without history gets an
/// empty list.
pub async fn borrowed_books_by_user(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<BorrowedBookRow>, DomainError> {
    if User::find_by_id(user_id).one(db).await?.is_none() {
        return Err(DomainError::not_found("User not found"));
    }

    let rows = BorrowedBookRow::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        r#"
        SELECT b.id AS id,
               b.title AS title,
               b.quantity AS quantity,
               a.name AS author,
               bb.borrowed_at AS borrowed_at,
               bb.returned_at AS returned_at
        FROM library_borrowed_books bb
        JOIN library_books b ON b.id = bb.fk_book_id
        JOIN library_authors a ON a.id = b.fk_author
        WHERE bb.fk_user_id = ?
        ORDER BY bb.borrowed_at, bb.id
        "#,
        [user_id.into()],
    ))
    .all(db)
    .await?;

    Ok(rows)
}
