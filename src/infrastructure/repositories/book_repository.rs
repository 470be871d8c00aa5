//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::domain::{BookRepository, DomainError};
use crate::models::Book;
use crate::models::author::Entity as AuthorEntity;
use crate::models::book::{Column, Entity as BookEntity};

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, DomainError> {
        let books_with_authors = BookEntity::find()
            .order_by_asc(Column::Id)
            .find_also_related(AuthorEntity)
            .all(&self.db)
            .await?;

        Ok(books_with_authors
            .into_iter()
            .map(|(book, author)| Book {
                author: author.map(|a| a.name),
                ..Book::from(book)
            })
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError> {
        let result = BookEntity::find_by_id(id)
            .find_also_related(AuthorEntity)
            .one(&self.db)
            .await?;

        Ok(result.map(|(book, author)| Book {
            author: author.map(|a| a.name),
            ..Book::from(book)
        }))
    }
}
