//! SeaORM implementation of AuthorRepository

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::domain::{Author, AuthorRepository, DomainError};
use crate::models::author::{self, Entity as AuthorEntity};

/// SeaORM-based implementation of AuthorRepository
pub struct SeaOrmAuthorRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<author::Model> for Author {
    fn from(a: author::Model) -> Self {
        Author {
            id: a.id,
            name: a.name,
        }
    }
}

#[async_trait]
impl AuthorRepository for SeaOrmAuthorRepository {
    async fn find_all(&self) -> Result<Vec<Author>, DomainError> {
        let authors = AuthorEntity::find()
            .order_by_asc(author::Column::Id)
            .all(&self.db)
            .await?;

        Ok(authors.into_iter().map(Author::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, DomainError> {
        let author = AuthorEntity::find_by_id(id).one(&self.db).await?;

        Ok(author.map(Author::from))
    }
}
