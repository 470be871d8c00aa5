use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "library_books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub fk_author: i32,
    /// Total copies owned by the library. Fixed capacity, never decremented
    /// on borrow: availability is derived from open borrow records.
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::author::Entity",
        from = "Column::FkAuthor",
        to = "super::author::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(has_many = "super::borrowed_book::Entity")]
    BorrowedBooks,
}

impl Related<super::author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::borrowed_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BorrowedBooks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub fk_author: i32,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            fk_author: model.fk_author,
            quantity: model.quantity,
            author: None,
        }
    }
}
