use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One borrow transaction. Open while `returned_at` is NULL.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "library_borrowed_books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub fk_book_id: i32,
    pub fk_user_id: i32,
    pub borrowed_at: String,
    pub returned_at: Option<String>,
}

impl Model {
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::FkBookId",
        to = "super::book::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Book,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FkUserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
