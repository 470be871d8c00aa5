use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "library_users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::borrowed_book::Entity")]
    BorrowedBooks,
}

impl Related<super::borrowed_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BorrowedBooks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
