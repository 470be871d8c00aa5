use crate::models::{author, book, user};
use sea_orm::*;

/// Demo catalogue: (author, [(title, quantity)])
const CATALOGUE: &[(&str, &[(&str, i32)])] = &[
    ("J.R.R. Tolkien", &[("The Hobbit", 3), ("The Fellowship of the Ring", 2)]),
    ("Isaac Asimov", &[("Foundation", 2), ("I, Robot", 1)]),
    ("Frank Herbert", &[("Dune", 2)]),
];

const USERS: &[&str] = &["alice", "bob", "carol"];

/// Insert demo authors, books and users. Safe to run on every startup:
/// existing usernames are skipped, and the catalogue is only inserted into
/// an empty books table.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    // 1. Create Users
    for name in USERS {
        let exists = user::Entity::find()
            .filter(user::Column::Username.eq(*name))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        user::ActiveModel {
            username: Set((*name).to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    if book::Entity::find().count(db).await? > 0 {
        tracing::debug!("Books already present, catalogue seed skipped");
        return Ok(());
    }

    // 2. Create Authors and their Books
    for (author_name, titles) in CATALOGUE {
        let author = author::ActiveModel {
            name: Set((*author_name).to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for (title, quantity) in titles.iter() {
            book::ActiveModel {
                title: Set((*title).to_owned()),
                fk_author: Set(author.id),
                quantity: Set(*quantity),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    Ok(())
}
