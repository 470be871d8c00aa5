use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);

    // An in-memory database lives and dies with a single connection
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await?;

    create_schema(&db).await?;

    tracing::debug!("Database schema ready ({})", database_url);

    Ok(db)
}

async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Create authors table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS library_authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create books table. quantity is the owned capacity, not a live counter
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS library_books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            fk_author INTEGER NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
            FOREIGN KEY (fk_author) REFERENCES library_authors(id) ON DELETE CASCADE
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create users table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS library_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create borrowed_books table (one row per borrow transaction, never deleted)
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS library_borrowed_books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fk_book_id INTEGER NOT NULL,
            fk_user_id INTEGER NOT NULL,
            borrowed_at TEXT NOT NULL,
            returned_at TEXT,
            FOREIGN KEY (fk_book_id) REFERENCES library_books(id) ON DELETE CASCADE,
            FOREIGN KEY (fk_user_id) REFERENCES library_users(id) ON DELETE CASCADE
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create indexes for borrowed_books
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE INDEX IF NOT EXISTS idx_borrowed_books_book_open ON library_borrowed_books(fk_book_id, returned_at)"
            .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE INDEX IF NOT EXISTS idx_borrowed_books_user ON library_borrowed_books(fk_user_id)"
            .to_owned(),
    ))
    .await?;

    Ok(())
}
