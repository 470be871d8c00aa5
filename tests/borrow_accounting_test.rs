use library_desk::db;
use library_desk::domain::DomainError;
use library_desk::models::{author, book, borrowed_book, user};
use library_desk::services::borrow_service::{self, Availability};
use library_desk::services::BookLocks;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use std::sync::Arc;

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

// File-backed database with the default connection pool, so requests can
// really run in parallel
async fn setup_file_db(dir: &tempfile::TempDir) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("library.db").display());
    db::init_db(&url).await.expect("Failed to init file DB")
}

// Helper to create a test author
async fn create_test_author(db: &DatabaseConnection, name: &str) -> i32 {
    let author = author::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    author.insert(db).await.expect("Failed to create author").id
}

// Helper to create a test book with the given capacity
async fn create_test_book(db: &DatabaseConnection, title: &str, quantity: i32) -> i32 {
    let author_id = create_test_author(db, "Test Author").await;
    let book = book::ActiveModel {
        title: Set(title.to_string()),
        fk_author: Set(author_id),
        quantity: Set(quantity),
        ..Default::default()
    };
    book.insert(db).await.expect("Failed to create book").id
}

// Helper to create a test user
async fn create_test_user(db: &DatabaseConnection, username: &str) -> i32 {
    let user = user::ActiveModel {
        username: Set(username.to_string()),
        ..Default::default()
    };
    user.insert(db).await.expect("Failed to create user").id
}

async fn available(db: &DatabaseConnection, book_id: i32) -> i64 {
    match borrow_service::availability(db, Some(book_id))
        .await
        .expect("Availability failed")
    {
        Availability::Single(n) => n,
        other => panic!("expected a single figure, got {:?}", other),
    }
}

async fn open_count(db: &DatabaseConnection, book_id: i32) -> u64 {
    borrowed_book::Entity::find()
        .filter(borrowed_book::Column::FkBookId.eq(book_id))
        .filter(borrowed_book::Column::ReturnedAt.is_null())
        .count(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_borrow_return_scenario() {
    let db = setup_test_db().await;
    let locks = BookLocks::new();

    let book_id = create_test_book(&db, "Dune", 2).await;
    let alice = create_test_user(&db, "alice").await;
    let bob = create_test_user(&db, "bob").await;
    let carol = create_test_user(&db, "carol").await;

    // No records yet: full capacity
    assert_eq!(available(&db, book_id).await, 2);

    // Alice borrows
    let record = borrow_service::borrow_book(&db, &locks, Some(book_id), Some(alice))
        .await
        .expect("Alice should borrow");
    assert!(record.is_open());
    assert_eq!(record.fk_book_id, book_id);
    assert_eq!(record.fk_user_id, alice);
    assert_eq!(available(&db, book_id).await, 1);

    // Alice again
    let err = borrow_service::borrow_book(&db, &locks, Some(book_id), Some(alice))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::AlreadyBorrowed);

    // Bob takes the last copy
    borrow_service::borrow_book(&db, &locks, Some(book_id), Some(bob))
        .await
        .expect("Bob should borrow");
    assert_eq!(available(&db, book_id).await, 0);

    // Carol finds nothing left
    let err = borrow_service::borrow_book(&db, &locks, Some(book_id), Some(carol))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NoCopiesLeft);

    // Alice returns
    let returned = borrow_service::return_book(&db, &locks, Some(book_id), Some(alice))
        .await
        .expect("Alice should return");
    assert_eq!(returned.len(), 1);
    assert_eq!(returned[0].id, record.id);
    assert!(returned[0].returned_at.is_some());
    assert_eq!(available(&db, book_id).await, 1);

    // The freed copy can be borrowed again
    borrow_service::borrow_book(&db, &locks, Some(book_id), Some(carol))
        .await
        .expect("Carol should borrow after the return");
    assert_eq!(available(&db, book_id).await, 0);
}

#[tokio::test]
async fn test_borrow_missing_user_or_book() {
    let db = setup_test_db().await;
    let locks = BookLocks::new();
    let book_id = create_test_book(&db, "Foundation", 1).await;
    let user_id = create_test_user(&db, "alice").await;

    let err = borrow_service::borrow_book(&db, &locks, Some(book_id), None)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::not_found("user not found"));

    let err = borrow_service::borrow_book(&db, &locks, Some(book_id), Some(999))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::not_found("user not found"));

    let err = borrow_service::borrow_book(&db, &locks, Some(999), Some(user_id))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::not_found("Book not found"));

    let err = borrow_service::borrow_book(&db, &locks, None, Some(user_id))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::not_found("Book not found"));

    assert_eq!(open_count(&db, book_id).await, 0);
}

#[tokio::test]
async fn test_zero_quantity_book_cannot_be_borrowed() {
    let db = setup_test_db().await;
    let locks = BookLocks::new();
    let book_id = create_test_book(&db, "Out of print", 0).await;
    let user_id = create_test_user(&db, "alice").await;

    assert_eq!(available(&db, book_id).await, 0);
    let err = borrow_service::borrow_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NoCopiesLeft);
}

#[tokio::test]
async fn test_return_without_open_record() {
    let db = setup_test_db().await;
    let locks = BookLocks::new();
    let book_id = create_test_book(&db, "I, Robot", 1).await;
    let user_id = create_test_user(&db, "alice").await;

    // Never borrowed
    let err = borrow_service::return_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    // Borrowed then returned: the closed record is not returned twice
    borrow_service::borrow_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap();
    borrow_service::return_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap();
    let err = borrow_service::return_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    // Absent identifiers
    let err = borrow_service::return_book(&db, &locks, None, Some(user_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_return_closes_earliest_duplicate() {
    let db = setup_test_db().await;
    let locks = BookLocks::new();
    let book_id = create_test_book(&db, "The Hobbit", 3).await;
    let user_id = create_test_user(&db, "alice").await;

    // Duplicate open records left behind by an unserialized writer
    let later = borrowed_book::ActiveModel {
        fk_book_id: Set(book_id),
        fk_user_id: Set(user_id),
        borrowed_at: Set("2024-03-02T09:00:00.000000Z".to_string()),
        returned_at: Set(None),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    let earlier = borrowed_book::ActiveModel {
        fk_book_id: Set(book_id),
        fk_user_id: Set(user_id),
        borrowed_at: Set("2024-03-01T09:00:00.000000Z".to_string()),
        returned_at: Set(None),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    assert_eq!(available(&db, book_id).await, 1);

    let first = borrow_service::return_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, earlier.id);
    assert_eq!(open_count(&db, book_id).await, 1);
    assert_eq!(available(&db, book_id).await, 2);

    let second = borrow_service::return_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap();
    assert_eq!(second[0].id, later.id);
    assert_eq!(open_count(&db, book_id).await, 0);
}

#[tokio::test]
async fn test_availability_for_all_books() {
    let db = setup_test_db().await;
    let locks = BookLocks::new();
    let dune = create_test_book(&db, "Dune", 2).await;
    let hobbit = create_test_book(&db, "The Hobbit", 1).await;
    let user_id = create_test_user(&db, "alice").await;

    borrow_service::borrow_book(&db, &locks, Some(dune), Some(user_id))
        .await
        .unwrap();

    let Availability::All(rows) = borrow_service::availability(&db, None).await.unwrap() else {
        panic!("expected figures for every book");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, dune);
    assert_eq!(rows[0].title, "Dune");
    assert_eq!(rows[0].total_quantity, 2);
    assert_eq!(rows[0].available_quantity, 1);
    assert_eq!(rows[1].id, hobbit);
    assert_eq!(rows[1].available_quantity, 1);

    let err = borrow_service::availability(&db, Some(999)).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_borrowed_books_by_user() {
    let db = setup_test_db().await;
    let locks = BookLocks::new();
    let dune = create_test_book(&db, "Dune", 2).await;
    let hobbit = create_test_book(&db, "The Hobbit", 2).await;
    let alice = create_test_user(&db, "alice").await;
    let bob = create_test_user(&db, "bob").await;

    borrow_service::borrow_book(&db, &locks, Some(dune), Some(alice))
        .await
        .unwrap();
    borrow_service::borrow_book(&db, &locks, Some(hobbit), Some(alice))
        .await
        .unwrap();
    borrow_service::return_book(&db, &locks, Some(dune), Some(alice))
        .await
        .unwrap();

    // Open and closed records are both listed, oldest first
    let rows = borrow_service::borrowed_books_by_user(&db, alice)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, dune);
    assert_eq!(rows[0].title, "Dune");
    assert_eq!(rows[0].author, "Test Author");
    assert_eq!(rows[0].quantity, 2);
    assert!(rows[0].returned_at.is_some());
    assert_eq!(rows[1].id, hobbit);
    assert!(rows[1].returned_at.is_none());

    // Known user without history
    let rows = borrow_service::borrowed_books_by_user(&db, bob).await.unwrap();
    assert!(rows.is_empty());

    // Unknown user
    let err = borrow_service::borrowed_books_by_user(&db, 999)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::not_found("User not found"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_never_exceed_quantity() {
    let db = setup_test_db().await;
    let locks = Arc::new(BookLocks::new());
    let book_id = create_test_book(&db, "Dune", 3).await;

    let mut users = Vec::new();
    for i in 0..10 {
        users.push(create_test_user(&db, &format!("reader{}", i)).await);
    }

    let mut handles = Vec::new();
    for user_id in users {
        let db = db.clone();
        let locks = locks.clone();
        handles.push(tokio::spawn(async move {
            borrow_service::borrow_book(&db, &locks, Some(book_id), Some(user_id)).await
        }));
    }

    let mut granted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => granted += 1,
            Err(e) => assert_eq!(e, DomainError::NoCopiesLeft),
        }
    }

    assert_eq!(granted, 3);
    assert_eq!(open_count(&db, book_id).await, 3);
    assert_eq!(available(&db, book_id).await, 0);
}

#[tokio::test]
async fn test_unknown_books_leave_no_lock_entries() {
    let db = setup_test_db().await;
    let locks = BookLocks::new();
    let user_id = create_test_user(&db, "alice").await;

    for id in 1000..1200 {
        let err = borrow_service::borrow_book(&db, &locks, Some(id), Some(user_id))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("Book not found"));

        let err = borrow_service::return_book(&db, &locks, Some(id), Some(user_id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
    assert!(locks.is_empty());

    // Known books release their entry once the decision is done
    let book_id = create_test_book(&db, "Dune", 1).await;
    borrow_service::borrow_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap();
    borrow_service::borrow_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap_err();
    borrow_service::return_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap();
    assert!(locks.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_borrows_on_pooled_file_db() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_file_db(&dir).await;
    let locks = Arc::new(BookLocks::new());

    let contested = create_test_book(&db, "Dune", 3).await;
    let mut others = Vec::new();
    for i in 0..6 {
        others.push(create_test_book(&db, &format!("Volume {}", i), 2).await);
    }

    let mut users = Vec::new();
    for i in 0..12 {
        users.push(create_test_user(&db, &format!("reader{}", i)).await);
    }

    // Every user goes for the contested book and for every other book at once
    let mut handles = Vec::new();
    for &user_id in &users {
        for &book_id in std::iter::once(&contested).chain(others.iter()) {
            let db = db.clone();
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                let result =
                    borrow_service::borrow_book(&db, &locks, Some(book_id), Some(user_id)).await;
                (book_id, result)
            }));
        }
    }

    let mut granted: std::collections::HashMap<i32, usize> = std::collections::HashMap::new();
    for handle in handles {
        let (book_id, result) = handle.await.unwrap();
        match result {
            Ok(_) => *granted.entry(book_id).or_default() += 1,
            Err(e) => assert_eq!(e, DomainError::NoCopiesLeft),
        }
    }

    assert_eq!(granted.get(&contested), Some(&3));
    assert_eq!(open_count(&db, contested).await, 3);
    assert_eq!(available(&db, contested).await, 0);
    for book_id in others {
        assert_eq!(granted.get(&book_id), Some(&2));
        assert_eq!(open_count(&db, book_id).await, 2);
        assert_eq!(available(&db, book_id).await, 0);
    }
    assert!(locks.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_returns_close_each_record_once() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_file_db(&dir).await;
    let locks = Arc::new(BookLocks::new());

    let book_id = create_test_book(&db, "Dune", 1).await;
    let user_id = create_test_user(&db, "alice").await;
    borrow_service::borrow_book(&db, &locks, Some(book_id), Some(user_id))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        let locks = locks.clone();
        handles.push(tokio::spawn(async move {
            borrow_service::return_book(&db, &locks, Some(book_id), Some(user_id)).await
        }));
    }

    let mut closed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(records) => closed += records.len(),
            Err(e) => assert!(matches!(e, DomainError::NotFound(_))),
        }
    }

    assert_eq!(closed, 1);
    assert_eq!(available(&db, book_id).await, 1);
}
