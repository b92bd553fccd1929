use chrono::{Duration, TimeZone, Utc};
use library_lending::{
    InMemoryLibrary, LendingPolicy, Library, LibraryConfig, LocalStorage, ManualClock,
    SnapshotStore,
};
use std::io::Write;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

#[tokio::test]
async fn test_state_survives_reload_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().to_str().unwrap().to_string();
    let snapshots = SnapshotStore::new(LocalStorage::new(data_dir.clone()), "library.json");
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 20, 10, 30, 0).unwrap());
    let config = LibraryConfig::default();

    // first run: seed, borrow, return late, persist
    let store = Arc::new(InMemoryLibrary::new());
    let library = Library::from_store(store.clone(), Arc::new(clock.clone()), config.policy);
    library.catalog.seed(&config.seed).await.unwrap();
    let borrowing = library.lending.borrow_book("JK-45", "M001").await.unwrap();
    clock.advance(Duration::days(9));
    library.lending.return_book(&borrowing.id).await.unwrap();
    library.lending.borrow_book("TW-11", "M002").await.unwrap();
    snapshots.save(&store.snapshot().await).await.unwrap();
    assert!(temp_dir.path().join("library.json").exists());

    // second run: reload and check the derived state is intact
    let snapshot = snapshots.load().await.unwrap().expect("snapshot written");
    let store = Arc::new(InMemoryLibrary::from_snapshot(snapshot).unwrap());
    let library = Library::from_store(store, Arc::new(clock.clone()), config.policy);

    let book = library.catalog.find_book_by_code("TW-11").await.unwrap();
    assert!(!book.is_available());
    let member = library.catalog.find_member_by_code("M001").await.unwrap();
    assert_eq!(library.member_view(&member).is_penalized, Some(true));
    assert_eq!(library.lending.find_all_borrowings().await.unwrap().len(), 2);

    let err = library.lending.return_book(&borrowing.id).await.unwrap_err();
    assert!(err.to_string().contains("already returned"));
}

#[tokio::test]
async fn test_configured_policy_drives_the_rules() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[policy]
max_active_borrowings = 1

[[seed.books]]
code = "A-1"
title = "First"
author = "Someone"
stock = 5

[[seed.books]]
code = "A-2"
title = "Second"
author = "Someone"
stock = 5

[[seed.members]]
code = "M001"
name = "Reader"
"#
    )
    .unwrap();
    let config = LibraryConfig::from_file(file.path()).unwrap();
    assert_eq!(
        config.policy,
        LendingPolicy {
            max_active_borrowings: 1,
            ..LendingPolicy::default()
        }
    );

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 20, 10, 30, 0).unwrap());
    let library = Library::from_store(
        Arc::new(InMemoryLibrary::new()),
        Arc::new(clock),
        config.policy,
    );
    library.catalog.seed(&config.seed).await.unwrap();

    library.lending.borrow_book("A-1", "M001").await.unwrap();
    let err = library
        .lending
        .borrow_book("A-2", "M001")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("maximum number of books (1)"));
}
