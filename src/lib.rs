pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{InMemoryLibrary, LibrarySnapshot, ManualClock, SnapshotStore, SystemClock};
pub use config::{
    cli::{LocalStorage, StorageLock},
    toml_config::LibraryConfig,
};
pub use core::{
    catalog::{BookUpdate, CatalogService, MemberUpdate, NewBook, NewMember},
    lending::LendingService,
    library::Library,
    views::{BookView, BorrowingView, MemberView},
};
pub use domain::{
    model::{Book, Borrowing, BorrowingId, Member},
    policy::LendingPolicy,
};
pub use utils::error::{ErrorKind, LendingError, PolicyViolation, Result};
