// Adapters layer: concrete implementations of the domain ports.

pub mod clock;
pub mod memory;
pub mod snapshot;

pub use clock::{ManualClock, SystemClock};
pub use memory::{InMemoryLibrary, LibrarySnapshot};
pub use snapshot::SnapshotStore;
