use crate::domain::model::BorrowingId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Slots nobody holds or waits on are dropped once the map reaches this size.
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per key, created on first use.
///
/// Check-and-write sequences on a book, a member or a borrowing run under
/// that key's guard. When a sequence needs both a book and a member it
/// takes the book first; no path takes them in the other order.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: DashMap<String, Arc<Mutex<()>>>,
}

pub struct BorrowGuard {
    _book: OwnedMutexGuard<()>,
    _member: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock(&self, key: String) -> OwnedMutexGuard<()> {
        if self.slots.len() >= PRUNE_THRESHOLD {
            self.slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        }
        // the shard guard must be gone before awaiting
        let slot = Arc::clone(&self.slots.entry(key).or_default());
        slot.lock_owned().await
    }

    pub async fn book(&self, code: &str) -> OwnedMutexGuard<()> {
        self.lock(format!("book:{code}")).await
    }

    pub async fn member(&self, code: &str) -> OwnedMutexGuard<()> {
        self.lock(format!("member:{code}")).await
    }

    pub async fn borrowing(&self, id: &BorrowingId) -> OwnedMutexGuard<()> {
        self.lock(format!("borrowing:{id}")).await
    }

    pub async fn book_and_member(&self, book_code: &str, member_code: &str) -> BorrowGuard {
        let book = self.book(book_code).await;
        let member = self.member(member_code).await;
        BorrowGuard {
            _book: book,
            _member: member,
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
