use crate::core::catalog::CatalogService;
use crate::core::lending::LendingService;
use crate::core::locks::KeyedLocks;
use crate::core::views::MemberView;
use crate::domain::model::Member;
use crate::domain::policy::LendingPolicy;
use crate::domain::ports::{BookRepository, BorrowingRepository, Clock, MemberRepository};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Catalog and lending services sharing one clock, one policy and one set
/// of per-key locks.
pub struct Library {
    pub catalog: CatalogService,
    pub lending: LendingService,
    clock: Arc<dyn Clock>,
    policy: LendingPolicy,
}

impl Library {
    pub fn new(
        books: Arc<dyn BookRepository>,
        members: Arc<dyn MemberRepository>,
        borrowings: Arc<dyn BorrowingRepository>,
        clock: Arc<dyn Clock>,
        policy: LendingPolicy,
    ) -> Self {
        let locks = Arc::new(KeyedLocks::new());
        Self {
            catalog: CatalogService::new(books.clone(), members.clone(), locks.clone()),
            lending: LendingService::new(books, members, borrowings, clock.clone(), policy, locks),
            clock,
            policy,
        }
    }

    /// Wire every repository port to one store.
    pub fn from_store<S>(store: Arc<S>, clock: Arc<dyn Clock>, policy: LendingPolicy) -> Self
    where
        S: BookRepository + MemberRepository + BorrowingRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store, clock, policy)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    pub fn member_view(&self, member: &Member) -> MemberView {
        MemberView::new(member, self.now(), &self.policy)
    }
}
