use crate::core::locks::KeyedLocks;
use crate::domain::model::{Borrowing, BorrowingId};
use crate::domain::policy::LendingPolicy;
use crate::domain::ports::{BookRepository, BorrowingRepository, Clock, MemberRepository};
use crate::utils::error::{LendingError, PolicyViolation, Result};
use std::sync::Arc;

/// Borrow and return orchestration.
///
/// Each operation loads what it needs, asks the entities to evaluate their
/// rules and only then writes, so a rejected request never reaches the
/// store. Borrows hold the book and member locks across the whole
/// sequence; returns hold the borrowing lock.
pub struct LendingService {
    books: Arc<dyn BookRepository>,
    members: Arc<dyn MemberRepository>,
    borrowings: Arc<dyn BorrowingRepository>,
    clock: Arc<dyn Clock>,
    policy: LendingPolicy,
    locks: Arc<KeyedLocks>,
}

impl LendingService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        members: Arc<dyn MemberRepository>,
        borrowings: Arc<dyn BorrowingRepository>,
        clock: Arc<dyn Clock>,
        policy: LendingPolicy,
        locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            books,
            members,
            borrowings,
            clock,
            policy,
            locks,
        }
    }

    /// Checks run in a fixed order: book exists, member exists, book
    /// available, member eligible. The first failing check decides the error.
    pub async fn borrow_book(&self, book_code: &str, member_code: &str) -> Result<Borrowing> {
        let _guard = self.locks.book_and_member(book_code, member_code).await;

        let book = self
            .books
            .find_by_code(book_code)
            .await?
            .ok_or_else(|| LendingError::not_found("Book", format!("code {book_code}")))?;
        let member = self
            .members
            .find_by_code(member_code)
            .await?
            .ok_or_else(|| LendingError::not_found("Member", format!("code {member_code}")))?;

        if !book.is_available() {
            return Err(self.reject(
                book_code,
                member_code,
                PolicyViolation::NotAvailable {
                    title: book.title.clone(),
                },
            ));
        }

        let now = self.clock.now();
        if !member.can_borrow_books(now, &self.policy) {
            let violation = if member.is_penalized(now, &self.policy).unwrap_or(false) {
                PolicyViolation::Penalized {
                    name: member.name.clone(),
                }
            } else {
                PolicyViolation::BorrowLimitReached {
                    name: member.name.clone(),
                    limit: self.policy.max_active_borrowings,
                }
            };
            return Err(self.reject(book_code, member_code, violation));
        }

        let borrowing = self
            .borrowings
            .save(Borrowing::new(&book.code, &member.code, now))
            .await?;

        tracing::info!(
            borrowing_id = %borrowing.id,
            book_code,
            member_code,
            "Book borrowed"
        );
        Ok(borrowing)
    }

    pub async fn return_book(&self, id: &BorrowingId) -> Result<Borrowing> {
        let _guard = self.locks.borrowing(id).await;

        let mut borrowing = self.find_borrowing_by_id(id).await?;
        if borrowing.is_returned() {
            tracing::warn!(borrowing_id = %id, "Return rejected: already returned");
            return Err(PolicyViolation::AlreadyReturned.into());
        }

        borrowing.return_book(self.clock.now())?;
        let borrowing = self.borrowings.update(borrowing).await?;

        tracing::info!(
            borrowing_id = %borrowing.id,
            book_code = %borrowing.book_code,
            member_code = %borrowing.member_code,
            days = borrowing.duration_days(),
            late = borrowing.is_penalized(&self.policy),
            "Book returned"
        );
        Ok(borrowing)
    }

    pub async fn find_all_borrowings(&self) -> Result<Vec<Borrowing>> {
        self.borrowings.find_all().await
    }

    pub async fn find_borrowing_by_id(&self, id: &BorrowingId) -> Result<Borrowing> {
        self.borrowings
            .find_by_id(id)
            .await?
            .ok_or_else(|| LendingError::not_found("Borrowing", format!("ID {id}")))
    }

    pub async fn get_active_borrowings_by_member(&self, member_code: &str) -> Result<Vec<Borrowing>> {
        self.borrowings.find_active_by_member(member_code).await
    }

    pub async fn get_active_borrowings_by_book(&self, book_code: &str) -> Result<Vec<Borrowing>> {
        self.borrowings.find_active_by_book(book_code).await
    }

    fn reject(&self, book_code: &str, member_code: &str, violation: PolicyViolation) -> LendingError {
        tracing::warn!(book_code, member_code, reason = %violation, "Borrow rejected");
        violation.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLibrary, ManualClock};
    use crate::domain::model::{Book, Member};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 10, 30, 0).unwrap()
    }

    async fn service_with(
        books: &[(&str, u32)],
        members: &[&str],
    ) -> (LendingService, Arc<InMemoryLibrary>, ManualClock) {
        let store = Arc::new(InMemoryLibrary::new());
        for (code, stock) in books {
            BookRepository::save(
                store.as_ref(),
                Book::new(*code, format!("Title {code}"), "Author", *stock),
            )
            .await
            .unwrap();
        }
        for code in members {
            MemberRepository::save(store.as_ref(), Member::new(*code, format!("Member {code}")))
                .await
                .unwrap();
        }
        let clock = ManualClock::new(start());
        let service = LendingService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(clock.clone()),
            LendingPolicy::default(),
            Arc::new(KeyedLocks::new()),
        );
        (service, store, clock)
    }

    #[tokio::test]
    async fn test_borrow_creates_active_borrowing() {
        let (service, store, _) = service_with(&[("TEST-1", 1)], &["M001"]).await;

        let borrowing = service.borrow_book("TEST-1", "M001").await.unwrap();
        assert_eq!(borrowing.book_code, "TEST-1");
        assert_eq!(borrowing.member_code, "M001");
        assert_eq!(borrowing.borrow_date, start());
        assert_eq!(borrowing.return_date, None);

        let stored = store.find_by_id(&borrowing.id).await.unwrap();
        assert_eq!(stored, Some(borrowing));
    }

    #[tokio::test]
    async fn test_check_order_book_before_member() {
        let (service, _, _) = service_with(&[("TEST-1", 1)], &["M001"]).await;

        let err = service.borrow_book("NOPE", "NOBODY").await.unwrap_err();
        assert!(matches!(err, LendingError::NotFound { entity: "Book", .. }));

        let err = service.borrow_book("TEST-1", "NOBODY").await.unwrap_err();
        assert!(matches!(err, LendingError::NotFound { entity: "Member", .. }));
    }

    #[tokio::test]
    async fn test_unavailable_wins_over_limit() {
        let (service, _, _) =
            service_with(&[("TEST-1", 1), ("TEST-2", 1), ("TEST-3", 1)], &["M001"]).await;
        service.borrow_book("TEST-1", "M001").await.unwrap();
        service.borrow_book("TEST-2", "M001").await.unwrap();

        // member is at the limit and TEST-1 is out; availability is checked first
        let err = service.borrow_book("TEST-1", "M001").await.unwrap_err();
        assert!(matches!(
            err,
            LendingError::PolicyViolation(PolicyViolation::NotAvailable { .. })
        ));

        let err = service.borrow_book("TEST-3", "M001").await.unwrap_err();
        assert!(err.to_string().contains("maximum number of books (2)"));
    }

    #[tokio::test]
    async fn test_penalty_reported_before_limit() {
        let (service, _, clock) =
            service_with(&[("TEST-1", 1), ("TEST-2", 1)], &["M001"]).await;
        let late = service.borrow_book("TEST-1", "M001").await.unwrap();
        clock.advance(Duration::days(8));
        service.return_book(&late.id).await.unwrap();

        let err = service.borrow_book("TEST-2", "M001").await.unwrap_err();
        assert!(matches!(
            err,
            LendingError::PolicyViolation(PolicyViolation::Penalized { .. })
        ));
    }

    #[tokio::test]
    async fn test_return_twice_is_policy_violation() {
        let (service, _, clock) = service_with(&[("TEST-1", 1)], &["M001"]).await;
        let borrowing = service.borrow_book("TEST-1", "M001").await.unwrap();
        clock.advance(Duration::hours(5));

        let returned = service.return_book(&borrowing.id).await.unwrap();
        assert_eq!(returned.return_date, Some(start() + Duration::hours(5)));

        clock.advance(Duration::days(1));
        let err = service.return_book(&borrowing.id).await.unwrap_err();
        assert!(matches!(
            err,
            LendingError::PolicyViolation(PolicyViolation::AlreadyReturned)
        ));
        let stored = service.find_borrowing_by_id(&borrowing.id).await.unwrap();
        assert_eq!(stored.return_date, returned.return_date);
    }

    #[tokio::test]
    async fn test_return_unknown_id_is_not_found() {
        let (service, _, _) = service_with(&[], &[]).await;
        let err = service.return_book(&BorrowingId::new()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    struct CountingBorrowings {
        inner: Arc<InMemoryLibrary>,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl BorrowingRepository for CountingBorrowings {
        async fn find_all(&self) -> Result<Vec<Borrowing>> {
            BorrowingRepository::find_all(self.inner.as_ref()).await
        }
        async fn find_by_id(&self, id: &BorrowingId) -> Result<Option<Borrowing>> {
            self.inner.find_by_id(id).await
        }
        async fn find_active_by_member(&self, code: &str) -> Result<Vec<Borrowing>> {
            self.inner.find_active_by_member(code).await
        }
        async fn find_active_by_book(&self, code: &str) -> Result<Vec<Borrowing>> {
            self.inner.find_active_by_book(code).await
        }
        async fn save(&self, borrowing: Borrowing) -> Result<Borrowing> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            BorrowingRepository::save(self.inner.as_ref(), borrowing).await
        }
        async fn update(&self, borrowing: Borrowing) -> Result<Borrowing> {
            BorrowingRepository::update(self.inner.as_ref(), borrowing).await
        }
    }

    #[tokio::test]
    async fn test_rejected_borrow_never_persists() {
        let (_, store, clock) = service_with(&[("TEST-1", 1)], &["M001", "M002"]).await;
        let counting = Arc::new(CountingBorrowings {
            inner: store.clone(),
            saves: AtomicUsize::new(0),
        });
        let service = LendingService::new(
            store.clone(),
            store.clone(),
            counting.clone(),
            Arc::new(clock),
            LendingPolicy::default(),
            Arc::new(KeyedLocks::new()),
        );

        service.borrow_book("TEST-1", "M001").await.unwrap();
        assert!(service.borrow_book("TEST-1", "M002").await.is_err());
        assert!(service.borrow_book("MISSING", "M002").await.is_err());
        assert_eq!(counting.saves.load(Ordering::SeqCst), 1);
    }
}
