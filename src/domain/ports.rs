use crate::domain::model::{Book, Borrowing, BorrowingId, Member};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Byte storage for snapshot files.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// Source of "now" for every time-dependent rule.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Books come back with their borrowings populated.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Book>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Book>>;
    async fn save(&self, book: Book) -> Result<Book>;
    async fn update(&self, book: Book) -> Result<Book>;
}

/// Members come back with their borrowings populated.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Member>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Member>>;
    async fn save(&self, member: Member) -> Result<Member>;
    async fn update(&self, member: Member) -> Result<Member>;
}

#[async_trait]
pub trait BorrowingRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Borrowing>>;
    async fn find_by_id(&self, id: &BorrowingId) -> Result<Option<Borrowing>>;
    async fn find_active_by_member(&self, member_code: &str) -> Result<Vec<Borrowing>>;
    async fn find_active_by_book(&self, book_code: &str) -> Result<Vec<Borrowing>>;
    async fn save(&self, borrowing: Borrowing) -> Result<Borrowing>;
    async fn update(&self, borrowing: Borrowing) -> Result<Borrowing>;
}
