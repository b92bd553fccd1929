use crate::domain::model::{Book, Borrowing, BorrowingId, Member};
use crate::domain::policy::LendingPolicy;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookView {
    pub code: String,
    pub title: String,
    pub author: String,
    pub stock: u32,
    pub available_stock: i64,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        Self {
            code: book.code.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            stock: book.stock,
            available_stock: book.available_stock(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberView {
    pub code: String,
    pub name: String,
    pub borrowed_books_count: usize,
    pub is_penalized: Option<bool>,
    pub penalty_end_date: Option<DateTime<Utc>>,
}

impl MemberView {
    pub fn new(member: &Member, now: DateTime<Utc>, policy: &LendingPolicy) -> Self {
        Self {
            code: member.code.clone(),
            name: member.name.clone(),
            borrowed_books_count: member.active_borrowings().len(),
            is_penalized: member.is_penalized(now, policy),
            penalty_end_date: member.penalty_end_date(policy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorrowingView {
    pub id: BorrowingId,
    pub book_code: String,
    pub member_code: String,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

impl From<&Borrowing> for BorrowingView {
    fn from(borrowing: &Borrowing) -> Self {
        Self {
            id: borrowing.id,
            book_code: borrowing.book_code.clone(),
            member_code: borrowing.member_code.clone(),
            borrow_date: borrowing.borrow_date,
            return_date: borrowing.return_date,
        }
    }
}
