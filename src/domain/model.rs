use crate::domain::policy::LendingPolicy;
use crate::utils::error::{LendingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowingId(Uuid);

impl BorrowingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BorrowingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BorrowingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BorrowingId {
    type Err = LendingError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| LendingError::validation("borrowing_id", e.to_string()))
    }
}

/// A catalog entry. `borrowings` is populated by the store on load from
/// its borrowing index and is never persisted with the book itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub code: String,
    pub title: String,
    pub author: String,
    pub stock: u32,
    #[serde(skip)]
    pub borrowings: Vec<Borrowing>,
}

impl Book {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        stock: u32,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            author: author.into(),
            stock,
            borrowings: Vec::new(),
        }
    }

    pub fn active_borrowing_count(&self) -> usize {
        self.borrowings.iter().filter(|b| !b.is_returned()).count()
    }

    /// Copies on the shelf. Negative only if stock was oversold.
    pub fn available_stock(&self) -> i64 {
        i64::from(self.stock) - self.active_borrowing_count() as i64
    }

    pub fn is_available(&self) -> bool {
        self.available_stock() > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub code: String,
    pub name: String,
    #[serde(skip)]
    pub borrowings: Vec<Borrowing>,
}

impl Member {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            borrowings: Vec::new(),
        }
    }

    pub fn active_borrowings(&self) -> Vec<&Borrowing> {
        self.borrowings.iter().filter(|b| !b.is_returned()).collect()
    }

    pub fn can_borrow_books(&self, now: DateTime<Utc>, policy: &LendingPolicy) -> bool {
        self.active_borrowings().len() < policy.max_active_borrowings
            && !self.is_penalized(now, policy).unwrap_or(false)
    }

    /// `None` when the member has never returned a book late.
    pub fn is_penalized(&self, now: DateTime<Utc>, policy: &LendingPolicy) -> Option<bool> {
        self.penalty_end_date(policy).map(|end| end > now)
    }

    /// End of the penalty window opened by the most recent late return.
    /// On equal return dates the earliest-recorded borrowing wins; all
    /// tied candidates yield the same end date.
    pub fn penalty_end_date(&self, policy: &LendingPolicy) -> Option<DateTime<Utc>> {
        let mut latest: Option<DateTime<Utc>> = None;
        for returned in self
            .borrowings
            .iter()
            .filter(|b| b.is_penalized(policy))
            .filter_map(|b| b.return_date)
        {
            match latest {
                Some(current) if returned <= current => {}
                _ => latest = Some(returned),
            }
        }
        latest.map(|returned| {
            returned
                .checked_add_signed(policy.penalty_window())
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }
}

/// One loan of one book to one member.
///
/// Active while `return_date` is `None`; the return transition happens at
/// most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrowing {
    pub id: BorrowingId,
    pub book_code: String,
    pub member_code: String,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

impl Borrowing {
    pub fn new(
        book_code: impl Into<String>,
        member_code: impl Into<String>,
        borrow_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BorrowingId::new(),
            book_code: book_code.into(),
            member_code: member_code.into(),
            borrow_date,
            return_date: None,
        }
    }

    pub fn is_returned(&self) -> bool {
        self.return_date.is_some()
    }

    /// Whole elapsed days between borrow and return, truncated. Zero while
    /// the loan is active.
    pub fn duration_days(&self) -> i64 {
        match self.return_date {
            Some(returned) => (returned - self.borrow_date).num_days(),
            None => 0,
        }
    }

    pub fn is_penalized(&self, policy: &LendingPolicy) -> bool {
        self.duration_days() > policy.loan_period_days
    }

    /// ACTIVE -> RETURNED. Calling it on a returned borrowing is a state
    /// violation and leaves `return_date` untouched.
    pub fn return_book(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.is_returned() {
            return Err(LendingError::state(format!(
                "borrowing {} has already been returned",
                self.id
            )));
        }
        self.return_date = Some(now.max(self.borrow_date));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
    }

    fn returned(member: &str, borrowed: DateTime<Utc>, days: i64) -> Borrowing {
        let mut b = Borrowing::new("B001", member, borrowed);
        b.return_book(borrowed + Duration::days(days)).unwrap();
        b
    }

    #[test]
    fn test_book_available_stock_ignores_returned() {
        let mut book = Book::new("B001", "Book 1", "Author", 2);
        assert_eq!(book.available_stock(), 2);

        book.borrowings.push(Borrowing::new("B001", "M001", at(1, 10, 0)));
        book.borrowings.push(returned("M002", at(1, 10, 0), 1));
        assert_eq!(book.available_stock(), 1);
        assert!(book.is_available());

        book.borrowings.push(Borrowing::new("B001", "M003", at(2, 10, 0)));
        assert_eq!(book.available_stock(), 0);
        assert!(!book.is_available());
    }

    #[test]
    fn test_single_copy_becomes_unavailable() {
        let mut book = Book::new("B001", "Book 1", "Author", 1);
        assert!(book.is_available());
        book.borrowings.push(Borrowing::new("B001", "M001", at(1, 10, 0)));
        assert!(!book.is_available());
    }

    #[test]
    fn test_duration_truncates_elapsed_hours() {
        let mut b = Borrowing::new("B001", "M001", at(1, 23, 59));
        assert_eq!(b.duration_days(), 0);
        b.return_book(at(3, 0, 1)).unwrap();
        assert_eq!(b.duration_days(), 1);
    }

    #[test]
    fn test_late_threshold_is_strict() {
        let policy = LendingPolicy::default();
        assert!(!returned("M001", at(1, 9, 0), 7).is_penalized(&policy));
        assert!(returned("M001", at(1, 9, 0), 8).is_penalized(&policy));
        assert!(!Borrowing::new("B001", "M001", at(1, 9, 0)).is_penalized(&policy));
    }

    #[test]
    fn test_return_twice_fails_and_keeps_first_date() {
        let mut b = Borrowing::new("B001", "M001", at(1, 9, 0));
        b.return_book(at(2, 9, 0)).unwrap();
        let err = b.return_book(at(5, 9, 0)).unwrap_err();
        assert!(matches!(err, LendingError::StateViolation { .. }));
        assert_eq!(b.return_date, Some(at(2, 9, 0)));
    }

    #[test]
    fn test_return_before_borrow_is_clamped() {
        let mut b = Borrowing::new("B001", "M001", at(2, 9, 0));
        b.return_book(at(1, 9, 0)).unwrap();
        assert_eq!(b.return_date, Some(at(2, 9, 0)));
    }

    #[test]
    fn test_member_limit_and_active_borrowings() {
        let policy = LendingPolicy::default();
        let now = at(10, 9, 0);
        let mut member = Member::new("M001", "Test Member");
        assert!(member.active_borrowings().is_empty());
        assert!(member.can_borrow_books(now, &policy));

        member.borrowings.push(returned("M001", at(1, 9, 0), 2));
        member.borrowings.push(Borrowing::new("B001", "M001", at(9, 9, 0)));
        assert_eq!(member.active_borrowings().len(), 1);
        assert!(member.can_borrow_books(now, &policy));

        member.borrowings.push(Borrowing::new("B002", "M001", at(9, 9, 0)));
        assert!(!member.can_borrow_books(now, &policy));
    }

    #[test]
    fn test_penalty_window() {
        let policy = LendingPolicy::default();
        let mut member = Member::new("M001", "Test Member");
        assert_eq!(member.penalty_end_date(&policy), None);
        assert_eq!(member.is_penalized(at(1, 0, 0), &policy), None);

        let late = returned("M001", at(1, 9, 0), 8);
        let end = late.return_date.unwrap() + Duration::days(3);
        member.borrowings.push(late);

        assert_eq!(member.penalty_end_date(&policy), Some(end));
        assert_eq!(
            member.is_penalized(end - Duration::seconds(1), &policy),
            Some(true)
        );
        assert_eq!(member.is_penalized(end, &policy), Some(false));
        assert!(!member.can_borrow_books(end - Duration::seconds(1), &policy));
        assert!(member.can_borrow_books(end, &policy));
    }

    #[test]
    fn test_penalty_uses_most_recent_late_return() {
        let policy = LendingPolicy::default();
        let mut member = Member::new("M001", "Test Member");
        let recent = returned("M001", at(5, 9, 0), 10);
        let older = returned("M001", at(1, 9, 0), 9);
        let recent_end = recent.return_date.unwrap() + Duration::days(3);
        member.borrowings.push(recent);
        member.borrowings.push(older);
        // on-time returns never open a window
        member.borrowings.push(returned("M001", at(20, 9, 0), 1));

        assert_eq!(member.penalty_end_date(&policy), Some(recent_end));
    }

    #[test]
    fn test_borrowing_id_parse() {
        let id = BorrowingId::new();
        assert_eq!(id.to_string().parse::<BorrowingId>().unwrap(), id);
        assert!("not-a-uuid".parse::<BorrowingId>().is_err());
    }
}
