pub mod catalog;
pub mod lending;
pub mod library;
pub mod locks;
pub mod views;

pub use crate::domain::model::{Book, Borrowing, BorrowingId, Member};
pub use crate::domain::policy::LendingPolicy;
pub use crate::domain::ports::{BookRepository, BorrowingRepository, Clock, MemberRepository, Storage};
pub use crate::utils::error::Result;
