use crate::domain::model::{Book, Borrowing, BorrowingId, Member};
use crate::domain::ports::{BookRepository, BorrowingRepository, MemberRepository};
use crate::utils::error::{LendingError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Flat, serializable form of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub books: Vec<Book>,
    pub members: Vec<Member>,
    pub borrowings: Vec<Borrowing>,
}

/// Records live in insertion-ordered vectors; everything else is an index
/// of positions into them. Books and members hold no borrowings here.
#[derive(Debug, Default)]
struct Arena {
    books: Vec<Book>,
    book_index: HashMap<String, usize>,
    members: Vec<Member>,
    member_index: HashMap<String, usize>,
    borrowings: Vec<Borrowing>,
    borrowing_index: HashMap<BorrowingId, usize>,
    by_book: HashMap<String, Vec<usize>>,
    by_member: HashMap<String, Vec<usize>>,
}

impl Arena {
    fn upsert_book(&mut self, mut book: Book) {
        book.borrowings.clear();
        match self.book_index.get(&book.code) {
            Some(&pos) => self.books[pos] = book,
            None => {
                self.book_index.insert(book.code.clone(), self.books.len());
                self.books.push(book);
            }
        }
    }

    fn upsert_member(&mut self, mut member: Member) {
        member.borrowings.clear();
        match self.member_index.get(&member.code) {
            Some(&pos) => self.members[pos] = member,
            None => {
                self.member_index
                    .insert(member.code.clone(), self.members.len());
                self.members.push(member);
            }
        }
    }

    fn insert_borrowing(&mut self, borrowing: Borrowing) -> Result<()> {
        if self.borrowing_index.contains_key(&borrowing.id) {
            return Err(LendingError::state(format!(
                "borrowing {} is already recorded",
                borrowing.id
            )));
        }
        check_return_after_borrow(&borrowing)?;
        if !self.book_index.contains_key(&borrowing.book_code) {
            return Err(LendingError::not_found(
                "Book",
                format!("code {}", borrowing.book_code),
            ));
        }
        if !self.member_index.contains_key(&borrowing.member_code) {
            return Err(LendingError::not_found(
                "Member",
                format!("code {}", borrowing.member_code),
            ));
        }

        let pos = self.borrowings.len();
        self.borrowing_index.insert(borrowing.id, pos);
        self.by_book
            .entry(borrowing.book_code.clone())
            .or_default()
            .push(pos);
        self.by_member
            .entry(borrowing.member_code.clone())
            .or_default()
            .push(pos);
        self.borrowings.push(borrowing);
        Ok(())
    }

    fn resolve(&self, positions: Option<&Vec<usize>>) -> Vec<Borrowing> {
        positions
            .map(|ps| {
                ps.iter()
                    .filter_map(|&p| self.borrowings.get(p))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn hydrate_book(&self, book: &Book) -> Book {
        let mut book = book.clone();
        book.borrowings = self.resolve(self.by_book.get(&book.code));
        book
    }

    fn hydrate_member(&self, member: &Member) -> Member {
        let mut member = member.clone();
        member.borrowings = self.resolve(self.by_member.get(&member.code));
        member
    }

    fn book(&self, code: &str) -> Option<Book> {
        self.book_index
            .get(code)
            .and_then(|&p| self.books.get(p))
            .map(|b| self.hydrate_book(b))
    }

    fn member(&self, code: &str) -> Option<Member> {
        self.member_index
            .get(code)
            .and_then(|&p| self.members.get(p))
            .map(|m| self.hydrate_member(m))
    }

    fn active(&self, positions: Option<&Vec<usize>>) -> Vec<Borrowing> {
        self.resolve(positions)
            .into_iter()
            .filter(|b| !b.is_returned())
            .collect()
    }
}

fn check_return_after_borrow(borrowing: &Borrowing) -> Result<()> {
    match borrowing.return_date {
        Some(returned) if returned < borrowing.borrow_date => Err(LendingError::state(format!(
            "borrowing {} cannot be returned before it was borrowed",
            borrowing.id
        ))),
        _ => Ok(()),
    }
}

/// In-process store implementing all three repository ports.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    arena: RwLock<Arena>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LibrarySnapshot) -> Result<Self> {
        let mut arena = Arena::default();
        for book in snapshot.books {
            if arena.book_index.contains_key(&book.code) {
                return Err(LendingError::state(format!(
                    "book {} appears twice in snapshot",
                    book.code
                )));
            }
            arena.upsert_book(book);
        }
        for member in snapshot.members {
            if arena.member_index.contains_key(&member.code) {
                return Err(LendingError::state(format!(
                    "member {} appears twice in snapshot",
                    member.code
                )));
            }
            arena.upsert_member(member);
        }
        for borrowing in snapshot.borrowings {
            arena.insert_borrowing(borrowing)?;
        }
        Ok(Self {
            arena: RwLock::new(arena),
        })
    }

    pub async fn snapshot(&self) -> LibrarySnapshot {
        let arena = self.arena.read().await;
        LibrarySnapshot {
            books: arena.books.clone(),
            members: arena.members.clone(),
            borrowings: arena.borrowings.clone(),
        }
    }
}

#[async_trait]
impl BookRepository for InMemoryLibrary {
    async fn find_all(&self) -> Result<Vec<Book>> {
        let arena = self.arena.read().await;
        Ok(arena.books.iter().map(|b| arena.hydrate_book(b)).collect())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Book>> {
        Ok(self.arena.read().await.book(code))
    }

    async fn save(&self, book: Book) -> Result<Book> {
        let mut arena = self.arena.write().await;
        let code = book.code.clone();
        arena.upsert_book(book);
        arena
            .book(&code)
            .ok_or_else(|| LendingError::state(format!("book {code} vanished after save")))
    }

    async fn update(&self, book: Book) -> Result<Book> {
        let mut arena = self.arena.write().await;
        if !arena.book_index.contains_key(&book.code) {
            return Err(LendingError::not_found("Book", format!("code {}", book.code)));
        }
        let code = book.code.clone();
        arena.upsert_book(book);
        arena
            .book(&code)
            .ok_or_else(|| LendingError::state(format!("book {code} vanished after update")))
    }
}

#[async_trait]
impl MemberRepository for InMemoryLibrary {
    async fn find_all(&self) -> Result<Vec<Member>> {
        let arena = self.arena.read().await;
        Ok(arena
            .members
            .iter()
            .map(|m| arena.hydrate_member(m))
            .collect())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Member>> {
        Ok(self.arena.read().await.member(code))
    }

    async fn save(&self, member: Member) -> Result<Member> {
        let mut arena = self.arena.write().await;
        let code = member.code.clone();
        arena.upsert_member(member);
        arena
            .member(&code)
            .ok_or_else(|| LendingError::state(format!("member {code} vanished after save")))
    }

    async fn update(&self, member: Member) -> Result<Member> {
        let mut arena = self.arena.write().await;
        if !arena.member_index.contains_key(&member.code) {
            return Err(LendingError::not_found(
                "Member",
                format!("code {}", member.code),
            ));
        }
        let code = member.code.clone();
        arena.upsert_member(member);
        arena
            .member(&code)
            .ok_or_else(|| LendingError::state(format!("member {code} vanished after update")))
    }
}

#[async_trait]
impl BorrowingRepository for InMemoryLibrary {
    async fn find_all(&self) -> Result<Vec<Borrowing>> {
        Ok(self.arena.read().await.borrowings.clone())
    }

    async fn find_by_id(&self, id: &BorrowingId) -> Result<Option<Borrowing>> {
        let arena = self.arena.read().await;
        Ok(arena
            .borrowing_index
            .get(id)
            .and_then(|&p| arena.borrowings.get(p))
            .cloned())
    }

    async fn find_active_by_member(&self, member_code: &str) -> Result<Vec<Borrowing>> {
        let arena = self.arena.read().await;
        Ok(arena.active(arena.by_member.get(member_code)))
    }

    async fn find_active_by_book(&self, book_code: &str) -> Result<Vec<Borrowing>> {
        let arena = self.arena.read().await;
        Ok(arena.active(arena.by_book.get(book_code)))
    }

    async fn save(&self, borrowing: Borrowing) -> Result<Borrowing> {
        let mut arena = self.arena.write().await;
        arena.insert_borrowing(borrowing.clone())?;
        Ok(borrowing)
    }

    /// Only the return date may change; identity and links are fixed.
    async fn update(&self, borrowing: Borrowing) -> Result<Borrowing> {
        let mut arena = self.arena.write().await;
        let pos = *arena
            .borrowing_index
            .get(&borrowing.id)
            .ok_or_else(|| LendingError::not_found("Borrowing", format!("ID {}", borrowing.id)))?;
        let stored = arena
            .borrowings
            .get_mut(pos)
            .ok_or_else(|| LendingError::state(format!("borrowing {} lost", borrowing.id)))?;

        if stored.book_code != borrowing.book_code
            || stored.member_code != borrowing.member_code
            || stored.borrow_date != borrowing.borrow_date
        {
            return Err(LendingError::state(format!(
                "borrowing {} cannot change its book, member or borrow date",
                borrowing.id
            )));
        }
        if stored.return_date.is_some() && stored.return_date != borrowing.return_date {
            return Err(LendingError::state(format!(
                "borrowing {} return date is immutable",
                borrowing.id
            )));
        }

        check_return_after_borrow(&borrowing)?;

        stored.return_date = borrowing.return_date;
        Ok(stored.clone())
    }
}
