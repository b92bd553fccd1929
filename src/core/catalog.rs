use crate::config::toml_config::SeedConfig;
use crate::core::locks::KeyedLocks;
use crate::domain::model::{Book, Member};
use crate::domain::ports::{BookRepository, MemberRepository};
use crate::utils::error::{LendingError, PolicyViolation, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NewBook {
    pub code: String,
    pub title: String,
    pub author: String,
    pub stock: u32,
}

impl Validate for NewBook {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("code", &self.code)?;
        validate_non_empty_string("title", &self.title)?;
        validate_non_empty_string("author", &self.author)
    }
}

/// Partial book edit; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub stock: Option<u32>,
}

impl Validate for BookUpdate {
    fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_non_empty_string("title", title)?;
        }
        if let Some(author) = &self.author {
            validate_non_empty_string("author", author)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub code: String,
    pub name: String,
}

impl Validate for NewMember {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("code", &self.code)?;
        validate_non_empty_string("name", &self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    pub name: Option<String>,
}

impl Validate for MemberUpdate {
    fn validate(&self) -> Result<()> {
        match &self.name {
            Some(name) => validate_non_empty_string("name", name),
            None => Ok(()),
        }
    }
}

/// Book and member management around the lending rules.
pub struct CatalogService {
    books: Arc<dyn BookRepository>,
    members: Arc<dyn MemberRepository>,
    locks: Arc<KeyedLocks>,
}

impl CatalogService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        members: Arc<dyn MemberRepository>,
        locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            books,
            members,
            locks,
        }
    }

    pub async fn find_all_books(&self) -> Result<Vec<Book>> {
        self.books.find_all().await
    }

    pub async fn find_book_by_code(&self, code: &str) -> Result<Book> {
        tracing::debug!(book_code = code, "Looking up book");
        self.books
            .find_by_code(code)
            .await?
            .ok_or_else(|| LendingError::not_found("Book", format!("code {code}")))
    }

    pub async fn create_book(&self, new_book: NewBook) -> Result<Book> {
        new_book.validate()?;
        let _guard = self.locks.book(&new_book.code).await;

        if self.books.find_by_code(&new_book.code).await?.is_some() {
            return Err(LendingError::validation(
                "code",
                format!("Book with code {} already exists", new_book.code),
            ));
        }

        let book = self
            .books
            .save(Book::new(
                new_book.code,
                new_book.title,
                new_book.author,
                new_book.stock,
            ))
            .await?;
        tracing::info!(book_code = %book.code, stock = book.stock, "Book added");
        Ok(book)
    }

    /// Stock may not drop below the number of copies currently out.
    pub async fn update_book(&self, code: &str, update: BookUpdate) -> Result<Book> {
        update.validate()?;
        let _guard = self.locks.book(code).await;

        let mut book = self.find_book_by_code(code).await?;
        if let Some(title) = update.title {
            book.title = title;
        }
        if let Some(author) = update.author {
            book.author = author;
        }
        if let Some(stock) = update.stock {
            let active = book.active_borrowing_count();
            if (stock as usize) < active {
                return Err(PolicyViolation::StockBelowActiveBorrowings {
                    code: book.code.clone(),
                    stock,
                    active,
                }
                .into());
            }
            book.stock = stock;
        }

        let book = self.books.update(book).await?;
        tracing::info!(book_code = %book.code, stock = book.stock, "Book updated");
        Ok(book)
    }

    pub async fn find_all_members(&self) -> Result<Vec<Member>> {
        self.members.find_all().await
    }

    pub async fn find_member_by_code(&self, code: &str) -> Result<Member> {
        tracing::debug!(member_code = code, "Looking up member");
        self.members
            .find_by_code(code)
            .await?
            .ok_or_else(|| LendingError::not_found("Member", format!("code {code}")))
    }

    pub async fn create_member(&self, new_member: NewMember) -> Result<Member> {
        new_member.validate()?;
        let _guard = self.locks.member(&new_member.code).await;

        if self.members.find_by_code(&new_member.code).await?.is_some() {
            return Err(LendingError::validation(
                "code",
                format!("Member with code {} already exists", new_member.code),
            ));
        }

        let member = self
            .members
            .save(Member::new(new_member.code, new_member.name))
            .await?;
        tracing::info!(member_code = %member.code, "Member registered");
        Ok(member)
    }

    pub async fn update_member(&self, code: &str, update: MemberUpdate) -> Result<Member> {
        update.validate()?;
        let _guard = self.locks.member(code).await;

        let mut member = self.find_member_by_code(code).await?;
        if let Some(name) = update.name {
            member.name = name;
        }
        self.members.update(member).await
    }

    /// Fill empty collections from the seed; non-empty ones are left alone.
    pub async fn seed(&self, seed: &SeedConfig) -> Result<()> {
        if self.books.find_all().await?.is_empty() {
            for book in &seed.books {
                self.create_book(NewBook {
                    code: book.code.clone(),
                    title: book.title.clone(),
                    author: book.author.clone(),
                    stock: book.stock,
                })
                .await?;
            }
            tracing::info!(count = seed.books.len(), "Seeded books");
        }

        if self.members.find_all().await?.is_empty() {
            for member in &seed.members {
                self.create_member(NewMember {
                    code: member.code.clone(),
                    name: member.name.clone(),
                })
                .await?;
            }
            tracing::info!(count = seed.members.len(), "Seeded members");
        }

        Ok(())
    }
}
