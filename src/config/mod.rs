pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use chrono::{DateTime, Utc};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "lending")]
#[command(about = "Library lending record keeper")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "lending.toml")]
    pub config: String,

    /// Override storage.data_dir from config
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Evaluate the command as if it ran at this RFC 3339 instant
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List all books with their available stock
    Books,
    /// Show one book
    Book { code: String },
    /// Add a book to the catalog
    AddBook {
        #[arg(long)]
        code: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long, default_value = "1")]
        stock: u32,
    },
    /// Change title, author or stock of a book
    UpdateBook {
        code: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        stock: Option<u32>,
    },
    /// List all members
    Members,
    /// Show one member
    Member { code: String },
    /// Register a member
    AddMember {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
    },
    /// Rename a member
    UpdateMember {
        code: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// List all borrowings
    Borrowings,
    /// Show one borrowing
    Borrowing { id: String },
    /// Borrow a book for a member
    Borrow {
        #[arg(long)]
        book: String,
        #[arg(long)]
        member: String,
    },
    /// Return a borrowed book
    Return { id: String },
    /// List active borrowings of a member or of a book
    Active {
        #[arg(long, conflicts_with = "book", required_unless_present = "book")]
        member: Option<String>,
        #[arg(long)]
        book: Option<String>,
    },
}
