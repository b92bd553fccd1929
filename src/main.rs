use clap::Parser;
use library_lending::core::Clock;
use library_lending::utils::{logger, validation::Validate};
use library_lending::{
    BookUpdate, BookView, BorrowingId, BorrowingView, CliConfig, Command, ErrorKind,
    InMemoryLibrary, LendingError, Library, LibraryConfig, LocalStorage, ManualClock,
    MemberUpdate, NewBook, NewMember, SnapshotStore, SystemClock,
};
use serde::Serialize;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let mut config = match LibraryConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    logger::init_logger(cli.verbose, config.logging.format);
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli, &config).await {
        tracing::debug!(kind = ?e.kind(), "Command failed: {}", e);
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: &CliConfig, config: &LibraryConfig) -> library_lending::Result<()> {
    config.validate()?;

    let storage = LocalStorage::new(config.storage.data_dir.clone());
    // held across load, execute and save so concurrent invocations serialize
    let _lock = storage
        .lock_exclusive(&format!("{}.lock", config.storage.snapshot_file))
        .await?;

    let snapshots = SnapshotStore::new(storage, config.storage.snapshot_file.clone());
    let (store, fresh) = match snapshots.load().await? {
        Some(snapshot) => (Arc::new(InMemoryLibrary::from_snapshot(snapshot)?), false),
        None => (Arc::new(InMemoryLibrary::new()), true),
    };

    let clock: Arc<dyn Clock> = match cli.at {
        Some(at) => Arc::new(ManualClock::new(at)),
        None => Arc::new(SystemClock::new()),
    };
    let library = Library::from_store(store.clone(), clock, config.policy);

    if fresh {
        tracing::info!("No snapshot found, seeding catalog");
        library.catalog.seed(&config.seed).await?;
    }

    let mutated = execute(&library, &cli.command).await?;

    if mutated || fresh {
        snapshots.save(&store.snapshot().await).await?;
    }
    Ok(())
}

/// Runs one command and prints its result. Returns whether state changed.
async fn execute(library: &Library, command: &Command) -> library_lending::Result<bool> {
    match command {
        Command::Books => {
            let books = library.catalog.find_all_books().await?;
            print_json(&books.iter().map(BookView::from).collect::<Vec<_>>())?;
            Ok(false)
        }
        Command::Book { code } => {
            let book = library.catalog.find_book_by_code(code).await?;
            print_json(&BookView::from(&book))?;
            Ok(false)
        }
        Command::AddBook {
            code,
            title,
            author,
            stock,
        } => {
            let book = library
                .catalog
                .create_book(NewBook {
                    code: code.clone(),
                    title: title.clone(),
                    author: author.clone(),
                    stock: *stock,
                })
                .await?;
            print_json(&BookView::from(&book))?;
            Ok(true)
        }
        Command::UpdateBook {
            code,
            title,
            author,
            stock,
        } => {
            let update = BookUpdate {
                title: title.clone(),
                author: author.clone(),
                stock: *stock,
            };
            let book = library.catalog.update_book(code, update).await?;
            print_json(&BookView::from(&book))?;
            Ok(true)
        }
        Command::Members => {
            let members = library.catalog.find_all_members().await?;
            print_json(
                &members
                    .iter()
                    .map(|m| library.member_view(m))
                    .collect::<Vec<_>>(),
            )?;
            Ok(false)
        }
        Command::Member { code } => {
            let member = library.catalog.find_member_by_code(code).await?;
            print_json(&library.member_view(&member))?;
            Ok(false)
        }
        Command::AddMember { code, name } => {
            let member = library
                .catalog
                .create_member(NewMember {
                    code: code.clone(),
                    name: name.clone(),
                })
                .await?;
            print_json(&library.member_view(&member))?;
            Ok(true)
        }
        Command::UpdateMember { code, name } => {
            let member = library
                .catalog
                .update_member(code, MemberUpdate { name: name.clone() })
                .await?;
            print_json(&library.member_view(&member))?;
            Ok(true)
        }
        Command::Borrowings => {
            let borrowings = library.lending.find_all_borrowings().await?;
            print_json(&borrowings.iter().map(BorrowingView::from).collect::<Vec<_>>())?;
            Ok(false)
        }
        Command::Borrowing { id } => {
            let id: BorrowingId = id.parse()?;
            let borrowing = library.lending.find_borrowing_by_id(&id).await?;
            print_json(&BorrowingView::from(&borrowing))?;
            Ok(false)
        }
        Command::Borrow { book, member } => {
            let borrowing = library.lending.borrow_book(book, member).await?;
            print_json(&BorrowingView::from(&borrowing))?;
            Ok(true)
        }
        Command::Return { id } => {
            let id: BorrowingId = id.parse()?;
            let borrowing = library.lending.return_book(&id).await?;
            print_json(&BorrowingView::from(&borrowing))?;
            Ok(true)
        }
        Command::Active { member, book } => {
            let borrowings = match (member, book) {
                (Some(member), _) => library.lending.get_active_borrowings_by_member(member).await?,
                (None, Some(book)) => library.lending.get_active_borrowings_by_book(book).await?,
                (None, None) => {
                    return Err(LendingError::validation(
                        "active",
                        "either --member or --book is required",
                    ))
                }
            };
            print_json(&borrowings.iter().map(BorrowingView::from).collect::<Vec<_>>())?;
            Ok(false)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> library_lending::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(error: &LendingError) -> i32 {
    match error.kind() {
        ErrorKind::Invalid => 1,
        ErrorKind::Policy => 2,
        ErrorKind::State | ErrorKind::Infrastructure => 3,
        ErrorKind::NotFound => 4,
    }
}
