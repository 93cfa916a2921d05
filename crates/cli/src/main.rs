mod args;

use std::sync::Arc;

use anyhow::{bail, Context};
use bookshelf_app::books::models::{Book, BookId, BookPatch, NewBook};
use bookshelf_app::books::view::{filter_books, sort_books, CollectionStats, SortOrder};
use bookshelf_app::session::AccountCredentials;
use bookshelf_app::utils::{current_year, truncate};
use bookshelf_app::App;
use bookshelf_authz::FileCookieJar;
use bookshelf_kernel::settings::Settings;
use clap::Parser;

use args::{AccountArgs, Cli, Command, NewBookArgs, PatchArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings =
        Settings::load().with_context(|| "failed to load bookshelf settings")?;
    if let Some(url) = cli.api_url {
        settings.api.base_url = url;
    }
    if let Some(path) = cli.cookie_file {
        settings.session.cookie_file = Some(path);
    }
    bookshelf_telemetry::init(&settings.telemetry)?;

    let jar = Arc::new(FileCookieJar::new(settings.session.cookie_path()));
    let app = App::bootstrap(settings, jar).await?;

    let outcome = run(&app, cli.command).await;
    for notification in app.notifications().notifications() {
        println!("{}", notification.message);
    }
    outcome
}

async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    tracing::debug!(
        command = command.name(),
        authenticated = app.is_authenticated(),
        "dispatching command"
    );
    match command {
        Command::Login(account) => {
            app.login(&credentials(account)).await?;
            println!("Signed in.");
        }
        Command::Signup(account) => {
            let reply = app.signup(&credentials(account)).await?;
            match reply {
                serde_json::Value::String(text) => println!("{}", text),
                other => println!("{}", serde_json::to_string_pretty(&other)?),
            }
        }
        Command::Logout => {
            app.logout().await?;
            println!("Signed out.");
        }
        Command::Status => {
            if app.is_authenticated() {
                println!("Signed in against {}", app.settings().api.base_url);
            } else {
                println!("Not signed in.");
            }
        }
        Command::List { search, sort, desc } => {
            let books = collection(app)?;
            let mut shelf = filter_books(&books, search.as_deref().unwrap_or_default());
            let order = if desc {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            sort_books(&mut shelf, sort, order);
            if shelf.is_empty() {
                println!("No books found.");
            }
            for book in shelf {
                print_row(book);
            }
        }
        Command::Show { id } => {
            require_session(app)?;
            let book = app.catalog().get(&resolve_id(app, &id)).await?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }
        Command::Add(fields) => {
            require_session(app)?;
            let created = app.catalog().create(&new_book(fields)).await?;
            print_row(&created);
        }
        Command::Edit { id, fields } => {
            require_session(app)?;
            let patch = patch(fields);
            if patch.is_empty() {
                bail!("nothing to change; pass at least one field");
            }
            let updated = app.catalog().update(&resolve_id(app, &id), &patch).await?;
            print_row(&updated);
        }
        Command::Delete { id } => {
            require_session(app)?;
            app.catalog().delete(&resolve_id(app, &id)).await?;
        }
        Command::Stats => {
            let books = collection(app)?;
            let stats = CollectionStats::compute(
                &books,
                current_year(),
                app.settings().catalog.recent_window_years,
            );
            println!("Total books:    {}", stats.total);
            println!("Unique authors: {}", stats.unique_authors);
            println!("Recent books:   {}", stats.recent);
            println!("Total pages:    {}", stats.total_pages);
        }
    }
    Ok(())
}

fn require_session(app: &App) -> anyhow::Result<()> {
    if !app.is_authenticated() {
        bail!("not signed in; run `bookshelf-cli login` first");
    }
    Ok(())
}

/// The collection fetched at boot.
fn collection(app: &App) -> anyhow::Result<Arc<Vec<Book>>> {
    require_session(app)?;
    app.catalog()
        .books()
        .with_context(|| "book collection is unavailable")
}

/// Match `raw` against cached ids first so string and numeric ids both resolve.
fn resolve_id(app: &App, raw: &str) -> BookId {
    let cached = app
        .catalog()
        .books()
        .and_then(|books| books.iter().find(|b| b.id.to_string() == raw).map(|b| b.id.clone()));
    cached.unwrap_or_else(|| match raw.parse::<i64>() {
        Ok(n) => BookId::Number(n),
        Err(_) => BookId::from(raw),
    })
}

fn print_row(book: &Book) {
    println!(
        "{:>6}  {:<32}  {:<20}  {:>5}  {:<12}  {:>5}",
        book.id.to_string(),
        truncate(&book.title, 32),
        truncate(&book.author, 20),
        book.publication_year,
        truncate(&book.genre, 12),
        book.pages
    );
}

fn credentials(args: AccountArgs) -> AccountCredentials {
    AccountCredentials::new(args.username, args.password, args.email)
}

fn new_book(args: NewBookArgs) -> NewBook {
    NewBook {
        title: args.title,
        author: args.author,
        isbn: args.isbn,
        publication_year: args.year,
        genre: args.genre,
        pages: args.pages,
    }
}

fn patch(args: PatchArgs) -> BookPatch {
    BookPatch {
        title: args.title,
        author: args.author,
        isbn: args.isbn,
        publication_year: args.year,
        genre: args.genre,
        pages: args.pages,
    }
}
