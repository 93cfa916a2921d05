use std::sync::Arc;

use anyhow::Context;
use bookshelf_app::books::view::{filter_books, sort_books, CollectionStats, SortKey, SortOrder};
use bookshelf_app::utils::{current_year, truncate};
use bookshelf_app::App;
use bookshelf_authz::{FileCookieJar, Route};
use bookshelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    let jar = Arc::new(FileCookieJar::new(settings.session.cookie_path()));
    let app = App::bootstrap(settings, jar).await?;

    if app.route(Route::Dashboard) != Route::Dashboard {
        println!("Not signed in. Run `bookshelf-cli login` first.");
        return Ok(());
    }

    let books = app.catalog().books().unwrap_or_default();
    let stats = CollectionStats::compute(
        &books,
        current_year(),
        app.settings().catalog.recent_window_years,
    );

    println!("My Library");
    println!(
        "  {} books | {} authors | {} recent | {} pages",
        stats.total, stats.unique_authors, stats.recent, stats.total_pages
    );
    println!();

    let mut shelf = filter_books(&books, "");
    sort_books(&mut shelf, SortKey::Title, SortOrder::Ascending);
    for book in shelf {
        println!(
            "  {:>6}  {:<32}  {:<20}  {:>5}",
            book.id.to_string(),
            truncate(&book.title, 32),
            truncate(&book.author, 20),
            book.publication_year
        );
    }

    Ok(())
}
