//! Read-side helpers for presenting the collection: search, sort and summary stats.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;

use serde::Serialize;

use super::models::Book;

/// Books whose title, author or genre contains `query`, ignoring case.
///
/// An empty query matches everything. Whitespace is matched literally.
pub fn filter_books<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    let needle = query.to_lowercase();
    books
        .iter()
        .filter(|book| {
            needle.is_empty()
                || book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
                || book.genre.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Title,
    Author,
    Year,
    Pages,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(SortKey::Title),
            "author" => Ok(SortKey::Author),
            "year" => Ok(SortKey::Year),
            "pages" => Ok(SortKey::Pages),
            other => Err(format!(
                "unknown sort key '{}'; expected title/author/year/pages",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort; text keys compare case-insensitively.
pub fn sort_books(books: &mut [&Book], key: SortKey, order: SortOrder) {
    books.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Title => compare_text(&a.title, &b.title),
            SortKey::Author => compare_text(&a.author, &b.author),
            SortKey::Year => a.publication_year.cmp(&b.publication_year),
            SortKey::Pages => a.pages.cmp(&b.pages),
        };
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Summary figures for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total: usize,
    pub unique_authors: usize,
    /// Books published within the recent window
    pub recent: usize,
    pub total_pages: u64,
}

impl CollectionStats {
    pub fn compute(books: &[Book], current_year: i32, recent_window_years: i32) -> Self {
        let threshold = current_year - recent_window_years;
        Self {
            total: books.len(),
            unique_authors: books
                .iter()
                .map(|b| b.author.as_str())
                .collect::<HashSet<_>>()
                .len(),
            recent: books
                .iter()
                .filter(|b| b.publication_year >= threshold)
                .count(),
            total_pages: books.iter().map(|b| u64::from(b.pages)).sum(),
        }
    }
}
