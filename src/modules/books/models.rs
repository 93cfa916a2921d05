use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldError};

/// Backend-assigned book identifier; the backend may use numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookId {
    Number(i64),
    Text(String),
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookId::Number(n) => write!(f, "{}", n),
            BookId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for BookId {
    fn from(id: i64) -> Self {
        BookId::Number(id)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        BookId::Text(id.to_string())
    }
}

impl From<String> for BookId {
    fn from(id: String) -> Self {
        BookId::Text(id)
    }
}

/// A saved catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
    pub genre: String,
    pub pages: u32,
}

impl Book {
    /// The editable fields of this book.
    pub fn draft(&self) -> NewBook {
        NewBook {
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            publication_year: self.publication_year,
            genre: self.genre.clone(),
            pages: self.pages,
        }
    }
}

/// A book that has not been saved yet; the backend assigns its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
    pub genre: String,
    pub pages: u32,
}

impl NewBook {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        require("title", &self.title, &mut missing);
        require("author", &self.author, &mut missing);
        require("isbn", &self.isbn, &mut missing);
        require("genre", &self.genre, &mut missing);
        AppError::check_required(missing)
    }
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

impl BookPatch {
    /// Only the fields the patch carries are checked.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        let text_fields = [
            ("title", &self.title),
            ("author", &self.author),
            ("isbn", &self.isbn),
            ("genre", &self.genre),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value {
                require(field, value, &mut missing);
            }
        }
        AppError::check_required(missing)
    }

    pub fn is_empty(&self) -> bool {
        *self == BookPatch::default()
    }
}

fn require(field: &'static str, value: &str, missing: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        missing.push(FieldError::required(field));
    }
}
