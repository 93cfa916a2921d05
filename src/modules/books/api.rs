//! Typed calls against the `/books` resource.

use bookshelf_http::{ApiClient, Result};

use super::models::{Book, BookId, BookPatch, NewBook};

#[derive(Clone)]
pub struct BooksApi {
    client: ApiClient,
}

impl BooksApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Book>> {
        self.client.get_json("/books").await
    }

    pub async fn get(&self, id: &BookId) -> Result<Book> {
        self.client.get_json(&format!("/books/{}", id)).await
    }

    pub async fn create(&self, book: &NewBook) -> Result<Book> {
        self.client.post_json("/books", book).await
    }

    pub async fn update(&self, id: &BookId, patch: &BookPatch) -> Result<Book> {
        self.client.put_json(&format!("/books/{}", id), patch).await
    }

    pub async fn delete(&self, id: &BookId) -> Result<()> {
        self.client.delete(&format!("/books/{}", id)).await
    }
}
