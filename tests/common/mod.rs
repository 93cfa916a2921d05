#![allow(dead_code)]

//! In-process fake of the bookshelf backend.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bookshelf_app::books::models::{Book, BookId, BookPatch, NewBook};
use bookshelf_app::session::AccountCredentials;
use bookshelf_app::App;
use bookshelf_authz::MemoryCookieJar;
use bookshelf_kernel::settings::Settings;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Notify;

pub const TOKEN: &str = "token-123";
pub const USERNAME: &str = "reader";
pub const PASSWORD: &str = "secret";

/// Parks the next matching request until released.
#[derive(Clone, Default)]
pub struct Gate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Gate {
    async fn pass(&self) {
        self.started.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
struct BackendState {
    books: Mutex<Vec<Book>>,
    next_id: AtomicI64,
    fail_next_delete: AtomicBool,
    fail_next_create: AtomicBool,
    fail_lists: AtomicBool,
    list_calls: AtomicUsize,
    requests: Mutex<Vec<String>>,
    list_gate: Mutex<Option<Gate>>,
    delete_gate: Mutex<Option<Gate>>,
}

impl BackendState {
    fn record(&self, line: String) {
        self.requests.lock().unwrap().push(line);
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let expected = format!("Bearer {}", TOKEN);
        let presented = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        if presented == Some(expected.as_str()) {
            Ok(())
        } else {
            Err(error(StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

type Shared = Arc<BackendState>;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

pub struct Backend {
    addr: SocketAddr,
    state: Shared,
}

impl Backend {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(BackendState {
            next_id: AtomicI64::new(42),
            ..BackendState::default()
        });

        let router = Router::new()
            .route("/api/auth/signin", post(signin))
            .route("/api/auth/signup", post(signup))
            .route("/api/books", get(list_books).post(create_book))
            .route(
                "/api/books/{id}",
                get(get_book).put(update_book).delete(delete_book),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn seed(&self, books: Vec<Book>) {
        *self.state.books.lock().unwrap() = books;
    }

    pub fn books(&self) -> Vec<Book> {
        self.state.books.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn fail_next_delete(&self) {
        self.state.fail_next_delete.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_create(&self) {
        self.state.fail_next_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.state.fail_lists.store(fail, Ordering::SeqCst);
    }

    /// The next list request reads the collection, then waits for release.
    pub fn gate_next_list(&self) -> Gate {
        let gate = Gate::default();
        *self.state.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// The next delete request waits for release before touching the collection.
    pub fn gate_next_delete(&self) -> Gate {
        let gate = Gate::default();
        *self.state.delete_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.api.base_url = self.base_url();
        settings
    }

    /// A fresh client with an empty cookie jar.
    pub async fn app(&self) -> App {
        App::bootstrap(self.settings(), Arc::new(MemoryCookieJar::new()))
            .await
            .unwrap()
    }

    pub async fn signed_in_app(&self) -> App {
        let app = self.app().await;
        app.login(&account()).await.unwrap();
        app
    }
}

pub fn account() -> AccountCredentials {
    AccountCredentials::new(USERNAME, PASSWORD, "reader@example.com")
}

pub fn book(id: impl Into<BookId>, title: &str, author: &str, year: i32) -> Book {
    Book {
        id: id.into(),
        title: title.to_string(),
        author: author.to_string(),
        isbn: format!("isbn-{}", title.len()),
        publication_year: year,
        genre: "History".to_string(),
        pages: 200,
    }
}

/// `[A, B, C]` with numeric ids 1, 2 and 3.
pub fn abc() -> Vec<Book> {
    vec![
        book(1, "Anabasis", "Xenophon", -370),
        book(2, "Bibliotheca", "Diodorus", -30),
        book(3, "Commentarii", "Caesar", -50),
    ]
}

#[derive(Deserialize)]
struct SigninBody {
    username: String,
    password: String,
}

async fn signin(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<SigninBody>,
) -> Response {
    state.record("POST /auth/signin".to_string());
    if headers.contains_key("authorization") {
        return error(StatusCode::BAD_REQUEST, "Unexpected credentials");
    }
    match (body.username.as_str(), body.password.as_str()) {
        (USERNAME, PASSWORD) => TOKEN.into_response(),
        ("legacy", _) => "Authentication failed: invalid username or password".into_response(),
        ("blank", _) => "".into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "Bad credentials"),
    }
}

async fn signup(State(state): State<Shared>, Json(body): Json<SigninBody>) -> Response {
    state.record("POST /auth/signup".to_string());
    match body.username.as_str() {
        "taken" => "Error: Username is already taken".into_response(),
        "jsonly" => Json(json!({ "id": 7, "username": "jsonly" })).into_response(),
        _ => "User registered successfully".into_response(),
    }
}

async fn list_books(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.record("GET /books".to_string());
    state.list_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(rejected) = state.authorize(&headers) {
        return rejected;
    }

    let books = state.books.lock().unwrap().clone();
    let gate = state.list_gate.lock().unwrap().take();
    if let Some(gate) = gate {
        gate.pass().await;
    }

    if state.fail_lists.load(Ordering::SeqCst) {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Catalog unavailable");
    }
    Json(books).into_response()
}

async fn get_book(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.record(format!("GET /books/{}", id));
    if let Err(rejected) = state.authorize(&headers) {
        return rejected;
    }
    let books = state.books.lock().unwrap();
    match books.iter().find(|b| b.id.to_string() == id) {
        Some(book) => Json(book.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Book not found"),
    }
}

async fn create_book(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(draft): Json<NewBook>,
) -> Response {
    state.record("POST /books".to_string());
    if let Err(rejected) = state.authorize(&headers) {
        return rejected;
    }
    if state.fail_next_create.swap(false, Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Could not save book");
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let book = Book {
        id: BookId::Text(id.to_string()),
        title: draft.title,
        author: draft.author,
        isbn: draft.isbn,
        publication_year: draft.publication_year,
        genre: draft.genre,
        pages: draft.pages,
    };
    state.books.lock().unwrap().push(book.clone());
    (StatusCode::CREATED, Json(book)).into_response()
}

async fn update_book(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<BookPatch>,
) -> Response {
    state.record(format!("PUT /books/{}", id));
    if let Err(rejected) = state.authorize(&headers) {
        return rejected;
    }

    let mut books = state.books.lock().unwrap();
    let Some(book) = books.iter_mut().find(|b| b.id.to_string() == id) else {
        return error(StatusCode::NOT_FOUND, "Book not found");
    };
    if let Some(title) = patch.title {
        book.title = title;
    }
    if let Some(author) = patch.author {
        book.author = author;
    }
    if let Some(isbn) = patch.isbn {
        book.isbn = isbn;
    }
    if let Some(year) = patch.publication_year {
        book.publication_year = year;
    }
    if let Some(genre) = patch.genre {
        book.genre = genre;
    }
    if let Some(pages) = patch.pages {
        book.pages = pages;
    }
    Json(book.clone()).into_response()
}

async fn delete_book(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.record(format!("DELETE /books/{}", id));
    if let Err(rejected) = state.authorize(&headers) {
        return rejected;
    }

    let gate = state.delete_gate.lock().unwrap().take();
    if let Some(gate) = gate {
        gate.pass().await;
    }

    if state.fail_next_delete.swap(false, Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Could not delete book");
    }
    state
        .books
        .lock()
        .unwrap()
        .retain(|b| b.id.to_string() != id);
    StatusCode::NO_CONTENT.into_response()
}
