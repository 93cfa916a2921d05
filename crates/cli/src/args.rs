use std::path::PathBuf;

use bookshelf_app::books::view::SortKey;
use clap::{Args, Parser, Subcommand};

/// Bookshelf CLI - manage your book catalog from the terminal
#[derive(Parser, Debug)]
#[command(name = "bookshelf-cli")]
#[command(version)]
#[command(about = "Manage a personal book catalog", long_about = None)]
pub struct Cli {
    /// Backend base URL (e.g., http://127.0.0.1:8080/api)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Cookie jar holding the session token
    #[arg(long = "cookie-file", global = true)]
    pub cookie_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session token
    Login(AccountArgs),
    /// Create an account
    Signup(AccountArgs),
    /// Forget the session token
    Logout,
    /// Show whether a session is active
    Status,
    /// List books
    List {
        /// Only books whose title, author or genre contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// title, author, year or pages
        #[arg(long, default_value = "title")]
        sort: SortKey,
        #[arg(long)]
        desc: bool,
    },
    /// Show one book
    Show { id: String },
    /// Add a book
    Add(NewBookArgs),
    /// Change fields of a book
    Edit {
        id: String,
        #[command(flatten)]
        fields: PatchArgs,
    },
    /// Remove a book
    Delete { id: String },
    /// Collection summary
    Stats,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login(_) => "login",
            Command::Signup(_) => "signup",
            Command::Logout => "logout",
            Command::Status => "status",
            Command::List { .. } => "list",
            Command::Show { .. } => "show",
            Command::Add(_) => "add",
            Command::Edit { .. } => "edit",
            Command::Delete { .. } => "delete",
            Command::Stats => "stats",
        }
    }
}

#[derive(Args, Debug)]
pub struct AccountArgs {
    #[arg(short, long)]
    pub username: String,
    #[arg(short, long)]
    pub password: String,
    #[arg(short, long)]
    pub email: String,
}

#[derive(Args, Debug)]
pub struct NewBookArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub author: String,
    #[arg(long)]
    pub isbn: String,
    #[arg(long, allow_hyphen_values = true)]
    pub year: i32,
    #[arg(long)]
    pub genre: String,
    #[arg(long)]
    pub pages: u32,
}

#[derive(Args, Debug)]
pub struct PatchArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub isbn: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub year: Option<i32>,
    #[arg(long)]
    pub genre: Option<String>,
    #[arg(long)]
    pub pages: Option<u32>,
}
