mod common;

use std::sync::Arc;

use bookshelf_app::books::models::BookId;
use bookshelf_app::session::AccountCredentials;
use bookshelf_app::{App, AppError};
use bookshelf_authz::{MemoryCookieJar, Route};
use common::{abc, account, Backend, TOKEN};
use serde_json::json;

fn auth_message(err: AppError) -> String {
    match err {
        AppError::Auth { message } => message,
        other => panic!("expected auth failure, got {other:?}"),
    }
}

#[tokio::test]
async fn login_stores_token_and_opens_dashboard() {
    let backend = Backend::spawn().await;
    let app = backend.app().await;
    assert_eq!(app.route(Route::Dashboard), Route::Login);

    app.login(&account()).await.unwrap();

    assert_eq!(app.credentials().get_token().as_deref(), Some(TOKEN));
    assert_eq!(app.route(Route::Dashboard), Route::Dashboard);
    assert_eq!(app.route(Route::Login), Route::Dashboard);
}

#[tokio::test]
async fn rejected_login_surfaces_backend_message() {
    let backend = Backend::spawn().await;
    let app = backend.app().await;

    let err = app
        .login(&AccountCredentials::new("reader", "wrong", "r@example.com"))
        .await
        .unwrap_err();

    assert_eq!(auth_message(err), "Bad credentials");
    assert!(!app.is_authenticated());
    assert_eq!(backend.list_calls(), 0);
}

#[tokio::test]
async fn success_status_with_failure_text_is_rejected() {
    let backend = Backend::spawn().await;
    let app = backend.app().await;

    let err = app
        .login(&AccountCredentials::new("legacy", "pw", "r@example.com"))
        .await
        .unwrap_err();

    assert!(auth_message(err).starts_with("Authentication failed"));
    assert!(app.credentials().get_token().is_none());
}

#[tokio::test]
async fn empty_token_is_rejected() {
    let backend = Backend::spawn().await;
    let app = backend.app().await;

    let err = app
        .login(&AccountCredentials::new("blank", "pw", "r@example.com"))
        .await
        .unwrap_err();

    assert_eq!(auth_message(err), "Login failed");
    assert!(!app.is_authenticated());
}

#[tokio::test]
async fn blank_email_blocks_auth_calls() {
    let backend = Backend::spawn().await;
    let app = backend.app().await;

    let err = app
        .login(&AccountCredentials::new("reader", "secret", ""))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = app
        .signup(&AccountCredentials::new("newcomer", "pw", ""))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert!(backend.requests().is_empty());
    assert!(!app.is_authenticated());
}

#[tokio::test]
async fn failed_login_keeps_existing_session() {
    let backend = Backend::spawn().await;
    let app = backend.signed_in_app().await;

    app.login(&AccountCredentials::new("reader", "wrong", "r@example.com"))
        .await
        .unwrap_err();

    assert_eq!(app.credentials().get_token().as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn unreachable_backend_is_not_an_auth_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut settings = bookshelf_kernel::settings::Settings::default();
    settings.api.base_url = format!("http://{}/api", addr);
    let app = App::bootstrap(settings, Arc::new(MemoryCookieJar::new()))
        .await
        .unwrap();

    let err = app.login(&account()).await.unwrap_err();
    match err {
        AppError::Api(api) => assert!(api.is_network()),
        other => panic!("expected network failure, got {other:?}"),
    }
}

#[tokio::test]
async fn signup_returns_backend_reply_without_signing_in() {
    let backend = Backend::spawn().await;
    let app = backend.app().await;

    let reply = app
        .signup(&AccountCredentials::new("newcomer", "pw", "n@example.com"))
        .await
        .unwrap();
    assert_eq!(reply, json!("User registered successfully"));

    let reply = app
        .signup(&AccountCredentials::new("jsonly", "pw", "r@example.com"))
        .await
        .unwrap();
    assert_eq!(reply["id"], 7);

    assert!(!app.is_authenticated());
}

#[tokio::test]
async fn rejected_signup_is_an_auth_failure() {
    let backend = Backend::spawn().await;
    let app = backend.app().await;

    let err = app
        .signup(&AccountCredentials::new("taken", "pw", "r@example.com"))
        .await
        .unwrap_err();

    assert_eq!(auth_message(err), "Error: Username is already taken");
}

#[tokio::test]
async fn logout_clears_cache_and_token() {
    let backend = Backend::spawn().await;
    backend.seed(abc());
    let app = backend.signed_in_app().await;
    assert!(app.catalog().books().is_some());

    app.logout().await.unwrap();

    assert!(!app.is_authenticated());
    assert!(app.catalog().books().is_none());
    assert!(app.catalog().cache().is_empty());
    assert_eq!(app.route(Route::Dashboard), Route::Login);

    let calls = backend.list_calls();
    assert_eq!(app.catalog().fetch().await.unwrap(), None);
    assert_eq!(backend.list_calls(), calls);
}

#[tokio::test]
async fn delete_failing_after_logout_leaves_cache_empty() {
    let backend = Backend::spawn().await;
    backend.seed(abc());
    let app = backend.signed_in_app().await;
    let catalog = app.catalog();

    backend.fail_next_delete();
    let gate = backend.gate_next_delete();
    let logout = async {
        gate.started.notified().await;
        app.logout().await.unwrap();
        assert!(catalog.books().is_none());
        gate.release.notify_one();
    };
    let (result, ()) = tokio::join!(catalog.delete(&BookId::Number(2)), logout);

    assert!(result.is_err());
    assert!(!app.is_authenticated());
    assert!(catalog.books().is_none());
    assert!(catalog.cache().is_empty());
}

#[tokio::test]
async fn second_session_starts_fresh() {
    let backend = Backend::spawn().await;
    backend.seed(abc());
    let app = backend.signed_in_app().await;
    app.logout().await.unwrap();

    backend.seed(abc().into_iter().take(1).collect());
    app.login(&account()).await.unwrap();

    assert_eq!(app.catalog().books().unwrap().len(), 1);
}

#[tokio::test]
async fn existing_token_is_picked_up_at_boot() {
    let backend = Backend::spawn().await;
    backend.seed(abc());
    let jar = Arc::new(MemoryCookieJar::new());

    let first = App::bootstrap(backend.settings(), jar.clone()).await.unwrap();
    first.login(&account()).await.unwrap();
    let calls = backend.list_calls();

    let second = App::bootstrap(backend.settings(), jar).await.unwrap();
    assert!(second.is_authenticated());
    assert_eq!(backend.list_calls(), calls + 1);
    assert_eq!(second.catalog().books().unwrap().len(), 3);
}
