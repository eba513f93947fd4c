mod common;

use axum::http::StatusCode;
use common::{assert_redirect, body_string, session_cookie, TestApp, PASSWORD};

const REGISTER_ADA: &str =
    "username=ada_l&email=ada%40example.com&password=secret&password2=secret";

#[tokio::test]
async fn register_creates_user_and_flashes_success() {
    let app = TestApp::new().await;

    let resp = app.post_form("/register", REGISTER_ADA, None).await;
    assert_redirect(&resp, "/");
    let cookie = session_cookie(&resp).expect("flash needs a session");

    let stored: (String, String) = sqlx::query_as("SELECT username, password FROM users WHERE email = ?")
        .bind("ada@example.com")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(stored.0, "ada_l");
    assert!(stored.1.starts_with("$argon2"), "password must be stored hashed");

    let html = body_string(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("Registration successful."));

    // Notices are shown once.
    let html = body_string(app.get("/", Some(&cookie)).await).await;
    assert!(!html.contains("Registration successful."));
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = TestApp::new().await;
    app.post_form("/register", REGISTER_ADA, None).await;

    let body = "username=other&email=ada%40example.com&password=secret&password2=secret";
    let resp = app.post_form("/register", body, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("User with that email already exists."));

    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 1);
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let app = TestApp::new().await;
    app.post_form("/register", REGISTER_ADA, None).await;

    let body = "username=ada_l&email=other%40example.com&password=secret&password2=secret";
    let html = body_string(app.post_form("/register", body, None).await).await;
    assert!(html.contains("User with that name already exists."));
}

#[tokio::test]
async fn register_trims_username_and_email() {
    let app = TestApp::new().await;

    let body = "username=+ada_l+&email=+ada%40example.com+&password=secret&password2=secret";
    assert_redirect(&app.post_form("/register", body, None).await, "/");

    let stored: (String, String) = sqlx::query_as("SELECT username, email FROM users")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(stored, ("ada_l".to_string(), "ada@example.com".to_string()));
}

#[tokio::test]
async fn register_shows_field_errors() {
    let app = TestApp::new().await;

    let body = "username=two+words&email=nope&password=secret&password2=different";
    let resp = app.post_form("/register", body, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("letters, numbers and underscores only"));
    assert!(html.contains("Please enter a valid email address."));
    assert!(html.contains("Passwords must match."));
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 0);
}

#[tokio::test]
async fn login_with_valid_credentials() {
    let app = TestApp::new().await;
    let user = app.create_user("grace").await;

    let body = format!("email=grace%40example.com&password={PASSWORD}");
    let resp = app.post_form("/login", &body, None).await;

    assert_redirect(&resp, "/");
    let cookie = session_cookie(&resp).expect("login sets a session cookie");

    let html = body_string(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("Login successful."));
    assert!(html.contains(&user.username));
    assert!(html.contains("Log out"));
}

#[tokio::test]
async fn login_with_wrong_password() {
    let app = TestApp::new().await;
    app.create_user("grace").await;

    let resp = app
        .post_form("/login", "email=grace%40example.com&password=wrong", None)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Your email or password was not recognised."));
}

#[tokio::test]
async fn login_with_unknown_email() {
    let app = TestApp::new().await;

    let resp = app
        .post_form("/login", "email=nobody%40example.com&password=whatever", None)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Your email or password was not recognised."));
}

#[tokio::test]
async fn logout_clears_session() {
    let app = TestApp::new().await;
    let user = app.create_user("grace").await;
    let cookie = app.login(&user).await;

    let resp = app.get("/logout", Some(&cookie)).await;
    assert_redirect(&resp, "/");

    let resp = app.get("/entries/new", Some(&cookie)).await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn session_for_deleted_user_is_anonymous() {
    let app = TestApp::new().await;
    let user = app.create_user("grace").await;
    let cookie = app.login(&user).await;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user.id)
        .execute(&app.db)
        .await
        .unwrap();

    let resp = app.get("/entries/new", Some(&cookie)).await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn unauthenticated_new_entry_redirects_to_login() {
    let app = TestApp::new().await;
    let resp = app.get("/entries/new", None).await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn unauthenticated_logout_redirects_to_login() {
    let app = TestApp::new().await;
    let resp = app.get("/logout", None).await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn index_is_public() {
    let app = TestApp::new().await;
    let resp = app.get("/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("No entries yet."));
    assert!(html.contains("Register"));
}
