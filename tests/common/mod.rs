#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::str::FromStr;

use journal::models::{Entry, User};
use journal::store::entries::{self, EntryInput};
use journal::store::users::{self, NewUser};
use journal::tagging::parse_tags;

pub const PASSWORD: &str = "hunter2";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        journal::db::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        let router = journal::build_app(pool.clone(), false)
            .await
            .expect("Failed to build app");

        Self { router, db: pool }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user whose password is [`PASSWORD`].
    pub async fn create_user(&self, username: &str) -> User {
        let email = format!("{username}@example.com");
        users::create(
            &self.db,
            NewUser {
                username,
                email: &email,
                password: PASSWORD,
                is_admin: false,
            },
        )
        .await
        .expect("Failed to create test user")
    }

    /// Log in as the given user and return the session cookie string.
    pub async fn login(&self, user: &User) -> String {
        let body = format!("email={}&password={}", user.email.replace('@', "%40"), PASSWORD);
        let resp = self.post_form("/login", &body, None).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        session_cookie(&resp).expect("Login should set a session cookie")
    }

    /// Insert an entry directly through the store.
    pub async fn create_entry(&self, author: &User, title: &str, date: &str, tags: &str) -> Entry {
        entries::create(&self.db, author.id, &entry_input(title, date, tags))
            .await
            .expect("Failed to create test entry")
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql).fetch_one(&self.db).await.unwrap();
        n
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST form request with an optional session cookie.
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }
}

pub fn entry_input(title: &str, date: &str, tags: &str) -> EntryInput {
    EntryInput {
        title: title.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        time_spent: 2,
        what_i_learned: "Something new".to_string(),
        resources_to_remember: "A good book".to_string(),
        tags: parse_tags(tags),
    }
}

pub fn tag_set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

/// Form body for the entry form with the given title and tags.
pub fn entry_form(title: &str, date: &str, tags: &str) -> String {
    format!(
        "title={}&date={}&time_spent=3&what_i_learned=Closures&resources_to_remember=The+Book&tags={}",
        title.replace(' ', "+"),
        date,
        tags.replace(',', "%2C").replace(' ', "+"),
    )
}

/// The `name=value` part of the response's session cookie, if it set one.
pub fn session_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert that a response is a redirect to the given location.
pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert!(
        resp.status().is_redirection(),
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}
