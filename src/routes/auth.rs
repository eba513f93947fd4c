use std::borrow::Cow;
use std::collections::HashMap;

use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tower_sessions::Session;
use validator::{Validate, ValidationError};

use crate::auth::{login_user, logout_user, verify_password, AuthUser, MaybeUser};
use crate::error::AppError;
use crate::flash::{self, Layout, NoticeLevel};
use crate::routes::field_errors;
use crate::store::users::{self, NewUser};
use crate::store::StoreError;
use crate::AppState;

const LOGIN_FAILED: &str = "Your email or password was not recognised. Please try again.";

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    username: String,
    email: String,
    errors: HashMap<String, String>,

    layout: Layout,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    email: String,
    errors: HashMap<String, String>,

    layout: Layout,
}

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(custom(function = "validate_username"))]
    username: String,
    #[validate(email(message = "Please enter a valid email address."))]
    email: String,
    #[validate(
        length(min = 2, message = "Password must be at least 2 characters."),
        must_match(other = "password2", message = "Passwords must match.")
    )]
    password: String,
    #[validate(length(min = 1, message = "Please confirm your password."))]
    password2: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Please enter a valid email address."))]
    email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    password: String,
}

impl RegisterForm {
    fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self
        }
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("Username is required.")));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::new("username").with_message(Cow::Borrowed(
            "Username should be one word, letters, numbers and underscores only",
        )));
    }
    Ok(())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register_submit))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout))
}

async fn register_page(session: Session, MaybeUser(user): MaybeUser) -> Result<Response, AppError> {
    let template = RegisterTemplate {
        username: String::new(),
        email: String::new(),
        errors: HashMap::new(),
        layout: Layout::load(&session, user).await?,
    };
    Ok(Html(template.render()?).into_response())
}

async fn register_submit(
    State(state): State<AppState>,
    session: Session,
    MaybeUser(user): MaybeUser,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let form = form.trimmed();

    let mut errors = match form.validate() {
        Ok(()) => HashMap::new(),
        Err(e) => field_errors(&e),
    };
    if !errors.contains_key("username") && users::username_exists(&state.db, &form.username).await? {
        errors.insert("username".to_string(), "User with that name already exists.".to_string());
    }
    if !errors.contains_key("email") && users::email_exists(&state.db, &form.email).await? {
        errors.insert("email".to_string(), "User with that email already exists.".to_string());
    }

    let mut layout_notice = None;
    if errors.is_empty() {
        let created = users::create(
            &state.db,
            NewUser {
                username: &form.username,
                email: &form.email,
                password: &form.password,
                is_admin: false,
            },
        )
        .await;

        match created {
            Ok(_) => {
                flash::success(&session, "Registration successful.").await?;
                return Ok(Redirect::to("/").into_response());
            }
            Err(StoreError::UserExists) => layout_notice = Some("User already exists."),
            Err(e) => return Err(e.into()),
        }
    }

    let mut layout = Layout::load(&session, user).await?;
    if let Some(message) = layout_notice {
        layout = layout.with_notice(NoticeLevel::Error, message);
    }
    let template = RegisterTemplate {
        username: form.username,
        email: form.email,
        errors,
        layout,
    };
    Ok(Html(template.render()?).into_response())
}

async fn login_page(session: Session, MaybeUser(user): MaybeUser) -> Result<Response, AppError> {
    let template = LoginTemplate {
        email: String::new(),
        errors: HashMap::new(),
        layout: Layout::load(&session, user).await?,
    };
    Ok(Html(template.render()?).into_response())
}

async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_string();

    if let Err(e) = form.validate() {
        let template = LoginTemplate {
            email,
            errors: field_errors(&e),
            layout: Layout::load(&session, None).await?,
        };
        return Ok(Html(template.render()?).into_response());
    }

    let user = match users::find_by_email(&state.db, &email).await {
        Ok(user) if verify_password(&form.password, &user.password) => Some(user),
        Ok(_) | Err(StoreError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };

    match user {
        Some(user) => {
            login_user(&session, &user).await?;
            flash::success(&session, "Login successful.").await?;
            tracing::info!(user_id = user.id, "User logged in");
            Ok(Redirect::to("/").into_response())
        }
        None => {
            tracing::info!("Rejected login attempt");
            let template = LoginTemplate {
                email,
                errors: HashMap::new(),
                layout: Layout::load(&session, None)
                    .await?
                    .with_notice(NoticeLevel::Error, LOGIN_FAILED),
            };
            Ok(Html(template.render()?).into_response())
        }
    }
}

async fn logout(session: Session, AuthUser(user): AuthUser) -> Result<impl IntoResponse, AppError> {
    logout_user(&session).await?;
    flash::success(&session, "Logout successful.").await?;
    tracing::info!(user_id = user.id, "User logged out");
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form(username: &str, email: &str, password: &str, password2: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password2: password2.to_string(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register_form("ada_l", "ada@example.com", "pw", "pw").validate().is_ok());
    }

    #[test]
    fn username_must_be_one_word() {
        let errors = field_errors(&register_form("ada l", "ada@example.com", "pw", "pw").validate().unwrap_err());
        assert!(errors["username"].contains("one word"));
    }

    #[test]
    fn mismatched_passwords_are_reported() {
        let errors = field_errors(&register_form("ada", "ada@example.com", "pw", "px").validate().unwrap_err());
        assert_eq!(errors["password"], "Passwords must match.");
    }

    #[test]
    fn surrounding_spaces_are_trimmed_before_validation() {
        let form = register_form(" ada_l ", " ada@example.com ", "pw", "pw").trimmed();
        assert!(form.validate().is_ok());
        assert_eq!(form.username, "ada_l");
        assert_eq!(form.email, "ada@example.com");
    }

    #[test]
    fn short_password_and_bad_email_are_reported() {
        let errors = field_errors(&register_form("ada", "not-an-email", "p", "p").validate().unwrap_err());
        assert_eq!(errors["email"], "Please enter a valid email address.");
        assert_eq!(errors["password"], "Password must be at least 2 characters.");
    }
}
