use std::collections::HashMap;

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tower_sessions::Session;
use validator::Validate;

use crate::auth::{AuthUser, MaybeUser};
use crate::error::AppError;
use crate::flash::{self, Layout, NoticeLevel};
use crate::models::tag::MAX_TAG_LEN;
use crate::models::{EntrySummary, User};
use crate::routes::field_errors;
use crate::store::entries::{self, EntryInput};
use crate::store::StoreError;
use crate::tagging::{join_tags, parse_tags};
use crate::AppState;

const DUPLICATE_TITLE: &str = "Title already exists!";

#[derive(Template)]
#[template(path = "entries/list.html")]
pub(crate) struct EntryListTemplate {
    pub(crate) entries: Vec<EntrySummary>,
    pub(crate) heading: Option<String>,

    pub(crate) layout: Layout,
}

#[derive(Template)]
#[template(path = "entries/detail.html")]
struct EntryDetailTemplate {
    item: EntrySummary,
    can_edit: bool,

    layout: Layout,
}

#[derive(Template)]
#[template(path = "entries/form.html")]
struct EntryFormTemplate {
    heading: &'static str,
    action: String,
    form: EntryForm,
    errors: HashMap<String, String>,

    layout: Layout,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct EntryForm {
    #[validate(length(min = 1, max = 255, message = "'Title' is a required field and must be under 256 characters."))]
    title: String,
    date: String,
    time_spent: String,
    #[validate(length(min = 1, message = "'What I Learned' is a required field."))]
    what_i_learned: String,
    #[validate(length(min = 1, message = "'Resources to Remember' is a required field."))]
    resources_to_remember: String,
    tags: String,
}

impl EntryForm {
    fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            date: self.date.trim().to_string(),
            time_spent: self.time_spent.trim().to_string(),
            what_i_learned: self.what_i_learned.trim().to_string(),
            resources_to_remember: self.resources_to_remember.trim().to_string(),
            tags: self.tags,
        }
    }

    fn blank() -> Self {
        Self {
            date: Local::now().date_naive().format("%Y-%m-%d").to_string(),
            ..Self::default()
        }
    }
}

/// Check a submitted entry form and turn it into store input.
fn validate_entry_form(form: &EntryForm) -> Result<EntryInput, HashMap<String, String>> {
    let mut errors = match form.validate() {
        Ok(()) => HashMap::new(),
        Err(e) => field_errors(&e),
    };

    let date = NaiveDate::parse_from_str(&form.date, "%Y-%m-%d").ok();
    if date.is_none() {
        errors.insert("date".to_string(), "Date must be a valid date in YYYY-MM-DD format.".to_string());
    }

    let time_spent = form.time_spent.parse::<i64>().ok().filter(|n| *n > 0);
    if time_spent.is_none() {
        errors.insert("time_spent".to_string(), "Time Spent must be a whole number.".to_string());
    }

    let tags = parse_tags(&form.tags);
    if tags.iter().any(|t| t.chars().count() > MAX_TAG_LEN) {
        errors.insert(
            "tags".to_string(),
            format!("Tags must be {MAX_TAG_LEN} characters or fewer."),
        );
    }

    match (date, time_spent) {
        (Some(date), Some(time_spent)) if errors.is_empty() => Ok(EntryInput {
            title: form.title.clone(),
            date,
            time_spent,
            what_i_learned: form.what_i_learned.clone(),
            resources_to_remember: form.resources_to_remember.clone(),
            tags,
        }),
        _ => Err(errors),
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries))
        .route("/entries", get(list_entries))
        .route("/entries/new", get(new_entry_form).post(create_entry))
        .route("/entries/{id}", get(show_entry))
        .route("/entries/{id}/edit", get(edit_entry_form).post(update_entry))
        .route("/entries/{id}/delete", get(delete_entry).post(delete_entry))
}

async fn list_entries(
    State(state): State<AppState>,
    session: Session,
    MaybeUser(user): MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let entries = entries::list(&state.db).await?;

    let template = EntryListTemplate {
        entries,
        heading: None,
        layout: Layout::load(&session, user).await?,
    };
    Ok(Html(template.render()?))
}

async fn show_entry(
    State(state): State<AppState>,
    session: Session,
    MaybeUser(user): MaybeUser,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = entries::detail(&state.db, &key).await?;
    let can_edit = user.as_ref().is_some_and(|u| item.entry.is_authored_by(u.id));

    let template = EntryDetailTemplate {
        item,
        can_edit,
        layout: Layout::load(&session, user).await?,
    };
    Ok(Html(template.render()?))
}

async fn render_form(
    session: &Session,
    user: User,
    heading: &'static str,
    action: String,
    form: EntryForm,
    errors: HashMap<String, String>,
    notice: Option<&str>,
) -> Result<Response, AppError> {
    let mut layout = Layout::load(session, Some(user)).await?;
    if let Some(message) = notice {
        layout = layout.with_notice(NoticeLevel::Error, message);
    }

    let template = EntryFormTemplate {
        heading,
        action,
        form,
        errors,
        layout,
    };
    Ok(Html(template.render()?).into_response())
}

async fn new_entry_form(session: Session, AuthUser(user): AuthUser) -> Result<Response, AppError> {
    render_form(
        &session,
        user,
        "New Entry",
        "/entries/new".to_string(),
        EntryForm::blank(),
        HashMap::new(),
        None,
    )
    .await
}

async fn create_entry(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Form(form): Form<EntryForm>,
) -> Result<Response, AppError> {
    let form = form.trimmed();
    let action = "/entries/new".to_string();

    let input = match validate_entry_form(&form) {
        Ok(input) => input,
        Err(errors) => return render_form(&session, user, "New Entry", action, form, errors, None).await,
    };

    match entries::create(&state.db, user.id, &input).await {
        Ok(_) => {
            flash::success(&session, "Entry created successfully!").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(StoreError::DuplicateSlug) => {
            render_form(&session, user, "New Entry", action, form, HashMap::new(), Some(DUPLICATE_TITLE)).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_entry_form(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let item = entries::detail_by_id(&state.db, parse_id(&id)?).await?;

    if !item.entry.is_authored_by(user.id) {
        flash::error(&session, "You can only edit your own entries.").await?;
        return Ok(Redirect::to(&format!("/entries/{}", item.entry.slug)).into_response());
    }

    let entry = item.entry;
    let form = EntryForm {
        title: entry.title,
        date: entry.date.format("%Y-%m-%d").to_string(),
        time_spent: entry.time_spent.to_string(),
        what_i_learned: entry.what_i_learned,
        resources_to_remember: entry.resources_to_remember,
        tags: join_tags(&item.tags),
    };

    render_form(
        &session,
        user,
        "Edit Entry",
        format!("/entries/{}/edit", entry.id),
        form,
        HashMap::new(),
        None,
    )
    .await
}

async fn update_entry(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<EntryForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let form = form.trimmed();
    let action = format!("/entries/{id}/edit");

    let existing = entries::find_by_id(&state.db, id).await?;
    if !existing.is_authored_by(user.id) {
        tracing::warn!(entry_id = id, user_id = user.id, "Rejected edit by non-author");
        flash::error(&session, "You can only edit your own entries.").await?;
        return Ok(Redirect::to(&format!("/entries/{}", existing.slug)).into_response());
    }

    let input = match validate_entry_form(&form) {
        Ok(input) => input,
        Err(errors) => return render_form(&session, user, "Edit Entry", action, form, errors, None).await,
    };

    match entries::update(&state.db, id, user.id, &input).await {
        Ok(_) => {
            flash::success(&session, "Entry edited successfully!").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(StoreError::DuplicateSlug) => {
            render_form(&session, user, "Edit Entry", action, form, HashMap::new(), Some(DUPLICATE_TITLE)).await
        }
        Err(StoreError::NotAuthor) => {
            flash::error(&session, "You can only edit your own entries.").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_entry(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    match entries::delete(&state.db, id, user.id).await {
        Ok(()) => flash::success(&session, "Entry deleted successfully!").await?,
        Err(StoreError::NotAuthor) => {
            tracing::warn!(entry_id = id, user_id = user.id, "Rejected delete by non-author");
            flash::error(&session, "You can only delete your own entries.").await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/").into_response())
}
