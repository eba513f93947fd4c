use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use tower_sessions::Session;

use crate::auth::MaybeUser;
use crate::error::AppError;
use crate::flash::Layout;
use crate::routes::entries::EntryListTemplate;
use crate::store::entries;
use crate::tagging::normalize;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/entries/tag/{tag}", get(show_tag))
}

async fn show_tag(
    State(state): State<AppState>,
    session: Session,
    MaybeUser(user): MaybeUser,
    Path(tag): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tag = normalize(&tag);
    if tag.is_empty() {
        return Err(AppError::NotFound);
    }

    let entries = entries::list_by_tag(&state.db, &tag).await?;

    let template = EntryListTemplate {
        entries,
        heading: Some(format!("Entries tagged \u{201c}{tag}\u{201d}")),
        layout: Layout::load(&session, user).await?,
    };
    Ok(Html(template.render()?))
}
