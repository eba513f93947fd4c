//! One-shot notices carried in the session between a redirect and the next
//! rendered page.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::User;

const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

impl std::fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoticeLevel::Success => write!(f, "success"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub async fn push(
    session: &Session,
    level: NoticeLevel,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut notices: Vec<Notice> = session.get(FLASH_KEY).await?.unwrap_or_default();
    notices.push(Notice {
        level,
        message: message.into(),
    });
    session.insert(FLASH_KEY, notices).await
}

pub async fn success(
    session: &Session,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, NoticeLevel::Success, message).await
}

pub async fn error(
    session: &Session,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, NoticeLevel::Error, message).await
}

/// Remove and return every pending notice.
pub async fn take(session: &Session) -> Result<Vec<Notice>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<Notice>>(FLASH_KEY)
        .await?
        .unwrap_or_default())
}

/// Data every page shares through `base.html`.
pub struct Layout {
    pub user: Option<User>,
    pub notices: Vec<Notice>,
    pub static_hash: &'static str,
}

impl Layout {
    /// Drains pending notices, so build it only for a page that is rendered.
    pub async fn load(
        session: &Session,
        user: Option<User>,
    ) -> Result<Self, tower_sessions::session::Error> {
        Ok(Self {
            user,
            notices: take(session).await?,
            static_hash: crate::STATIC_HASH,
        })
    }

    pub fn anonymous() -> Self {
        Self {
            user: None,
            notices: Vec::new(),
            static_hash: crate::STATIC_HASH,
        }
    }

    /// Layout carrying extra notices produced while handling this request.
    pub fn with_notice(mut self, level: NoticeLevel, message: impl Into<String>) -> Self {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
        self
    }
}
