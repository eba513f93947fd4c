use chrono::NaiveDate;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Entry {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    pub time_spent: i64,
    pub what_i_learned: String,
    pub resources_to_remember: String,
}

impl Entry {
    /// Human readable form of the entry date, e.g. "January 2, 2024".
    pub fn display_date(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }

    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

/// An entry together with its author's username and its sorted tag names,
/// as shown on the listing and detail pages.
#[derive(Debug, Clone)]
pub struct EntrySummary {
    pub entry: Entry,
    pub author: String,
    pub tags: Vec<String>,
}
