pub mod entry;
pub mod tag;
pub mod user;

pub use entry::{Entry, EntrySummary};
pub use tag::Tag;
pub use user::User;
