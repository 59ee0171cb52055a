pub mod reconciler;
pub mod sqlite;

pub use sqlite::SqliteStorage;
