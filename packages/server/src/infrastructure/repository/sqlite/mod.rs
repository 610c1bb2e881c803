//! SQLite implementations (durable backend).

mod rows;
mod store;

pub use store::{SqliteConnector, SqliteStore};
