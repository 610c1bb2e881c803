//! Repository implementations.
//!
//! - `inmemory`: プロセス内の Presence テーブルとフォールバックストア
//! - `sqlite`: SQLite を使った永続ストア
//! - `gateway`: 2 つのバックエンドを切り替える Persistence Gateway

mod gateway;
pub mod inmemory;
pub mod sqlite;

pub use gateway::{BackendKind, PersistenceGateway, RetryPolicy};
pub use inmemory::{InMemoryPresenceRepository, InMemoryStore};
pub use sqlite::{SqliteConnector, SqliteStore};
