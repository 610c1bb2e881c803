//! In-process implementations.

mod presence;
mod store;

pub use presence::InMemoryPresenceRepository;
pub use store::InMemoryStore;
