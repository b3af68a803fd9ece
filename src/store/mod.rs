pub mod media;
pub mod memory;
pub mod sqlite;
pub mod r#trait;

pub use media::MediaStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use r#trait::{DocumentStore, StoreResult};
