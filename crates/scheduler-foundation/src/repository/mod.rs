//! Concrete [`scheduler_kernel::repository::TaskRepository`] backends.

pub mod memory;
#[cfg(feature = "persistence-sqlite")]
pub mod sqlite;

pub use memory::InMemoryTaskRepository;
#[cfg(feature = "persistence-sqlite")]
pub use sqlite::SqliteTaskRepository;
