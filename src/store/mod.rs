pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::notes::model::{NewNote, Note, NoteView};
use crate::notes::query::NoteFilter;

pub use memory::MemoryNoteStore;
pub use postgres::PgNoteStore;

/// Failures raised by a persistence backend. The message is diagnostic only and
/// is not meant for untrusted callers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store query failed: {0}")]
    Query(String),

    #[error("stored record is malformed: {0}")]
    Decode(String),
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match &err {
            DatabaseError::ConfigMissing(_)
            | DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
            | DatabaseError::Sqlx(sqlx::Error::PoolClosed) => StoreError::Unavailable(err.to_string()),
            DatabaseError::Sqlx(sqlx::Error::ColumnDecode { .. }) => StoreError::Decode(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

/// Document-store collaborator the note guard delegates to. Implementations
/// assign ids and timestamps; they never check ownership.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create(&self, note: NewNote) -> Result<Note, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>, StoreError>;

    /// All notes matching `filter`, newest first.
    async fn find(&self, filter: &NoteFilter) -> Result<Vec<Note>, StoreError>;

    /// Persist the mutable fields of `note` and refresh `updated_at`.
    async fn save(&self, note: &Note) -> Result<Note, StoreError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError>;

    /// Join each note with its owner's public user record, preserving order.
    async fn populate(&self, notes: Vec<Note>) -> Result<Vec<NoteView>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
