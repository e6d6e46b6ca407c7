//! Note resources and the access-control layer in front of the store.

pub mod guard;
pub mod model;
pub mod query;

pub use guard::{is_owner, NoteAction, NoteError, NoteGuard};
pub use model::{Category, CreateNote, Note, NoteList, NoteView, UpdateNote};
pub use query::{ListQuery, NoteFilter, TagsParam};
