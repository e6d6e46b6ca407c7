use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use super::model::{Category, CreateNote, NewNote, Note, NoteList, NoteView, UpdateNote, TITLE_MAX_CHARS};
use super::query::{ListQuery, NoteFilter};
use crate::auth::Identity;
use crate::store::{NoteStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    Access,
    Update,
    Delete,
}

impl std::fmt::Display for NoteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NoteAction::Access => "access",
            NoteAction::Update => "update",
            NoteAction::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("Note not found")]
    NotFound,

    #[error("Not authorized to {0} this note")]
    Forbidden(NoteAction),

    /// Message is already safe to show the caller.
    #[error("{0}")]
    Store(String),
}

impl NoteError {
    pub fn status_code(&self) -> u16 {
        match self {
            NoteError::Validation { .. } => 400,
            NoteError::Forbidden(_) => 403,
            NoteError::NotFound => 404,
            NoteError::Store(_) => 500,
        }
    }

    fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        NoteError::Validation {
            message: message.into(),
            field_errors,
        }
    }

    fn field(field: &str, error: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), error.into());
        Self::validation("Note validation failed", field_errors)
    }
}

/// The single ownership predicate every single-note path goes through.
pub fn is_owner(identity: &Identity, note: &Note) -> bool {
    note.owner == identity.id()
}

/// Mediates every note operation between a verified caller and the store.
///
/// Existence is checked before ownership, so a caller can tell "no such note"
/// (404) apart from "someone else's note" (403).
#[derive(Clone)]
pub struct NoteGuard {
    store: Arc<dyn NoteStore>,
    expose_store_errors: bool,
}

impl NoteGuard {
    /// `expose_store_errors` passes store diagnostics through to callers;
    /// only meant for development.
    pub fn new(store: Arc<dyn NoteStore>, expose_store_errors: bool) -> Self {
        Self {
            store,
            expose_store_errors,
        }
    }

    pub fn store(&self) -> &Arc<dyn NoteStore> {
        &self.store
    }

    pub async fn create(&self, identity: &Identity, fields: CreateNote) -> Result<NoteView, NoteError> {
        let new_note = validate_new_note(identity, fields)?;

        let note = self
            .store
            .create(new_note)
            .await
            .map_err(|e| self.store_failure("creating note", e))?;

        tracing::debug!(note_id = %note.id, owner = %identity, "note created");
        self.view(note, "creating note").await
    }

    pub async fn list(&self, identity: &Identity, query: ListQuery) -> Result<NoteList, NoteError> {
        let filter = NoteFilter::from_query(identity, query);

        let notes = self
            .store
            .find(&filter)
            .await
            .map_err(|e| self.store_failure("fetching notes", e))?;

        let notes = self
            .store
            .populate(notes)
            .await
            .map_err(|e| self.store_failure("fetching notes", e))?;

        Ok(NoteList {
            count: notes.len(),
            notes,
        })
    }

    pub async fn get(&self, identity: &Identity, note_id: &str) -> Result<NoteView, NoteError> {
        let note = self.owned_note(identity, note_id, NoteAction::Access, "fetching note").await?;
        self.view(note, "fetching note").await
    }

    pub async fn update(&self, identity: &Identity, note_id: &str, changes: UpdateNote) -> Result<NoteView, NoteError> {
        let mut note = self.owned_note(identity, note_id, NoteAction::Update, "updating note").await?;

        apply_changes(&mut note, changes.normalized())?;

        let saved = self
            .store
            .save(&note)
            .await
            .map_err(|e| self.store_failure("updating note", e))?;

        self.view(saved, "updating note").await
    }

    pub async fn delete(&self, identity: &Identity, note_id: &str) -> Result<(), NoteError> {
        let note = self.owned_note(identity, note_id, NoteAction::Delete, "deleting note").await?;

        self.store
            .delete_by_id(note.id)
            .await
            .map_err(|e| self.store_failure("deleting note", e))?;

        tracing::debug!(note_id = %note.id, owner = %identity, "note deleted");
        Ok(())
    }

    /// Fetch a note and confirm the caller owns it.
    async fn owned_note(
        &self,
        identity: &Identity,
        note_id: &str,
        action: NoteAction,
        context: &str,
    ) -> Result<Note, NoteError> {
        let id = parse_note_id(note_id)?;

        let note = self
            .store
            .find_by_id(id)
            .await
            .map_err(|e| self.store_failure(context, e))?
            .ok_or(NoteError::NotFound)?;

        if !is_owner(identity, &note) {
            tracing::warn!(note_id = %note.id, caller = %identity, %action, "ownership check failed");
            return Err(NoteError::Forbidden(action));
        }

        Ok(note)
    }

    async fn view(&self, note: Note, context: &str) -> Result<NoteView, NoteError> {
        let id = note.id;
        self.store
            .populate(vec![note])
            .await
            .map_err(|e| self.store_failure(context, e))?
            .pop()
            .ok_or_else(|| self.store_failure(context, StoreError::Query(format!("populate dropped note {}", id))))
    }

    fn store_failure(&self, context: &str, err: StoreError) -> NoteError {
        tracing::error!(error = %err, "store failure while {}", context);
        if self.expose_store_errors {
            NoteError::Store(err.to_string())
        } else {
            NoteError::Store(format!("Error {}", context))
        }
    }
}

/// Ids the store could never have issued are simply "not found".
fn parse_note_id(raw: &str) -> Result<Uuid, NoteError> {
    Uuid::parse_str(raw).map_err(|_| NoteError::NotFound)
}

fn validate_title(raw: &str) -> Result<String, (&'static str, String)> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(("title", "Please provide a title".to_string()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(("title", format!("Title cannot exceed {} characters", TITLE_MAX_CHARS)));
    }
    Ok(title.to_string())
}

fn validate_category(raw: &str) -> Result<Category, (&'static str, String)> {
    raw.parse::<Category>().map_err(|e| ("category", e))
}

fn validate_new_note(identity: &Identity, fields: CreateNote) -> Result<NewNote, NoteError> {
    let title = fields.title.filter(|t| !t.is_empty());
    let content = fields.content.filter(|c| !c.is_empty());

    let (Some(title), Some(content)) = (title, content) else {
        let mut field_errors = HashMap::new();
        field_errors.insert("title".to_string(), "Please provide a title".to_string());
        field_errors.insert("content".to_string(), "Please provide content".to_string());
        return Err(NoteError::validation("Please provide title and content", field_errors));
    };

    let mut field_errors = HashMap::new();

    let title = validate_title(&title)
        .map_err(|(field, error)| field_errors.insert(field.to_string(), error))
        .ok();

    let category = match fields.category.filter(|c| !c.is_empty()) {
        Some(raw) => validate_category(&raw)
            .map_err(|(field, error)| field_errors.insert(field.to_string(), error))
            .ok(),
        None => Some(Category::default()),
    };

    match (title, category) {
        (Some(title), Some(category)) => Ok(NewNote {
            title,
            content,
            owner: identity.id(),
            category,
            tags: fields.tags.unwrap_or_default(),
            is_pinned: fields.is_pinned.unwrap_or(false),
        }),
        _ => Err(NoteError::validation("Note validation failed", field_errors)),
    }
}

/// Merge already-normalized changes; owner and id are never touched.
fn apply_changes(note: &mut Note, changes: UpdateNote) -> Result<(), NoteError> {
    if let Some(title) = changes.title {
        note.title = validate_title(&title).map_err(|(f, e)| NoteError::field(f, e))?;
    }
    if let Some(content) = changes.content {
        note.content = content;
    }
    if let Some(category) = changes.category {
        note.category = validate_category(&category).map_err(|(f, e)| NoteError::field(f, e))?;
    }
    if let Some(tags) = changes.tags {
        note.tags = tags;
    }
    if let Some(is_pinned) = changes.is_pinned {
        note.is_pinned = is_pinned;
    }
    Ok(())
}
