use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NoteStore, StoreError};
use crate::notes::model::{NewNote, Note, NoteView, UserSummary};
use crate::notes::query::NoteFilter;

/// In-process store. Notes are kept in insertion order so ties on `created_at`
/// still list the most recently inserted note first.
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: RwLock<Vec<Note>>,
    users: RwLock<HashMap<Uuid, UserSummary>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserSummary) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn create(&self, note: NewNote) -> Result<Note, StoreError> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            title: note.title,
            content: note.content,
            owner: note.owner,
            category: note.category,
            tags: note.tags,
            is_pinned: note.is_pinned,
            created_at: now,
            updated_at: now,
        };

        self.notes.write().await.push(note.clone());
        Ok(note)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>, StoreError> {
        Ok(self.notes.read().await.iter().find(|n| n.id == id).cloned())
    }

    async fn find(&self, filter: &NoteFilter) -> Result<Vec<Note>, StoreError> {
        let mut found: Vec<Note> = self
            .notes
            .read()
            .await
            .iter()
            .rev()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect();

        // Stable sort keeps reverse insertion order among equal timestamps
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn save(&self, note: &Note) -> Result<Note, StoreError> {
        let mut notes = self.notes.write().await;
        let stored = notes
            .iter_mut()
            .find(|n| n.id == note.id)
            .ok_or_else(|| StoreError::Query(format!("note {} vanished before save", note.id)))?;

        stored.title = note.title.clone();
        stored.content = note.content.clone();
        stored.category = note.category;
        stored.tags = note.tags.clone();
        stored.is_pinned = note.is_pinned;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        self.notes.write().await.retain(|n| n.id != id);
        Ok(())
    }

    async fn populate(&self, notes: Vec<Note>) -> Result<Vec<NoteView>, StoreError> {
        let users = self.users.read().await;
        Ok(notes
            .into_iter()
            .map(|note| {
                let owner = users.get(&note.owner);
                NoteView::new(note, owner)
            })
            .collect())
    }
}
