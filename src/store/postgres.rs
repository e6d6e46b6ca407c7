use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{NoteStore, StoreError};
use crate::database::{DatabaseError, DatabaseManager, QueryBuilder};
use crate::notes::model::{NewNote, Note, NoteView, UserSummary};
use crate::notes::query::NoteFilter;

const NOTES_TABLE: &str = "notes";
const NOTES_UUID_COLUMNS: &[&str] = &["id", "user_id"];

/// Row shape of the `notes` table. Category is stored as text and checked on read.
#[derive(Debug, FromRow)]
struct NoteRow {
    id: Uuid,
    title: String,
    content: String,
    user_id: Uuid,
    category: String,
    tags: Vec<String>,
    is_pinned: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NoteRow> for Note {
    type Error = StoreError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse()
            .map_err(|e: String| StoreError::Decode(format!("note {}: {}", row.id, e)))?;

        Ok(Note {
            id: row.id,
            title: row.title,
            content: row.content,
            owner: row.user_id,
            category,
            tags: row.tags,
            is_pinned: row.is_pinned,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
}

fn list_query(filter: &NoteFilter) -> Result<QueryBuilder<NoteRow>, DatabaseError> {
    QueryBuilder::<NoteRow>::new(NOTES_TABLE)?
        .uuid_columns(NOTES_UUID_COLUMNS)?
        .filter(filter.to_filter_data())
}

/// PostgreSQL-backed note store. Expects the tables in `sql/notes.sql`.
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn create(&self, note: NewNote) -> Result<Note, StoreError> {
        let row = sqlx::query_as::<_, NoteRow>(
            "INSERT INTO notes (title, content, user_id, category, tags, is_pinned)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.owner)
        .bind(note.category.as_str())
        .bind(&note.tags)
        .bind(note.is_pinned)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>, StoreError> {
        let row = sqlx::query_as::<_, NoteRow>("SELECT * FROM notes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Note::try_from).transpose()
    }

    async fn find(&self, filter: &NoteFilter) -> Result<Vec<Note>, StoreError> {
        let rows = list_query(filter)?.select_all(&self.pool).await?;

        rows.into_iter().map(Note::try_from).collect()
    }

    async fn save(&self, note: &Note) -> Result<Note, StoreError> {
        // user_id is never part of the SET list
        let row = sqlx::query_as::<_, NoteRow>(
            "UPDATE notes
             SET title = $2, content = $3, category = $4, tags = $5, is_pinned = $6, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(note.id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.category.as_str())
        .bind(&note.tags)
        .bind(note.is_pinned)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::Query(format!("note {} vanished before save", note.id)))?;

        row.try_into()
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn populate(&self, notes: Vec<Note>) -> Result<Vec<NoteView>, StoreError> {
        if notes.is_empty() {
            return Ok(vec![]);
        }

        let mut owner_ids: Vec<Uuid> = notes.iter().map(|n| n.owner).collect();
        owner_ids.sort();
        owner_ids.dedup();

        let users: HashMap<Uuid, UserSummary> =
            sqlx::query_as::<_, UserRow>("SELECT id, name, email FROM users WHERE id = ANY($1)")
                .bind(&owner_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|u| (u.id, UserSummary { id: u.id, name: u.name, email: u.email }))
                .collect();

        Ok(notes
            .into_iter()
            .map(|note| {
                let owner = users.get(&note.owner);
                NoteView::new(note, owner)
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await?;
        Ok(())
    }
}
