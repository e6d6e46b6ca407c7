use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TITLE_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Personal,
    Work,
    Ideas,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Personal,
        Category::Work,
        Category::Ideas,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Work => "work",
            Category::Ideas => "ideas",
            Category::Other => "other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("'{}' is not a valid category", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored note. `owner` is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub owner: Uuid,
    pub category: Category,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated note ready to be persisted; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub owner: Uuid,
    pub category: Category,
    pub tags: Vec<String>,
    pub is_pinned: bool,
}

/// Public owner fields exposed next to a note. Never carries credential material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteOwner {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Public user record the store joins onto notes.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A note joined with its owner's public info, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub user: NoteOwner,
    pub category: Category,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NoteView {
    pub fn new(note: Note, owner: Option<&UserSummary>) -> Self {
        let user = NoteOwner {
            id: note.owner,
            name: owner.map(|u| u.name.clone()),
            email: owner.map(|u| u.email.clone()),
        };

        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            user,
            category: note.category,
            tags: note.tags,
            is_pinned: note.is_pinned,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteList {
    pub count: usize,
    pub notes: Vec<NoteView>,
}

/// Request body for creating a note. Only `title` and `content` are required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}

/// Request body for a partial update. `None` means "not supplied".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}

impl UpdateNote {
    /// Empty strings and empty lists are treated exactly like omitted fields.
    /// `is_pinned` is left alone so an explicit `false` still applies.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.filter(|v| !v.is_empty()),
            content: self.content.filter(|v| !v.is_empty()),
            category: self.category.filter(|v| !v.is_empty()),
            tags: self.tags.filter(|v| !v.is_empty()),
            is_pinned: self.is_pinned,
        }
    }
}
