use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::model::Note;
use crate::auth::Identity;
use crate::filter::FilterData;

/// `tags` arrives either as one comma-separated string or as a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagsParam {
    Csv(String),
    List(Vec<String>),
}

impl TagsParam {
    pub fn into_list(self) -> Vec<String> {
        match self {
            TagsParam::Csv(s) => s.split(',').map(str::to_string).collect(),
            TagsParam::List(list) => list,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            TagsParam::Csv(s) => s.is_empty(),
            TagsParam::List(list) => list.is_empty(),
        }
    }
}

/// Raw, untrusted list parameters exactly as the client sent them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category: Option<String>,
    pub is_pinned: Option<String>,
    pub tags: Option<TagsParam>,
}

impl ListQuery {
    /// Build from decoded query-string pairs. A repeated `tags` key becomes a
    /// list; a single one stays a comma-separated string.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = ListQuery::default();
        let mut tags: Vec<String> = Vec::new();

        for (key, value) in pairs {
            match key.as_str() {
                "category" => query.category = Some(value),
                "isPinned" => query.is_pinned = Some(value),
                "tags" | "tags[]" => tags.push(value),
                _ => {}
            }
        }

        query.tags = match tags.len() {
            0 => None,
            1 => tags.pop().map(TagsParam::Csv),
            _ => Some(TagsParam::List(tags)),
        };

        query
    }
}

/// A list query scoped to one owner. Every field besides `owner` is optional and
/// all present fields must hold for a note to match.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFilter {
    pub owner: Uuid,
    pub category: Option<String>,
    pub is_pinned: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl NoteFilter {
    pub fn for_owner(identity: &Identity) -> Self {
        Self {
            owner: identity.id(),
            category: None,
            is_pinned: None,
            tags: None,
        }
    }

    /// Narrow the owner scope with whatever optional parameters were supplied.
    /// `isPinned` only filters on the literal strings "true" and "false".
    pub fn from_query(identity: &Identity, query: ListQuery) -> Self {
        let mut filter = Self::for_owner(identity);

        filter.category = query.category.filter(|c| !c.is_empty());

        filter.is_pinned = match query.is_pinned.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };

        filter.tags = query
            .tags
            .filter(|t| !t.is_empty())
            .map(TagsParam::into_list);

        filter
    }

    pub fn matches(&self, note: &Note) -> bool {
        if note.owner != self.owner {
            return false;
        }
        if let Some(category) = &self.category {
            if note.category.as_str() != category {
                return false;
            }
        }
        if let Some(pinned) = self.is_pinned {
            if note.is_pinned != pinned {
                return false;
            }
        }
        if let Some(tags) = &self.tags {
            if !note.tags.iter().any(|t| tags.contains(t)) {
                return false;
            }
        }
        true
    }

    /// Express the filter in the JSON where/order form the SQL generator reads.
    pub fn to_filter_data(&self) -> FilterData {
        let mut where_clause = Map::new();
        where_clause.insert("user_id".to_string(), json!(self.owner.to_string()));

        if let Some(category) = &self.category {
            where_clause.insert("category".to_string(), json!(category));
        }
        if let Some(pinned) = self.is_pinned {
            where_clause.insert("is_pinned".to_string(), json!(pinned));
        }
        if let Some(tags) = &self.tags {
            where_clause.insert("tags".to_string(), json!({ "$any": tags }));
        }

        FilterData {
            where_clause: Some(Value::Object(where_clause)),
            order: Some(json!("created_at desc")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::model::Category;
    use chrono::Utc;

    fn identity() -> Identity {
        Identity::new(Uuid::new_v4())
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn note(owner: Uuid, category: Category, pinned: bool, tags: &[&str]) -> Note {
        let now = Utc::now();
        Note {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            content: "c".to_string(),
            owner,
            category,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_pinned: pinned,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pin_filter_is_three_state() {
        let id = identity();
        let filter = |v: Option<&str>| {
            NoteFilter::from_query(
                &id,
                ListQuery {
                    is_pinned: v.map(str::to_string),
                    ..Default::default()
                },
            )
            .is_pinned
        };

        assert_eq!(filter(Some("true")), Some(true));
        assert_eq!(filter(Some("false")), Some(false));
        assert_eq!(filter(Some("maybe")), None);
        assert_eq!(filter(Some("TRUE")), None);
        assert_eq!(filter(Some("1")), None);
        assert_eq!(filter(None), None);
    }

    #[test]
    fn tags_normalize_from_csv_or_list() {
        let id = identity();

        let single = NoteFilter::from_query(&id, ListQuery::from_pairs(pairs(&[("tags", "x,y")])));
        assert_eq!(single.tags, Some(vec!["x".to_string(), "y".to_string()]));

        let repeated = NoteFilter::from_query(
            &id,
            ListQuery::from_pairs(pairs(&[("tags", "a,b"), ("tags", "c")])),
        );
        assert_eq!(repeated.tags, Some(vec!["a,b".to_string(), "c".to_string()]));

        let empty = NoteFilter::from_query(&id, ListQuery::from_pairs(pairs(&[("tags", "")])));
        assert_eq!(empty.tags, None);
    }

    #[test]
    fn empty_category_means_no_filter() {
        let id = identity();
        let filter = NoteFilter::from_query(&id, ListQuery::from_pairs(pairs(&[("category", "")])));
        assert_eq!(filter.category, None);
        assert_eq!(filter.owner, id.id());
    }

    #[test]
    fn matches_is_conjunctive_and_tags_any_match() {
        let id = identity();
        let filter = NoteFilter {
            category: Some("work".to_string()),
            is_pinned: Some(true),
            tags: Some(vec!["x".to_string(), "y".to_string()]),
            ..NoteFilter::for_owner(&id)
        };

        assert!(filter.matches(&note(id.id(), Category::Work, true, &["y", "z"])));
        assert!(!filter.matches(&note(id.id(), Category::Work, true, &["z"])));
        assert!(!filter.matches(&note(id.id(), Category::Work, false, &["x"])));
        assert!(!filter.matches(&note(id.id(), Category::Ideas, true, &["x"])));
        assert!(!filter.matches(&note(Uuid::new_v4(), Category::Work, true, &["x"])));
    }

    #[test]
    fn filter_data_always_scopes_owner() {
        let id = identity();
        let data = NoteFilter::from_query(
            &id,
            ListQuery {
                tags: Some(TagsParam::List(vec!["x".to_string()])),
                ..Default::default()
            },
        )
        .to_filter_data();

        let where_clause = data.where_clause.unwrap();
        assert_eq!(where_clause["user_id"], json!(id.id().to_string()));
        assert_eq!(where_clause["tags"], json!({ "$any": ["x"] }));
        assert!(where_clause.get("is_pinned").is_none());
        assert_eq!(data.order, Some(json!("created_at desc")));
    }

    #[test]
    fn unknown_query_keys_are_ignored() {
        let query = ListQuery::from_pairs(pairs(&[("sort", "asc"), ("isPinned", "true")]));
        assert_eq!(query.is_pinned.as_deref(), Some("true"));
        assert_eq!(query.category, None);
        assert_eq!(query.tags, None);
    }
}
