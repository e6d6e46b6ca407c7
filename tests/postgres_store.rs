//! Runs the Postgres store against a live database.
//!
//! `DATABASE_URL=postgres://... cargo test --test postgres_store -- --ignored`

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use notes_api_rust::auth::Identity;
use notes_api_rust::config::DatabaseConfig;
use notes_api_rust::database::DatabaseManager;
use notes_api_rust::notes::{CreateNote, ListQuery, NoteError, NoteGuard, UpdateNote};
use notes_api_rust::store::PgNoteStore;

const UUID_LIKE_TAG: &str = "7b0c1f3e-8d5a-4a4b-9a55-2f0d6c1e9b11";

async fn connect() -> Result<Option<PgPool>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(None);
    };

    let pool = DatabaseManager::connect(&DatabaseConfig {
        url: Some(url),
        max_connections: 2,
        connection_timeout: 5,
    })
    .await?;

    let schema = include_str!("../sql/notes.sql");
    let statements = schema
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");
    for statement in statements.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(&pool).await.context("apply schema")?;
    }

    Ok(Some(pool))
}

async fn insert_user(pool: &PgPool) -> Result<Identity> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, email) VALUES ($1, $2, $3)")
        .bind(id)
        .bind("Test User")
        .bind(format!("{}@example.test", id))
        .execute(pool)
        .await?;
    Ok(Identity::new(id))
}

fn list(query: &[(&str, &str)]) -> ListQuery {
    ListQuery::from_pairs(
        query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn uuid_shaped_filter_values_are_compared_as_text() -> Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let guard = NoteGuard::new(Arc::new(PgNoteStore::new(pool.clone())), true);
    let owner = insert_user(&pool).await?;

    guard
        .create(
            &owner,
            CreateNote {
                title: Some("tagged".to_string()),
                content: Some("body".to_string()),
                tags: Some(vec![UUID_LIKE_TAG.to_string(), "x".to_string()]),
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(guard.list(&owner, list(&[("tags", "x")])).await?.count, 1);
    assert_eq!(guard.list(&owner, list(&[("tags", UUID_LIKE_TAG)])).await?.count, 1);
    assert_eq!(guard.list(&owner, list(&[("category", UUID_LIKE_TAG)])).await?.count, 0);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn postgres_round_trip_respects_ownership() -> Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let guard = NoteGuard::new(Arc::new(PgNoteStore::new(pool.clone())), true);
    let owner = insert_user(&pool).await?;
    let stranger = insert_user(&pool).await?;

    let note = guard
        .create(
            &owner,
            CreateNote {
                title: Some("mine".to_string()),
                content: Some("body".to_string()),
                is_pinned: Some(true),
                ..Default::default()
            },
        )
        .await?;
    let id = note.id.to_string();

    assert!(matches!(guard.get(&stranger, &id).await, Err(NoteError::Forbidden(_))));

    let updated = guard
        .update(
            &owner,
            &id,
            UpdateNote {
                title: Some(String::new()),
                is_pinned: Some(false),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.title, "mine");
    assert!(!updated.is_pinned);
    assert_eq!(updated.user.id, owner.id());
    assert_eq!(updated.user.name.as_deref(), Some("Test User"));

    assert_eq!(guard.list(&owner, list(&[("isPinned", "false")])).await?.count, 1);

    guard.delete(&owner, &id).await?;
    assert!(matches!(guard.delete(&owner, &id).await, Err(NoteError::NotFound)));
    Ok(())
}
