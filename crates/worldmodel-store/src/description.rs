//! World object description store.
//!
//! Persists shared object descriptions to the pre-existing
//! `world_object_descriptions` table. A description is referenced by
//! zero or more instances and owns zero or more descriptors.
//!
//! # Storage layout (pre-existing, not created here)
//!
//! | column         | type   | description                                            |
//! |----------------|--------|--------------------------------------------------------|
//! | description_id | bigint | Primary key from `world_object_descriptions_description_id_seq` |
//! | name           | text   | Human-readable object class name                       |
//! | tags           | text[] | Tag array                                              |
//!
//! Descriptions are immutable after insert; there is no update or delete.

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::debug;
use worldmodel_types::{Description, Entity};

use crate::config::DbConfig;
use crate::error::Result;
use crate::sql::{self, TableSpec};

const DESCRIPTIONS: TableSpec = TableSpec {
    table: "world_object_descriptions",
    id_column: "description_id",
    sequence: "world_object_descriptions_description_id_seq",
    columns: &["description_id", "name", "tags"],
    timestamps: &[],
};

const SELECT_COLUMNS: &str = "\"description_id\", \"name\", \"tags\"";

/// PostgreSQL-backed store for the `world_object_descriptions` table.
pub struct DescriptionStore {
    pool: Pool,
}

impl DescriptionStore {
    /// Build a pool from `config` and verify the database is reachable.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let pool = config.create_pool()?;
        let client = pool.get().await?;
        client.query_one("SELECT 1", &[]).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (shared with other stores).
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    /// Insert a description and return its sequence-assigned id. Any
    /// caller-supplied `description_id` is discarded.
    pub async fn insert(&self, entity: &Entity) -> Result<i64> {
        let stmt = sql::insert_statement(&DESCRIPTIONS, entity)?;
        let client = self.pool.get().await?;
        let row = client.query_one(&stmt.sql, &stmt.params).await?;
        let description_id: i64 = row.get(0);
        debug!(description_id, "inserted description");
        Ok(description_id)
    }

    /// Return the description with the given id, or `None` if no such
    /// row exists.
    pub async fn search_description_id(&self, description_id: i64) -> Result<Option<Description>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM world_object_descriptions \
                     WHERE \"description_id\" = $1"
                ),
                &[&description_id],
            )
            .await?;
        row.as_ref().map(decode_description).transpose()
    }

    /// Return every description whose tag array contains *all* of the
    /// requested tags. An empty tag list returns an empty result without
    /// touching the database.
    pub async fn search_tags(&self, tags: &[String]) -> Result<Vec<Description>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let tags = tags.to_vec();
        let client = self.pool.get().await?;
        let rows = client
            .query(&sql::tags_query(&DESCRIPTIONS, SELECT_COLUMNS), &[&tags])
            .await?;
        rows.iter().map(decode_description).collect()
    }
}

fn decode_description(row: &Row) -> Result<Description> {
    Ok(Description {
        description_id: row.try_get("description_id")?,
        name: row.try_get("name")?,
        tags: row
            .try_get::<_, Option<Vec<String>>>("tags")?
            .unwrap_or_default(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_statement_matches_description_schema() {
        let mut e = Entity::new();
        e.set("name", "chair");
        e.set("tags", vec!["furniture".to_string(), "red".to_string()]);

        let stmt = sql::insert_statement(&DESCRIPTIONS, &e).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO world_object_descriptions (\"description_id\", \"name\", \"tags\") \
             VALUES (nextval('world_object_descriptions_description_id_seq'), $1, $2) \
             RETURNING \"description_id\""
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[tokio::test]
    async fn empty_tag_search_skips_the_database() {
        // Pool construction is lazy, so this store has no live
        // connection behind it; an empty search must still succeed.
        let pool = DbConfig::default().create_pool().unwrap();
        let store = DescriptionStore::from_pool(pool);
        let found = store.search_tags(&[]).await.unwrap();
        assert!(found.is_empty());
    }
}
