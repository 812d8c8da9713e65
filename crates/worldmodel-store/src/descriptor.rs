//! Perception descriptor store.
//!
//! Persists descriptor rows to the pre-existing `descriptors` table. A
//! descriptor is a single piece of perception data (point cloud, image,
//! mesh, …) owned by one world object description; its binary payload is
//! offloaded to PostgreSQL large-object storage and only the object
//! reference is stored in the row.
//!
//! # Storage layout (pre-existing, not created here)
//!
//! | column         | type   | description                                  |
//! |----------------|--------|----------------------------------------------|
//! | descriptor_id  | bigint | Primary key from `descriptors_descriptor_id_seq` |
//! | description_id | bigint | Owning world object description              |
//! | type           | text   | Payload kind (e.g. `"pointcloud"`)           |
//! | data           | oid    | Large-object reference (NULL when absent)    |
//! | ref            | text   | External reference label                     |
//! | tags           | text[] | Tag array                                    |
//!
//! Descriptors are immutable after insert; there is no update or delete.

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::debug;
use worldmodel_types::{Descriptor, Entity, FieldValue};

use crate::config::DbConfig;
use crate::error::Result;
use crate::sql::{self, TableSpec};

const DESCRIPTORS: TableSpec = TableSpec {
    table: "descriptors",
    id_column: "descriptor_id",
    sequence: "descriptors_descriptor_id_seq",
    columns: &["descriptor_id", "description_id", "type", "data", "ref", "tags"],
    timestamps: &[],
};

const SELECT_COLUMNS: &str =
    "\"descriptor_id\", \"description_id\", \"type\", \"data\", \"ref\", \"tags\"";

/// PostgreSQL-backed store for the `descriptors` table.
pub struct DescriptorStore {
    pool: Pool,
}

impl DescriptorStore {
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

    /// Insert a descriptor and return its sequence-assigned id.
    ///
    /// Any caller-supplied `descriptor_id` is discarded. A `data` field
    /// holding raw bytes is first written to large-object storage and
    /// replaced by the new object's reference; the large-object write
    /// and the row insert share one transaction, so a failure in either
    /// rolls both back.
    pub async fn insert(&self, entity: &Entity) -> Result<i64> {
        let mut fields = entity.clone();

        let payload = match fields.get("data") {
            Some(FieldValue::Bytes(bytes)) => Some(bytes.clone()),
            _ => None,
        };

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        if let Some(bytes) = payload {
            let row = tx
                .query_one("SELECT lo_from_bytea(0, $1)", &[&bytes])
                .await?;
            let oid: u32 = row.get(0);
            fields.set("data", FieldValue::Oid(oid));
        }

        let stmt = sql::insert_statement(&DESCRIPTORS, &fields)?;
        let row = tx.query_one(&stmt.sql, &stmt.params).await?;
        let descriptor_id: i64 = row.get(0);
        tx.commit().await?;

        debug!(descriptor_id, "inserted descriptor");
        Ok(descriptor_id)
    }

    /// Return every descriptor owned by `description_id`, resolving each
    /// row's large-object reference back into its full byte content.
    /// The list is empty when the description has no descriptors.
    pub async fn search_by_description_id(&self, description_id: i64) -> Result<Vec<Descriptor>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM descriptors WHERE \"description_id\" = $1"
                ),
                &[&description_id],
            )
            .await?;

        let mut descriptors = Vec::with_capacity(rows.len());
        for row in rows {
            let data = match row.try_get::<_, Option<u32>>("data")? {
                Some(oid) => {
                    let payload = client.query_one("SELECT lo_get($1)", &[&oid]).await?;
                    Some(payload.get::<_, Vec<u8>>(0))
                }
                None => None,
            };
            descriptors.push(decode_descriptor(&row, data)?);
        }
        Ok(descriptors)
    }
}

fn decode_descriptor(row: &Row, data: Option<Vec<u8>>) -> Result<Descriptor> {
    Ok(Descriptor {
        descriptor_id: row.try_get("descriptor_id")?,
        description_id: row.try_get("description_id")?,
        descriptor_type: row.try_get("type")?,
        data,
        reference: row.try_get("ref")?,
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

    // Statement-level tests; live round trips are covered by the
    // integration suite in `tests/live_postgres.rs`.

    #[test]
    fn insert_statement_covers_all_descriptor_columns() {
        let mut e = Entity::new();
        e.set("description_id", 4i64);
        e.set("type", "pointcloud");
        e.set("data", FieldValue::Oid(42));
        e.set("ref", "cloud.pcd");
        e.set("tags", vec!["furniture".to_string()]);

        let stmt = sql::insert_statement(&DESCRIPTORS, &e).unwrap();
        assert!(stmt.sql.starts_with("INSERT INTO descriptors"));
        assert!(stmt.sql.contains("nextval('descriptors_descriptor_id_seq')"));
        assert_eq!(stmt.params.len(), 5);
    }

    #[test]
    fn caller_supplied_id_is_stripped() {
        let mut e = Entity::new();
        e.set("descriptor_id", 123i64);
        e.set("type", "mesh");

        let stmt = sql::insert_statement(&DESCRIPTORS, &e).unwrap();
        assert_eq!(stmt.params.len(), 1);
    }

    #[test]
    fn unknown_descriptor_column_is_rejected() {
        let mut e = Entity::new();
        e.set("payload", "x");
        assert!(sql::insert_statement(&DESCRIPTORS, &e).is_err());
    }
}
