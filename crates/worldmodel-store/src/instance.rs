//! World object instance store.
//!
//! Persists live, mutable object instances to the pre-existing
//! `world_object_instances` table. Instances are the only mutable world
//! model records: they can be updated in place and deleted.
//!
//! # Storage layout (pre-existing, not created here)
//!
//! | column          | type        | description                                    |
//! |-----------------|-------------|------------------------------------------------|
//! | instance_id     | bigint      | Primary key from `world_object_instances_instance_id_seq` |
//! | name            | text        | Instance name                                  |
//! | creation        | timestamptz | First perceived                                |
//! | update          | timestamptz | Last updated                                   |
//! | expected_ttl    | double precision | Expected time-to-live in seconds          |
//! | perceived_end   | timestamptz | Last perceived                                 |
//! | source_origin   | text        | Perception source (e.g. sensor frame)          |
//! | source_creator  | text        | Producing component                            |
//! | pose_seq        | bigint      | Pose header sequence number                    |
//! | pose_stamp      | timestamptz | Pose header stamp                              |
//! | pose_frame_id   | text        | Pose reference frame                           |
//! | pose_position   | jsonb       | Position vector                                |
//! | pose_orientation| jsonb       | Orientation quaternion                         |
//! | pose_covariance | jsonb       | 6×6 covariance matrix                          |
//! | description_id  | bigint      | Realized world object description              |
//! | properties      | jsonb       | Free-form properties                           |
//! | tags            | text[]      | Tag array                                      |
//!
//! Timestamp columns cross the API boundary as Unix epoch seconds
//! (numeric `FieldValue` on write, `Option<f64>` on read); conversion
//! is lossy only to the database's microsecond timestamp precision.

use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::{debug, warn};
use worldmodel_types::{Entity, Instance};

use crate::config::DbConfig;
use crate::error::Result;
use crate::sql::{self, TableSpec};

const INSTANCES: TableSpec = TableSpec {
    table: "world_object_instances",
    id_column: "instance_id",
    sequence: "world_object_instances_instance_id_seq",
    columns: &[
        "instance_id",
        "name",
        "creation",
        "update",
        "expected_ttl",
        "perceived_end",
        "source_origin",
        "source_creator",
        "pose_seq",
        "pose_stamp",
        "pose_frame_id",
        "pose_position",
        "pose_orientation",
        "pose_covariance",
        "description_id",
        "properties",
        "tags",
    ],
    timestamps: &["creation", "update", "perceived_end", "pose_stamp"],
};

const SELECT_COLUMNS: &str = "\"instance_id\", \"name\", \"creation\", \"update\", \
     \"expected_ttl\", \"perceived_end\", \"source_origin\", \"source_creator\", \
     \"pose_seq\", \"pose_stamp\", \"pose_frame_id\", \"pose_position\", \
     \"pose_orientation\", \"pose_covariance\", \"description_id\", \"properties\", \
     \"tags\"";

/// PostgreSQL-backed store for the `world_object_instances` table.
pub struct InstanceStore {
    pool: Pool,
}

impl InstanceStore {
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

    /// Insert an instance and return its sequence-assigned id. Any
    /// caller-supplied `instance_id` is discarded.
    pub async fn insert(&self, entity: &Entity) -> Result<i64> {
        let stmt = sql::insert_statement(&INSTANCES, entity)?;
        let client = self.pool.get().await?;
        let row = client.query_one(&stmt.sql, &stmt.params).await?;
        let instance_id: i64 = row.get(0);
        debug!(instance_id, "inserted instance");
        Ok(instance_id)
    }

    /// Rewrite exactly the supplied columns of the instance with the
    /// given id. Returns `false` without modifying anything when no such
    /// instance exists. Any `instance_id` field inside `entity` is
    /// discarded.
    ///
    /// The existence check and the rewrite share one transaction; there
    /// is no optimistic concurrency check beyond that, so concurrent
    /// updates are last-write-wins per column set.
    pub async fn update_by_instance_id(&self, instance_id: i64, entity: &Entity) -> Result<bool> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let existing = tx
            .query_opt(
                "SELECT \"instance_id\" FROM world_object_instances WHERE \"instance_id\" = $1",
                &[&instance_id],
            )
            .await?;
        if existing.is_none() {
            warn!(instance_id, "update target not found");
            return Ok(false);
        }

        let stmt = sql::update_statement(&INSTANCES, entity)?;
        let mut params = stmt.params;
        params.push(&instance_id);
        tx.execute(&stmt.sql, &params).await?;
        tx.commit().await?;

        debug!(instance_id, "updated instance");
        Ok(true)
    }

    /// Delete the instance with the given id. Deleting an id that does
    /// not exist is a no-op reported as success. Referencing entities
    /// are not checked or cascaded.
    pub async fn delete(&self, instance_id: i64) -> Result<bool> {
        let client = self.pool.get().await?;
        client
            .execute(
                "DELETE FROM world_object_instances WHERE \"instance_id\" = $1",
                &[&instance_id],
            )
            .await?;
        debug!(instance_id, "deleted instance");
        Ok(true)
    }

    /// Return every instance whose tag array contains *all* of the
    /// requested tags. An empty tag list returns an empty result without
    /// touching the database.
    pub async fn search_tags(&self, tags: &[String]) -> Result<Vec<Instance>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let tags = tags.to_vec();
        let client = self.pool.get().await?;
        let rows = client
            .query(&sql::tags_query(&INSTANCES, SELECT_COLUMNS), &[&tags])
            .await?;
        rows.iter().map(decode_instance).collect()
    }
}

/// Decode a timestamp column into epoch seconds, `None` when NULL.
fn epoch_seconds(row: &Row, column: &str) -> Result<Option<f64>> {
    let stamp: Option<DateTime<Utc>> = row.try_get(column)?;
    Ok(stamp.map(|t| t.timestamp_micros() as f64 / 1e6))
}

fn decode_instance(row: &Row) -> Result<Instance> {
    Ok(Instance {
        instance_id: row.try_get("instance_id")?,
        name: row.try_get("name")?,
        creation: epoch_seconds(row, "creation")?,
        update: epoch_seconds(row, "update")?,
        expected_ttl: row.try_get("expected_ttl")?,
        perceived_end: epoch_seconds(row, "perceived_end")?,
        source_origin: row.try_get("source_origin")?,
        source_creator: row.try_get("source_creator")?,
        pose_seq: row.try_get("pose_seq")?,
        pose_stamp: epoch_seconds(row, "pose_stamp")?,
        pose_frame_id: row.try_get("pose_frame_id")?,
        pose_position: row.try_get("pose_position")?,
        pose_orientation: row.try_get("pose_orientation")?,
        pose_covariance: row.try_get("pose_covariance")?,
        description_id: row.try_get("description_id")?,
        properties: row.try_get("properties")?,
        tags: row
            .try_get::<_, Option<Vec<String>>>("tags")?
            .unwrap_or_default(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
