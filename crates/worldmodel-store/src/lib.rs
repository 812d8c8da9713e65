//! `worldmodel-store` – PostgreSQL persistence for the robot world model.
//!
//! Persists the three world model record kinds to a pre-existing
//! PostgreSQL schema and reads them back as the typed records from
//! [`worldmodel_types`]. All writes go through a dynamic statement
//! builder that maps an [`Entity`][worldmodel_types::Entity] field map
//! onto a parameterized `INSERT`/`UPDATE`, with identity columns assigned
//! from the table's sequence and binary payloads offloaded to
//! large-object storage.
//!
//! # Modules
//!
//! - [`config`] – [`DbConfig`][config::DbConfig]: connection parameters
//!   and pool construction.
//! - [`descriptor`] – [`DescriptorStore`][descriptor::DescriptorStore]:
//!   perception descriptors with large-object payload offload.
//! - [`description`] – [`DescriptionStore`][description::DescriptionStore]:
//!   shared object descriptions with id and tag lookup.
//! - [`instance`] – [`InstanceStore`][instance::InstanceStore]: live
//!   object instances with update, delete, and tag lookup.
//! - [`error`] – [`WorldModelError`][error::WorldModelError].
//!
//! Each store borrows a connection from a shared [`deadpool_postgres`]
//! pool for the duration of one operation; independent operations run
//! concurrently. Every operation is scoped to a single implicit or
//! explicit transaction, so an error mid-operation rolls the whole
//! operation back.

pub mod config;
pub mod description;
pub mod descriptor;
pub mod error;
pub mod instance;

mod sql;

pub use error::{Result, WorldModelError};
