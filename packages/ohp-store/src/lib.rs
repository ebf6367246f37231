//! Durable state for the oral-history pipeline orchestrator.
//!
//! Owns the `files` / `stage_status` / `segments` / `artifacts` tables and
//! exposes the `Store` trait workers and the scheduler use to claim,
//! complete, fail, and requeue stage work. Storage failures are treated as
//! fatal to the calling worker — there is no silent state divergence.

mod error;
mod model;
mod schema;
mod store;

pub use error::{Result, StorageError};
pub use model::{
    Artifact, ArtifactKind, Claimed, File, Lease, MediaKind, Segment, Snapshot, Stage,
    StageStatus, StageStatusValue,
};
pub use store::{lease_of, SqliteStore, Store};
