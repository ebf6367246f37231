//! The `Store` port and its SQLite-backed implementation.
//!
//! Modeled on the split between a `CodeSnapshotStore` trait
//! (`codegraph-storage::domain`) and a concrete adapter, generalized from
//! one-shot job/checkpoint storage to the long-lived (File, Stage) status
//! table this pipeline needs. Lease semantics (`claim`/`reclaim_expired_leases`)
//! have no teacher counterpart and are new to this crate.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::model::{
    Artifact, ArtifactKind, Claimed, File, Lease, MediaKind, Segment, Snapshot, Stage,
    StageStatus, StageStatusValue,
};
use crate::schema::init_schema;

/// Durable state for the pipeline: files, per-stage status, segments, and
/// artifact records. All methods are atomic with respect to concurrent
/// callers — `claim` in particular must never hand the same (file, stage)
/// to two owners at once.
#[async_trait]
pub trait Store: Send + Sync {
    async fn register_file(&self, file: File) -> Result<()>;

    async fn get_file(&self, file_id: Uuid) -> Result<File>;

    async fn get_status(&self, file_id: Uuid, stage: Stage) -> Result<StageStatus>;

    /// Atomically find a file whose `stage` is eligible to run (not_started,
    /// or failed below a retry ceiling handled by the caller, or an
    /// expired-lease in_progress row) and mark it in_progress under a lease
    /// owned by `owner_id`, valid until `now + lease_ttl`. Returns `None` if
    /// no eligible row exists.
    async fn claim(
        &self,
        stage: Stage,
        owner_id: &str,
        lease_ttl: Duration,
    ) -> Result<Option<Claimed>>;

    async fn complete(&self, file_id: Uuid, stage: Stage) -> Result<()>;

    async fn fail(
        &self,
        file_id: Uuid,
        stage: Stage,
        error_kind: &str,
        error_detail: &str,
    ) -> Result<()>;

    /// Records a QA verdict for a completed stage: `passed` moves the stage
    /// to `qa_completed`, otherwise to `qa_failed`.
    async fn annotate_qa(&self, file_id: Uuid, stage: Stage, passed: bool) -> Result<()>;

    /// Resets a stage back to `not_started` so it is picked up again,
    /// without touching `attempt_count` (only `claim` increments it).
    async fn requeue(&self, file_id: Uuid, stage: Stage) -> Result<()>;

    /// Sweeps `in_progress` rows whose lease has expired back to
    /// `not_started`, making them eligible for `claim` again. Returns the
    /// number of rows reclaimed.
    async fn reclaim_expired_leases(&self, now: DateTime<Utc>) -> Result<u64>;

    async fn list_segments(&self, file_id: Uuid) -> Result<Vec<Segment>>;

    async fn put_segments(&self, file_id: Uuid, segments: Vec<Segment>) -> Result<()>;

    async fn put_segment_translation(
        &self,
        file_id: Uuid,
        ordinal: u32,
        lang: &str,
        text: &str,
    ) -> Result<()>;

    async fn put_artifact(&self, artifact: Artifact) -> Result<()>;

    async fn get_artifact(&self, file_id: Uuid, stage: Stage, kind: ArtifactKind) -> Result<Artifact>;

    /// Aggregate (stage, status) counts across all files, for the CLI's
    /// status/monitoring surface.
    async fn snapshot(&self) -> Result<Snapshot>;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// A single connection backs the pool: SQLite serializes writers anyway,
    /// and the "single logical sequencer" requirement for `claim` is
    /// easiest to guarantee by never handing out a second connection rather
    /// than fighting SQLITE_BUSY across connections.
    pub async fn connect(db_path: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&format!("sqlite://{db_path}?mode=rwc"))
            .await?;
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_status(row: &sqlx::sqlite::SqliteRow) -> Result<StageStatus> {
    let file_id: String = row.try_get("file_id")?;
    let stage: String = row.try_get("stage")?;
    let status: String = row.try_get("status")?;
    Ok(StageStatus {
        file_id: Uuid::parse_str(&file_id).map_err(StorageError::serialization)?,
        stage: Stage::from_str(&stage)?,
        status: StageStatusValue::from_str(&status)?,
        last_started_at: row.try_get("last_started_at")?,
        last_completed_at: row.try_get("last_completed_at")?,
        attempt_count: row.try_get::<i64, _>("attempt_count")? as u32,
        last_error_kind: row.try_get("last_error_kind")?,
        last_error_detail: row.try_get("last_error_detail")?,
        lease_owner: row.try_get("lease_owner")?,
        lease_acquired_at: row.try_get("lease_acquired_at")?,
        lease_deadline: row.try_get("lease_deadline")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn register_file(&self, file: File) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO files
                (id, source_path, kind, byte_size, duration_ms, source_language, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(file.id.to_string())
        .bind(&file.source_path)
        .bind(file.kind.as_str())
        .bind(file.byte_size as i64)
        .bind(file.duration_ms.map(|d| d as i64))
        .bind(&file.source_language)
        .bind(file.created_at)
        .execute(&mut *tx)
        .await?;

        for stage in Stage::ALL {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO stage_status (file_id, stage, status, attempt_count)
                VALUES (?, ?, 'not_started', 0)
                "#,
            )
            .bind(file.id.to_string())
            .bind(stage.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_file(&self, file_id: Uuid) -> Result<File> {
        let row = sqlx::query("SELECT * FROM files WHERE id = ?")
            .bind(file_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::FileNotFound(file_id))?;

        let kind: String = row.try_get("kind")?;
        Ok(File {
            id: file_id,
            source_path: row.try_get("source_path")?,
            kind: MediaKind::from_str(&kind)?,
            byte_size: row.try_get::<i64, _>("byte_size")? as u64,
            duration_ms: row.try_get::<Option<i64>, _>("duration_ms")?.map(|d| d as u64),
            source_language: row.try_get("source_language")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn get_status(&self, file_id: Uuid, stage: Stage) -> Result<StageStatus> {
        let row = sqlx::query("SELECT * FROM stage_status WHERE file_id = ? AND stage = ?")
            .bind(file_id.to_string())
            .bind(stage.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::StatusNotFound {
                file_id,
                stage: stage.to_string(),
            })?;
        row_to_status(&row)
    }

    async fn claim(
        &self,
        stage: Stage,
        owner_id: &str,
        lease_ttl: Duration,
    ) -> Result<Option<Claimed>> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Eligible rows: not_started, or in_progress with an expired lease.
        // Prerequisite (completed/qa_completed on the parent stage) is
        // checked per-candidate since SQLite has no cross-row join on a
        // self-referencing key without naming the prerequisite stage text.
        let candidates: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            r#"
            SELECT * FROM stage_status
            WHERE stage = ?
              AND (status = 'not_started'
                   OR (status = 'in_progress' AND lease_deadline IS NOT NULL AND lease_deadline < ?))
            ORDER BY file_id
            "#,
        )
        .bind(stage.as_str())
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        for row in candidates {
            let status = row_to_status(&row)?;

            if let Some(prereq) = stage.prerequisite() {
                let prereq_row = sqlx::query("SELECT status FROM stage_status WHERE file_id = ? AND stage = ?")
                    .bind(status.file_id.to_string())
                    .bind(prereq.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;
                let satisfied = match prereq_row {
                    Some(r) => {
                        let s: String = r.try_get("status")?;
                        StageStatusValue::from_str(&s)?.satisfies_prerequisite()
                    }
                    None => false,
                };
                if !satisfied {
                    continue;
                }
            }

            let deadline = now + lease_ttl;
            let result = sqlx::query(
                r#"
                UPDATE stage_status
                SET status = 'in_progress',
                    last_started_at = ?,
                    attempt_count = attempt_count + 1,
                    lease_owner = ?,
                    lease_acquired_at = ?,
                    lease_deadline = ?
                WHERE file_id = ? AND stage = ?
                  AND (status = 'not_started'
                       OR (status = 'in_progress' AND lease_deadline IS NOT NULL AND lease_deadline < ?))
                "#,
            )
            .bind(now)
            .bind(owner_id)
            .bind(now)
            .bind(deadline)
            .bind(status.file_id.to_string())
            .bind(stage.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 1 {
                let updated = self::row_to_status(
                    &sqlx::query("SELECT * FROM stage_status WHERE file_id = ? AND stage = ?")
                        .bind(status.file_id.to_string())
                        .bind(stage.as_str())
                        .fetch_one(&mut *tx)
                        .await?,
                )?;
                tx.commit().await?;
                return Ok(Some(Claimed {
                    file_id: status.file_id,
                    status: updated,
                }));
            }
            // Lost a race with another owner on this row; try the next candidate.
        }

        tx.commit().await?;
        Ok(None)
    }

    async fn complete(&self, file_id: Uuid, stage: Stage) -> Result<()> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE stage_status
            SET status = 'completed',
                last_completed_at = ?,
                lease_owner = NULL,
                lease_acquired_at = NULL,
                lease_deadline = NULL
            WHERE file_id = ? AND stage = ?
            "#,
        )
        .bind(now)
        .bind(file_id.to_string())
        .bind(stage.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::StatusNotFound {
                file_id,
                stage: stage.to_string(),
            });
        }
        Ok(())
    }

    async fn fail(
        &self,
        file_id: Uuid,
        stage: Stage,
        error_kind: &str,
        error_detail: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE stage_status
            SET status = 'failed',
                last_error_kind = ?,
                last_error_detail = ?,
                lease_owner = NULL,
                lease_acquired_at = NULL,
                lease_deadline = NULL
            WHERE file_id = ? AND stage = ?
            "#,
        )
        .bind(error_kind)
        .bind(error_detail)
        .bind(file_id.to_string())
        .bind(stage.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::StatusNotFound {
                file_id,
                stage: stage.to_string(),
            });
        }
        Ok(())
    }

    async fn annotate_qa(&self, file_id: Uuid, stage: Stage, passed: bool) -> Result<()> {
        let new_status = if passed {
            StageStatusValue::QaCompleted
        } else {
            StageStatusValue::QaFailed
        };

        let result = sqlx::query(
            r#"
            UPDATE stage_status
            SET status = ?
            WHERE file_id = ? AND stage = ? AND status = 'completed'
            "#,
        )
        .bind(new_status.as_str())
        .bind(file_id.to_string())
        .bind(stage.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_status(file_id, stage).await?;
            return Err(StorageError::InvalidTransition {
                stage: stage.to_string(),
                from: current.status.to_string(),
                to: new_status.to_string(),
            });
        }
        Ok(())
    }

    async fn requeue(&self, file_id: Uuid, stage: Stage) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE stage_status
            SET status = 'not_started',
                lease_owner = NULL,
                lease_acquired_at = NULL,
                lease_deadline = NULL
            WHERE file_id = ? AND stage = ?
            "#,
        )
        .bind(file_id.to_string())
        .bind(stage.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::StatusNotFound {
                file_id,
                stage: stage.to_string(),
            });
        }
        Ok(())
    }

    async fn reclaim_expired_leases(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE stage_status
            SET status = 'not_started',
                lease_owner = NULL,
                lease_acquired_at = NULL,
                lease_deadline = NULL
            WHERE status = 'in_progress' AND lease_deadline IS NOT NULL AND lease_deadline < ?
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        let reclaimed = result.rows_affected();
        if reclaimed > 0 {
            tracing::warn!(count = reclaimed, "reclaimed expired stage leases");
        }
        Ok(reclaimed)
    }

    async fn list_segments(&self, file_id: Uuid) -> Result<Vec<Segment>> {
        let rows = sqlx::query("SELECT * FROM segments WHERE file_id = ? ORDER BY ordinal")
            .bind(file_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let translations_json: String = row.try_get("translations")?;
                let translations: BTreeMap<String, String> =
                    serde_json::from_str(&translations_json).map_err(StorageError::serialization)?;
                Ok(Segment {
                    file_id,
                    ordinal: row.try_get::<i64, _>("ordinal")? as u32,
                    start_ms: row.try_get::<i64, _>("start_ms")? as u64,
                    end_ms: row.try_get::<i64, _>("end_ms")? as u64,
                    source_text: row.try_get("source_text")?,
                    source_language: row.try_get("source_language")?,
                    non_verbal: row.try_get::<i64, _>("non_verbal")? != 0,
                    overlapping: row.try_get::<i64, _>("overlapping")? != 0,
                    translations,
                })
            })
            .collect()
    }

    async fn put_segments(&self, file_id: Uuid, segments: Vec<Segment>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for seg in segments {
            let translations_json =
                serde_json::to_string(&seg.translations).map_err(StorageError::serialization)?;
            sqlx::query(
                r#"
                INSERT INTO segments
                    (file_id, ordinal, start_ms, end_ms, source_text, source_language,
                     non_verbal, overlapping, translations)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (file_id, ordinal) DO UPDATE SET
                    start_ms = excluded.start_ms,
                    end_ms = excluded.end_ms,
                    source_text = excluded.source_text,
                    source_language = excluded.source_language,
                    non_verbal = excluded.non_verbal,
                    overlapping = excluded.overlapping,
                    translations = excluded.translations
                "#,
            )
            .bind(file_id.to_string())
            .bind(seg.ordinal as i64)
            .bind(seg.start_ms as i64)
            .bind(seg.end_ms as i64)
            .bind(&seg.source_text)
            .bind(&seg.source_language)
            .bind(seg.non_verbal as i64)
            .bind(seg.overlapping as i64)
            .bind(translations_json)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn put_segment_translation(
        &self,
        file_id: Uuid,
        ordinal: u32,
        lang: &str,
        text: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT translations FROM segments WHERE file_id = ? AND ordinal = ?")
            .bind(file_id.to_string())
            .bind(ordinal as i64)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                StorageError::serialization(format!(
                    "no segment {ordinal} for file {file_id} to translate"
                ))
            })?;

        let translations_json: String = row.try_get("translations")?;
        let mut translations: BTreeMap<String, String> =
            serde_json::from_str(&translations_json).map_err(StorageError::serialization)?;
        translations.insert(lang.to_string(), text.to_string());
        let updated_json = serde_json::to_string(&translations).map_err(StorageError::serialization)?;

        sqlx::query("UPDATE segments SET translations = ? WHERE file_id = ? AND ordinal = ?")
            .bind(updated_json)
            .bind(file_id.to_string())
            .bind(ordinal as i64)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn put_artifact(&self, artifact: Artifact) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO artifacts (file_id, stage, kind, path, sha256, byte_size)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (file_id, stage, kind) DO UPDATE SET
                path = excluded.path,
                sha256 = excluded.sha256,
                byte_size = excluded.byte_size
            "#,
        )
        .bind(artifact.file_id.to_string())
        .bind(artifact.stage.as_str())
        .bind(artifact.kind.as_str())
        .bind(&artifact.path)
        .bind(&artifact.sha256)
        .bind(artifact.byte_size as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_artifact(&self, file_id: Uuid, stage: Stage, kind: ArtifactKind) -> Result<Artifact> {
        let row = sqlx::query("SELECT * FROM artifacts WHERE file_id = ? AND stage = ? AND kind = ?")
            .bind(file_id.to_string())
            .bind(stage.as_str())
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                StorageError::serialization(format!(
                    "no artifact {:?} for file {file_id} stage {stage}",
                    kind
                ))
            })?;

        Ok(Artifact {
            file_id,
            stage,
            kind,
            path: row.try_get("path")?,
            sha256: row.try_get("sha256")?,
            byte_size: row.try_get::<i64, _>("byte_size")? as u64,
        })
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let rows = sqlx::query("SELECT stage, status, COUNT(*) as n FROM stage_status GROUP BY stage, status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        for row in rows {
            let stage: String = row.try_get("stage")?;
            let status: String = row.try_get("status")?;
            let n: i64 = row.try_get("n")?;
            counts.entry(stage).or_default().insert(status, n as u64);
        }
        Ok(Snapshot { counts })
    }
}

/// Not part of the trait: a convenience for building a `Lease` view from a
/// claimed status row, used by scheduler-side logging.
pub fn lease_of(status: &StageStatus) -> Option<Lease> {
    match (status.lease_owner.clone(), status.lease_acquired_at, status.lease_deadline) {
        (Some(owner), Some(acquired_at), Some(deadline)) => Some(Lease {
            owner,
            acquired_at,
            deadline,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn new_test_store() -> SqliteStore {
        SqliteStore::connect_in_memory().await.unwrap()
    }

    fn sample_file() -> File {
        File {
            id: Uuid::new_v4(),
            source_path: "/media/interview-001.wav".to_string(),
            kind: MediaKind::Audio,
            byte_size: 1024,
            duration_ms: Some(60_000),
            source_language: Some("de".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn register_file_seeds_all_stages_not_started() {
        let store = new_test_store().await;
        let file = sample_file();
        store.register_file(file.clone()).await.unwrap();

        for stage in Stage::ALL {
            let status = store.get_status(file.id, stage).await.unwrap();
            assert_eq!(status.status, StageStatusValue::NotStarted);
            assert_eq!(status.attempt_count, 0);
        }
    }

    #[tokio::test]
    async fn claim_respects_prerequisite() {
        let store = new_test_store().await;
        let file = sample_file();
        store.register_file(file.clone()).await.unwrap();

        // translation_en has an unmet prerequisite (transcription not done).
        let claimed = store
            .claim(Stage::TranslationEn, "worker-1", Duration::seconds(60))
            .await
            .unwrap();
        assert!(claimed.is_none());

        let claimed = store
            .claim(Stage::Transcription, "worker-1", Duration::seconds(60))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.file_id, file.id);
        store.complete(file.id, Stage::Transcription).await.unwrap();

        let claimed = store
            .claim(Stage::TranslationEn, "worker-1", Duration::seconds(60))
            .await
            .unwrap();
        assert!(claimed.is_some());
    }

    #[tokio::test]
    async fn claim_is_exclusive_and_increments_attempt_count() {
        let store = new_test_store().await;
        let file = sample_file();
        store.register_file(file.clone()).await.unwrap();

        let first = store
            .claim(Stage::Transcription, "worker-a", Duration::seconds(60))
            .await
            .unwrap();
        assert!(first.is_some());
        assert_eq!(first.unwrap().status.attempt_count, 1);

        let second = store
            .claim(Stage::Transcription, "worker-b", Duration::seconds(60))
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn expired_lease_is_reclaimed_and_reclaimable() {
        let store = new_test_store().await;
        let file = sample_file();
        store.register_file(file.clone()).await.unwrap();

        store
            .claim(Stage::Transcription, "worker-a", Duration::seconds(-1))
            .await
            .unwrap();

        let reclaimed = store.reclaim_expired_leases(Utc::now()).await.unwrap();
        assert_eq!(reclaimed, 1);

        let status = store.get_status(file.id, Stage::Transcription).await.unwrap();
        assert_eq!(status.status, StageStatusValue::NotStarted);
    }

    #[tokio::test]
    async fn fail_then_requeue_does_not_reset_attempt_count() {
        let store = new_test_store().await;
        let file = sample_file();
        store.register_file(file.clone()).await.unwrap();

        store
            .claim(Stage::Transcription, "worker-a", Duration::seconds(60))
            .await
            .unwrap();
        store
            .fail(file.id, Stage::Transcription, "provider_transient", "timeout")
            .await
            .unwrap();
        store.requeue(file.id, Stage::Transcription).await.unwrap();

        let status = store.get_status(file.id, Stage::Transcription).await.unwrap();
        assert_eq!(status.status, StageStatusValue::NotStarted);
        assert_eq!(status.attempt_count, 1);
    }

    #[tokio::test]
    async fn annotate_qa_requires_completed_status() {
        let store = new_test_store().await;
        let file = sample_file();
        store.register_file(file.clone()).await.unwrap();

        let err = store.annotate_qa(file.id, Stage::Transcription, true).await;
        assert!(err.is_err());

        store
            .claim(Stage::Transcription, "worker-a", Duration::seconds(60))
            .await
            .unwrap();
        store.complete(file.id, Stage::Transcription).await.unwrap();
        store.annotate_qa(file.id, Stage::Transcription, true).await.unwrap();

        let status = store.get_status(file.id, Stage::Transcription).await.unwrap();
        assert_eq!(status.status, StageStatusValue::QaCompleted);
    }

    #[tokio::test]
    async fn segments_roundtrip_with_translations() {
        let store = new_test_store().await;
        let file = sample_file();
        store.register_file(file.clone()).await.unwrap();

        let seg = Segment {
            file_id: file.id,
            ordinal: 0,
            start_ms: 0,
            end_ms: 1200,
            source_text: "Guten Tag.".to_string(),
            source_language: Some("de".to_string()),
            non_verbal: false,
            overlapping: false,
            translations: BTreeMap::new(),
        };
        store.put_segments(file.id, vec![seg]).await.unwrap();
        store
            .put_segment_translation(file.id, 0, "en", "Good day.")
            .await
            .unwrap();

        let segments = store.list_segments(file.id).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].translations.get("en").unwrap(), "Good day.");
    }

    #[tokio::test]
    async fn snapshot_counts_by_stage_and_status() {
        let store = new_test_store().await;
        store.register_file(sample_file()).await.unwrap();
        let snapshot = store.snapshot().await.unwrap();
        let transcription_counts = snapshot.counts.get("transcription").unwrap();
        assert_eq!(*transcription_counts.get("not_started").unwrap(), 1);
    }
}
