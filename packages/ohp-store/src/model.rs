//! Domain model for the Store: File, Stage, StageStatus, Lease, Artifact.
//!
//! Segments are never embedded in `File` — per the cyclic-reference design
//! note, they are addressed by `(file_id, ordinal)` through the Store
//! instead of held in an in-memory object graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of media a `File` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, crate::StorageError> {
        match s {
            "audio" => Ok(MediaKind::Audio),
            "video" => Ok(MediaKind::Video),
            other => Err(crate::StorageError::serialization(format!(
                "invalid media kind: {other}"
            ))),
        }
    }
}

/// A processable media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: Uuid,
    pub source_path: String,
    pub kind: MediaKind,
    pub byte_size: u64,
    pub duration_ms: Option<u64>,
    pub source_language: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The seven pipeline stages. Closed enum, mirrors the `StageId` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transcription,
    TranslationEn,
    TranslationDe,
    TranslationHe,
    EvaluationEn,
    EvaluationDe,
    EvaluationHe,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Transcription,
        Stage::TranslationEn,
        Stage::TranslationDe,
        Stage::TranslationHe,
        Stage::EvaluationEn,
        Stage::EvaluationDe,
        Stage::EvaluationHe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Transcription => "transcription",
            Stage::TranslationEn => "translation_en",
            Stage::TranslationDe => "translation_de",
            Stage::TranslationHe => "translation_he",
            Stage::EvaluationEn => "evaluation_en",
            Stage::EvaluationDe => "evaluation_de",
            Stage::EvaluationHe => "evaluation_he",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, crate::StorageError> {
        match s {
            "transcription" => Ok(Stage::Transcription),
            "translation_en" => Ok(Stage::TranslationEn),
            "translation_de" => Ok(Stage::TranslationDe),
            "translation_he" => Ok(Stage::TranslationHe),
            "evaluation_en" => Ok(Stage::EvaluationEn),
            "evaluation_de" => Ok(Stage::EvaluationDe),
            "evaluation_he" => Ok(Stage::EvaluationHe),
            other => Err(crate::StorageError::serialization(format!(
                "invalid stage: {other}"
            ))),
        }
    }

    /// Target language for translation/evaluation stages, if any.
    pub fn target_language(&self) -> Option<&'static str> {
        match self {
            Stage::TranslationEn | Stage::EvaluationEn => Some("en"),
            Stage::TranslationDe | Stage::EvaluationDe => Some("de"),
            Stage::TranslationHe | Stage::EvaluationHe => Some("he"),
            Stage::Transcription => None,
        }
    }

    /// The stage that must be `completed`/`qa_completed` before this one may
    /// start, per the §3 prerequisite invariants. `None` for transcription.
    pub fn prerequisite(&self) -> Option<Stage> {
        match self {
            Stage::Transcription => None,
            Stage::TranslationEn => Some(Stage::Transcription),
            Stage::TranslationDe => Some(Stage::Transcription),
            Stage::TranslationHe => Some(Stage::Transcription),
            Stage::EvaluationEn => Some(Stage::TranslationEn),
            Stage::EvaluationDe => Some(Stage::TranslationDe),
            Stage::EvaluationHe => Some(Stage::TranslationHe),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status value of a (File, Stage) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatusValue {
    NotStarted,
    InProgress,
    Completed,
    QaCompleted,
    QaFailed,
    Failed,
}

impl StageStatusValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatusValue::NotStarted => "not_started",
            StageStatusValue::InProgress => "in_progress",
            StageStatusValue::Completed => "completed",
            StageStatusValue::QaCompleted => "qa_completed",
            StageStatusValue::QaFailed => "qa_failed",
            StageStatusValue::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, crate::StorageError> {
        match s {
            "not_started" => Ok(StageStatusValue::NotStarted),
            "in_progress" => Ok(StageStatusValue::InProgress),
            "completed" => Ok(StageStatusValue::Completed),
            "qa_completed" => Ok(StageStatusValue::QaCompleted),
            "qa_failed" => Ok(StageStatusValue::QaFailed),
            "failed" => Ok(StageStatusValue::Failed),
            other => Err(crate::StorageError::serialization(format!(
                "invalid stage status: {other}"
            ))),
        }
    }

    /// Whether this status satisfies a downstream stage's prerequisite
    /// (§3: "completed or qa_completed").
    pub fn satisfies_prerequisite(&self) -> bool {
        matches!(self, StageStatusValue::Completed | StageStatusValue::QaCompleted)
    }
}

impl std::fmt::Display for StageStatusValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A (File, Stage) row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageStatus {
    pub file_id: Uuid,
    pub stage: Stage,
    pub status: StageStatusValue,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub attempt_count: u32,
    pub last_error_kind: Option<String>,
    pub last_error_detail: Option<String>,
    pub lease_owner: Option<String>,
    pub lease_acquired_at: Option<DateTime<Utc>>,
    pub lease_deadline: Option<DateTime<Utc>>,
}

impl StageStatus {
    pub fn has_live_lease(&self, now: DateTime<Utc>) -> bool {
        self.status == StageStatusValue::InProgress
            && self.lease_deadline.map(|d| d > now).unwrap_or(false)
    }
}

/// Kind of on-disk artifact, per §6's layout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    TranscriptText,
    TranscriptSrt,
    TranslationText,
    TranslationSrt,
    EvaluationReport,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::TranscriptText => "transcript_text",
            ArtifactKind::TranscriptSrt => "transcript_srt",
            ArtifactKind::TranslationText => "translation_text",
            ArtifactKind::TranslationSrt => "translation_srt",
            ArtifactKind::EvaluationReport => "evaluation_report",
        }
    }
}

/// A materialized on-disk artifact owned by a (File, Stage) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub file_id: Uuid,
    pub stage: Stage,
    pub kind: ArtifactKind,
    pub path: String,
    pub sha256: String,
    pub byte_size: u64,
}

/// A timecoded utterance-sized unit of a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub file_id: Uuid,
    pub ordinal: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub source_text: String,
    pub source_language: Option<String>,
    pub non_verbal: bool,
    pub overlapping: bool,
    /// Translated text per target language code ("en", "de", "he").
    pub translations: std::collections::BTreeMap<String, String>,
}

impl Segment {
    pub fn is_translated(&self, lang: &str) -> bool {
        self.translations.contains_key(lang)
    }
}

/// A transient exclusive claim on a (File, Stage) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

/// The outcome of a successful `claim`.
#[derive(Debug, Clone)]
pub struct Claimed {
    pub file_id: Uuid,
    pub status: StageStatus,
}

/// Aggregate counts by status per stage, for monitoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// stage -> status -> count
    pub counts: std::collections::BTreeMap<String, std::collections::BTreeMap<String, u64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_str(stage.as_str()).unwrap(), stage);
        }
    }

    #[test]
    fn stage_status_roundtrip() {
        for status in [
            StageStatusValue::NotStarted,
            StageStatusValue::InProgress,
            StageStatusValue::Completed,
            StageStatusValue::QaCompleted,
            StageStatusValue::QaFailed,
            StageStatusValue::Failed,
        ] {
            assert_eq!(StageStatusValue::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn prerequisite_chain() {
        assert_eq!(Stage::Transcription.prerequisite(), None);
        assert_eq!(Stage::TranslationHe.prerequisite(), Some(Stage::Transcription));
        assert_eq!(Stage::EvaluationHe.prerequisite(), Some(Stage::TranslationHe));
    }

    #[test]
    fn satisfies_prerequisite_only_for_completed_variants() {
        assert!(StageStatusValue::Completed.satisfies_prerequisite());
        assert!(StageStatusValue::QaCompleted.satisfies_prerequisite());
        assert!(!StageStatusValue::InProgress.satisfies_prerequisite());
        assert!(!StageStatusValue::Failed.satisfies_prerequisite());
        assert!(!StageStatusValue::QaFailed.satisfies_prerequisite());
    }
}
