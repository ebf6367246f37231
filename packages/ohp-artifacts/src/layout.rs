//! Deterministic on-disk artifact placement and atomic, hash-verified
//! writes. Grounded in the "write-temp-then-rename" idiom used throughout
//! the pack's storage code for crash-safe file replacement.

use std::path::{Path, PathBuf};

use ohp_store::{Artifact, ArtifactKind};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{ArtifactError, Result};

/// Builds the deterministic path for an artifact under `output_root`, per
/// the layout table:
///
/// ```text
/// output/{id}/{id}.transcript.txt
/// output/{id}/{id}.transcript.srt
/// output/{id}/{id}.{target}.txt
/// output/{id}/{id}.{target}.srt
/// output/{id}/{id}.{target}.evaluation.json
/// ```
pub fn artifact_path(
    output_root: &Path,
    file_id: Uuid,
    kind: ArtifactKind,
    target_lang: Option<&str>,
) -> PathBuf {
    let dir = output_root.join(file_id.to_string());
    let file_name = match (kind, target_lang) {
        (ArtifactKind::TranscriptText, _) => format!("{file_id}.transcript.txt"),
        (ArtifactKind::TranscriptSrt, _) => format!("{file_id}.transcript.srt"),
        (ArtifactKind::TranslationText, Some(lang)) => format!("{file_id}.{lang}.txt"),
        (ArtifactKind::TranslationSrt, Some(lang)) => format!("{file_id}.{lang}.srt"),
        (ArtifactKind::EvaluationReport, Some(lang)) => format!("{file_id}.{lang}.evaluation.json"),
        (kind, None) => panic!("artifact kind {kind:?} requires a target language"),
    };
    dir.join(file_name)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Writes `bytes` to `path` atomically: writes to a sibling temp file in the
/// same directory, then renames over the destination (atomic on POSIX
/// filesystems, and avoids readers ever observing a partially-written
/// file). Returns the resulting `Artifact` record, ready for
/// `Store::put_artifact`.
pub async fn write_artifact(
    path: &Path,
    file_id: Uuid,
    stage: ohp_store::Stage,
    kind: ArtifactKind,
    bytes: &[u8],
) -> Result<Artifact> {
    let dir = path.parent().expect("artifact path always has a parent directory");
    tokio::fs::create_dir_all(dir).await.map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let tmp_path = dir.join(format!(
        ".{}.tmp",
        path.file_name().unwrap().to_string_lossy()
    ));
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|source| ArtifactError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let sha256 = sha256_hex(bytes);
    verify_artifact(path, &sha256).await?;

    Ok(Artifact {
        file_id,
        stage,
        kind,
        path: path.display().to_string(),
        sha256,
        byte_size: bytes.len() as u64,
    })
}

/// Reads `path` back and confirms its hash matches `expected_sha256`. Used
/// both by `write_artifact`'s own post-write check and by the scheduler on
/// resume, to confirm a previously completed artifact hasn't been tampered
/// with or lost out from under a durable `completed` status.
pub async fn verify_artifact(path: &Path, expected_sha256: &str) -> Result<()> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let actual = sha256_hex(&bytes);
    if actual != expected_sha256 {
        return Err(ArtifactError::HashMismatch {
            path: path.display().to_string(),
            expected: expected_sha256.to_string(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohp_store::Stage;

    #[test]
    fn transcript_paths_have_no_target_language() {
        let root = PathBuf::from("output");
        let id = Uuid::new_v4();
        let path = artifact_path(&root, id, ArtifactKind::TranscriptSrt, None);
        assert_eq!(path, root.join(id.to_string()).join(format!("{id}.transcript.srt")));
    }

    #[test]
    fn translation_paths_include_target_language() {
        let root = PathBuf::from("output");
        let id = Uuid::new_v4();
        let path = artifact_path(&root, id, ArtifactKind::EvaluationReport, Some("he"));
        assert_eq!(
            path,
            root.join(id.to_string()).join(format!("{id}.he.evaluation.json"))
        );
    }

    #[tokio::test]
    async fn write_then_verify_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let path = dir.path().join(format!("{id}.transcript.txt"));
        let artifact = write_artifact(
            &path,
            id,
            Stage::Transcription,
            ArtifactKind::TranscriptText,
            b"Guten Tag.\n",
        )
        .await
        .unwrap();

        assert_eq!(artifact.byte_size, 11);
        verify_artifact(&path, &artifact.sha256).await.unwrap();
    }

    #[tokio::test]
    async fn verify_detects_tampering() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let path = dir.path().join(format!("{id}.transcript.txt"));
        write_artifact(&path, id, Stage::Transcription, ArtifactKind::TranscriptText, b"hello")
            .await
            .unwrap();

        tokio::fs::write(&path, b"tampered").await.unwrap();
        let err = verify_artifact(&path, &sha256_hex(b"hello")).await;
        assert!(matches!(err, Err(ArtifactError::HashMismatch { .. })));
    }
}
