//! Capability interfaces, each `#[async_trait] Send + Sync` and held behind
//! `Arc<dyn Trait>` — the same shape as `StageHandler` in `pipeline.rs` and
//! `CodeSnapshotStore` in `codegraph-storage`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EvaluationReport, ProviderSegment, TranscriptionHints, TranslatedSegment};

#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Human-readable identifier used in routing config and diagnostics.
    fn id(&self) -> &str;

    async fn transcribe(
        &self,
        media_path: &str,
        hints: &TranscriptionHints,
    ) -> Result<Vec<ProviderSegment>>;
}

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Must preserve segment count and ordering; implementations that
    /// cannot should return `ProviderError::AlignmentMismatch` rather than
    /// padding or truncating.
    async fn translate(
        &self,
        segments: &[ProviderSegment],
        target_lang: &str,
    ) -> Result<Vec<TranslatedSegment>>;
}

#[async_trait]
pub trait EvaluationProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn score(
        &self,
        source_segments: &[ProviderSegment],
        translated_segments: &[TranslatedSegment],
        target_lang: &str,
    ) -> Result<EvaluationReport>;
}
