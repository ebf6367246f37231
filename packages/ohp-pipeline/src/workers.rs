//! Stage worker implementations. Each is a short function from (file_id,
//! claimed StageStatus) to a result, grounded in the `StageHandler` trait
//! (`pipeline.rs`), generalized from "files enumerated from a repo path" to
//! "one claimed (file_id, Stage) work item".
//!
//! Idempotence is structural: translation workers always resume by reading
//! already-written per-segment translations from the Store and only invoke
//! the provider for the suffix lacking a translation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use ohp_artifacts::{artifact_path, write_artifact};
use ohp_providers::{
    EvaluationProvider, ProviderRouting, ProviderSegment, RoutedTranslator, TranscriptionHints,
    TranscriptionProvider, TranslatedSegment,
};
use ohp_segments::{annotate_languages, build_runs, NonVerbalLexicon, SegmentValidator, SubtitleBuilder};
use ohp_store::{Artifact, ArtifactKind, Segment, Stage, Store};

use crate::error::FatalError;

pub type WorkerResult = std::result::Result<(), FatalError>;

#[async_trait]
pub trait StageWorker: Send + Sync {
    fn stage(&self) -> Stage;

    /// Runs the claimed stage for `file_id`. Recoverable failures are
    /// recorded via `Store::fail` and return `Ok(())` so the scheduler
    /// keeps running; only fatal errors (Store failure, hash mismatch)
    /// propagate. A worker that observes cancellation mid-run returns
    /// `Ok(())` without calling `complete`/`fail`, leaving the lease to
    /// expire per §5.
    async fn run(&self, file_id: Uuid, cancel: &CancellationToken) -> WorkerResult;
}

async fn record_failure(
    store: &dyn Store,
    file_id: Uuid,
    stage: Stage,
    error_kind: &str,
    detail: &str,
) -> WorkerResult {
    store.fail(file_id, stage, error_kind, detail).await?;
    Ok(())
}

fn target_language_for_stage(stage: Stage) -> &'static str {
    stage
        .target_language()
        .expect("translation/evaluation stage always has a target language")
}

// --- Transcription -----------------------------------------------------

pub struct TranscriptionWorker {
    pub store: Arc<dyn Store>,
    pub provider: Arc<dyn TranscriptionProvider>,
    pub output_root: PathBuf,
    pub lexicon: NonVerbalLexicon,
}

#[async_trait]
impl StageWorker for TranscriptionWorker {
    fn stage(&self) -> Stage {
        Stage::Transcription
    }

    async fn run(&self, file_id: Uuid, cancel: &CancellationToken) -> WorkerResult {
        if cancel.is_cancelled() {
            return Ok(());
        }

        let file = self.store.get_file(file_id).await?;
        let hints = TranscriptionHints { source_language_hint: file.source_language.clone() };

        let provider_segments = match self.provider.transcribe(&file.source_path, &hints).await {
            Ok(s) => s,
            Err(e) => {
                return record_failure(self.store.as_ref(), file_id, Stage::Transcription, e.error_kind(), &e.to_string()).await;
            }
        };

        if cancel.is_cancelled() {
            return Ok(());
        }

        let mut segments: Vec<Segment> = provider_segments
            .into_iter()
            .map(|s| Segment {
                file_id,
                ordinal: s.ordinal,
                start_ms: s.start_ms,
                end_ms: s.end_ms,
                source_text: s.text,
                source_language: s.language,
                non_verbal: false,
                overlapping: false,
                translations: BTreeMap::new(),
            })
            .collect();

        annotate_languages(&mut segments, &self.lexicon, file.source_language.as_deref());

        if let Err(e) = SegmentValidator::validate(&segments) {
            return record_failure(self.store.as_ref(), file_id, Stage::Transcription, e.error_kind(), &e.to_string()).await;
        }

        self.store.put_segments(file_id, segments.clone()).await?;

        if cancel.is_cancelled() {
            return Ok(());
        }

        let transcript_text = SubtitleBuilder::build_transcript_text(&segments, None);
        let source_lang = file.source_language.clone().unwrap_or_else(|| "und".to_string());
        let srt = SubtitleBuilder::build_srt(&segments, &source_lang);

        let text_path = artifact_path(&self.output_root, file_id, ArtifactKind::TranscriptText, None);
        let text_artifact = write_artifact(&text_path, file_id, Stage::Transcription, ArtifactKind::TranscriptText, transcript_text.as_bytes()).await?;
        self.store.put_artifact(text_artifact).await?;

        let srt_path = artifact_path(&self.output_root, file_id, ArtifactKind::TranscriptSrt, None);
        let srt_artifact = write_artifact(&srt_path, file_id, Stage::Transcription, ArtifactKind::TranscriptSrt, srt.as_bytes()).await?;
        self.store.put_artifact(srt_artifact).await?;

        self.store.complete(file_id, Stage::Transcription).await?;
        Ok(())
    }
}

// --- Translation --------------------------------------------------------

pub struct TranslationWorker {
    pub store: Arc<dyn Store>,
    pub output_root: PathBuf,
    pub stage: Stage,
    pub routing: Arc<ProviderRouting>,
    pub batch_max_segments: usize,
}

#[async_trait]
impl StageWorker for TranslationWorker {
    fn stage(&self) -> Stage {
        self.stage
    }

    async fn run(&self, file_id: Uuid, cancel: &CancellationToken) -> WorkerResult {
        if cancel.is_cancelled() {
            return Ok(());
        }

        let target_lang = target_language_for_stage(self.stage);
        let mut segments = self.store.list_segments(file_id).await?;

        // Resumption: only segments still lacking a translation for this
        // target, and not already in the target language, need a run.
        let pending: Vec<Segment> = segments
            .iter()
            .filter(|s| !s.non_verbal && s.source_language.as_deref() != Some(target_lang) && !s.is_translated(target_lang))
            .cloned()
            .collect();

        let runs = build_runs(&pending, self.batch_max_segments);
        let translator = RoutedTranslator::new(&self.routing);

        for run in runs {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let provider_segments: Vec<ProviderSegment> = run
                .ordinals
                .iter()
                .filter_map(|ord| segments.iter().find(|s| s.ordinal == *ord))
                .map(|s| ProviderSegment {
                    ordinal: s.ordinal,
                    start_ms: s.start_ms,
                    end_ms: s.end_ms,
                    text: s.source_text.clone(),
                    language: s.source_language.clone(),
                })
                .collect();

            let translated: Vec<TranslatedSegment> = match translator.translate_run(&provider_segments, target_lang).await {
                Ok(t) => t,
                Err(e) => {
                    return record_failure(self.store.as_ref(), file_id, self.stage, e.error_kind(), &e.to_string()).await;
                }
            };

            for t in &translated {
                self.store.put_segment_translation(file_id, t.ordinal, target_lang, &t.text).await?;
            }
        }

        if cancel.is_cancelled() {
            return Ok(());
        }

        // Re-read to pick up every translation just written (including
        // ones from a previous, partially-completed attempt).
        segments = self.store.list_segments(file_id).await?;

        let text = SubtitleBuilder::build_transcript_text(&segments, Some(target_lang));
        let srt = SubtitleBuilder::build_srt(&segments, target_lang);

        let text_path = artifact_path(&self.output_root, file_id, ArtifactKind::TranslationText, Some(target_lang));
        let text_artifact = write_artifact(&text_path, file_id, self.stage, ArtifactKind::TranslationText, text.as_bytes()).await?;
        self.store.put_artifact(text_artifact).await?;

        let srt_path = artifact_path(&self.output_root, file_id, ArtifactKind::TranslationSrt, Some(target_lang));
        let srt_artifact = write_artifact(&srt_path, file_id, self.stage, ArtifactKind::TranslationSrt, srt.as_bytes()).await?;
        self.store.put_artifact(srt_artifact).await?;

        self.store.complete(file_id, self.stage).await?;
        Ok(())
    }
}

// --- Evaluation -----------------------------------------------------------

pub struct EvaluationWorker {
    pub store: Arc<dyn Store>,
    pub output_root: PathBuf,
    pub stage: Stage,
    pub provider: Arc<dyn EvaluationProvider>,
    pub qa_threshold: f64,
}

#[async_trait]
impl StageWorker for EvaluationWorker {
    fn stage(&self) -> Stage {
        self.stage
    }

    async fn run(&self, file_id: Uuid, cancel: &CancellationToken) -> WorkerResult {
        if cancel.is_cancelled() {
            return Ok(());
        }

        let target_lang = target_language_for_stage(self.stage);
        let segments = self.store.list_segments(file_id).await?;

        let source_segments: Vec<ProviderSegment> = segments
            .iter()
            .map(|s| ProviderSegment {
                ordinal: s.ordinal,
                start_ms: s.start_ms,
                end_ms: s.end_ms,
                text: s.source_text.clone(),
                language: s.source_language.clone(),
            })
            .collect();

        let translated_segments: Vec<TranslatedSegment> = segments
            .iter()
            .map(|s| TranslatedSegment {
                ordinal: s.ordinal,
                text: s
                    .translations
                    .get(target_lang)
                    .cloned()
                    .unwrap_or_else(|| s.source_text.clone()),
            })
            .collect();

        if cancel.is_cancelled() {
            return Ok(());
        }

        let report = match self.provider.score(&source_segments, &translated_segments, target_lang).await {
            Ok(r) => r,
            Err(e) => {
                return record_failure(self.store.as_ref(), file_id, self.stage, e.error_kind(), &e.to_string()).await;
            }
        };

        if cancel.is_cancelled() {
            return Ok(());
        }

        let report_json = serde_json::to_vec_pretty(&report).map_err(|e| {
            FatalError::Io(format!("failed to serialize evaluation report: {e}"))
        })?;

        let report_path = artifact_path(&self.output_root, file_id, ArtifactKind::EvaluationReport, Some(target_lang));
        let artifact: Artifact = write_artifact(&report_path, file_id, self.stage, ArtifactKind::EvaluationReport, &report_json).await?;
        self.store.put_artifact(artifact).await?;

        self.store.complete(file_id, self.stage).await?;

        let passed = report.composite_score >= self.qa_threshold;
        self.store.annotate_qa(file_id, self.stage, passed).await?;
        Ok(())
    }
}
