//! In-memory, scriptable adapters used by tests to assert routing
//! determinism and retry behavior without network access — the same role
//! `orchestrator.rs`'s `MockHandler` plays there.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::Result;
use crate::traits::{EvaluationProvider, TranscriptionProvider, TranslationProvider};
use crate::types::{EvaluationReport, ProviderSegment, TranscriptionHints, TranslatedSegment};

/// Replays a fixed script of outcomes, one per call, cycling to the last
/// entry once exhausted.
pub struct ScriptedTranscriptionProvider {
    pub id: String,
    calls: AtomicUsize,
    script: Vec<Result<Vec<ProviderSegment>>>,
}

impl ScriptedTranscriptionProvider {
    pub fn new(id: impl Into<String>, script: Vec<Result<Vec<ProviderSegment>>>) -> Self {
        Self { id: id.into(), calls: AtomicUsize::new(0), script }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionProvider for ScriptedTranscriptionProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn transcribe(&self, _media_path: &str, _hints: &TranscriptionHints) -> Result<Vec<ProviderSegment>> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst).min(self.script.len().saturating_sub(1));
        self.script[i].clone()
    }
}

pub struct ScriptedTranslationProvider {
    pub id: String,
    calls: AtomicUsize,
    script: Vec<Result<Vec<TranslatedSegment>>>,
}

impl ScriptedTranslationProvider {
    pub fn new(id: impl Into<String>, script: Vec<Result<Vec<TranslatedSegment>>>) -> Self {
        Self { id: id.into(), calls: AtomicUsize::new(0), script }
    }

    /// A provider that passes every segment's source text through unchanged.
    pub fn passthrough(id: impl Into<String>) -> Self {
        Self { id: id.into(), calls: AtomicUsize::new(0), script: vec![] }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for ScriptedTranslationProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn translate(&self, segments: &[ProviderSegment], _target_lang: &str) -> Result<Vec<TranslatedSegment>> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(outcome) = self.script.get(i.min(self.script.len().saturating_sub(1))) {
            if !self.script.is_empty() {
                return outcome.clone();
            }
        }
        Ok(segments
            .iter()
            .map(|s| TranslatedSegment { ordinal: s.ordinal, text: s.text.clone() })
            .collect())
    }
}

pub struct ScriptedEvaluationProvider {
    pub id: String,
    reports: Mutex<Vec<EvaluationReport>>,
}

impl ScriptedEvaluationProvider {
    pub fn new(id: impl Into<String>, reports: Vec<EvaluationReport>) -> Self {
        Self { id: id.into(), reports: Mutex::new(reports) }
    }
}

#[async_trait]
impl EvaluationProvider for ScriptedEvaluationProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn score(
        &self,
        _source_segments: &[ProviderSegment],
        _translated_segments: &[TranslatedSegment],
        _target_lang: &str,
    ) -> Result<EvaluationReport> {
        let mut reports = self.reports.lock().unwrap();
        if reports.len() > 1 {
            Ok(reports.remove(0))
        } else {
            Ok(reports[0].clone())
        }
    }
}
