//! Thin `reqwest`-based adapters over a configurable HTTP contract. Any
//! provider reachable at `POST {base_url}/{transcribe,translate,score}`
//! returning the matching JSON shape works — these name no vendor.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{ProviderError, Result};
use crate::traits::{EvaluationProvider, TranscriptionProvider, TranslationProvider};
use crate::types::{EvaluationReport, ProviderSegment, TranscriptionHints, TranslatedSegment};

fn classify_transport_error(id: &str, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Transient(format!("{id}: request timed out"))
    } else if let Some(status) = e.status() {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            ProviderError::RateLimited { retry_after_ms: 1000 }
        } else if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            ProviderError::Auth(format!("{id}: {status}"))
        } else if status.is_server_error() {
            ProviderError::Transient(format!("{id}: {status}"))
        } else {
            ProviderError::Permanent(format!("{id}: {status}"))
        }
    } else {
        ProviderError::Transient(format!("{id}: {e}"))
    }
}

pub struct HttpTranscriptionProvider {
    id: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpTranscriptionProvider {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { id: id.into(), base_url: base_url.into(), client: reqwest::Client::new() }
    }
}

#[derive(Serialize)]
struct TranscribeRequest<'a> {
    media_path: &'a str,
    hints: &'a TranscriptionHints,
}

#[async_trait]
impl TranscriptionProvider for HttpTranscriptionProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn transcribe(&self, media_path: &str, hints: &TranscriptionHints) -> Result<Vec<ProviderSegment>> {
        let resp = self
            .client
            .post(format!("{}/transcribe", self.base_url))
            .json(&TranscribeRequest { media_path, hints })
            .send()
            .await
            .map_err(|e| classify_transport_error(&self.id, e))?
            .error_for_status()
            .map_err(|e| classify_transport_error(&self.id, e))?;

        resp.json::<Vec<ProviderSegment>>()
            .await
            .map_err(|e| ProviderError::Permanent(format!("{}: malformed response: {e}", self.id)))
    }
}

pub struct HttpTranslationProvider {
    id: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpTranslationProvider {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { id: id.into(), base_url: base_url.into(), client: reqwest::Client::new() }
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    segments: &'a [ProviderSegment],
    target_lang: &'a str,
}

#[async_trait]
impl TranslationProvider for HttpTranslationProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn translate(&self, segments: &[ProviderSegment], target_lang: &str) -> Result<Vec<TranslatedSegment>> {
        let resp = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&TranslateRequest { segments, target_lang })
            .send()
            .await
            .map_err(|e| classify_transport_error(&self.id, e))?
            .error_for_status()
            .map_err(|e| classify_transport_error(&self.id, e))?;

        resp.json::<Vec<TranslatedSegment>>()
            .await
            .map_err(|e| ProviderError::Permanent(format!("{}: malformed response: {e}", self.id)))
    }
}

pub struct HttpEvaluationProvider {
    id: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpEvaluationProvider {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { id: id.into(), base_url: base_url.into(), client: reqwest::Client::new() }
    }
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    source_segments: &'a [ProviderSegment],
    translated_segments: &'a [TranslatedSegment],
    target_lang: &'a str,
}

#[async_trait]
impl EvaluationProvider for HttpEvaluationProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn score(
        &self,
        source_segments: &[ProviderSegment],
        translated_segments: &[TranslatedSegment],
        target_lang: &str,
    ) -> Result<EvaluationReport> {
        let resp = self
            .client
            .post(format!("{}/score", self.base_url))
            .json(&ScoreRequest { source_segments, translated_segments, target_lang })
            .send()
            .await
            .map_err(|e| classify_transport_error(&self.id, e))?
            .error_for_status()
            .map_err(|e| classify_transport_error(&self.id, e))?;

        resp.json::<EvaluationReport>()
            .await
            .map_err(|e| ProviderError::Permanent(format!("{}: malformed response: {e}", self.id)))
    }
}
