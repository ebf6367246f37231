//! Provider-boundary DTOs. Deliberately independent of `ohp_store::Segment`:
//! these are the shapes that cross the vendor HTTP contract, not the
//! Store's persisted model. `ohp-pipeline` converts between the two.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionHints {
    pub source_language_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSegment {
    pub ordinal: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedSegment {
    pub ordinal: u32,
    pub text: String,
}

/// Field names match the on-disk evaluation report contract verbatim
/// (`{id}.{target}.evaluation.json`): `segment`, `kind`, `detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationIssue {
    #[serde(rename = "segment")]
    pub ordinal: u32,
    pub kind: String,
    pub detail: String,
}

/// Field names match the on-disk evaluation report contract verbatim: four
/// fixed sub-scores rather than an open map, since the report schema names
/// them explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(rename = "composite")]
    pub composite_score: f64,
    pub content_accuracy: f64,
    pub speech_fidelity: f64,
    pub cultural_context: f64,
    pub reliability: f64,
    pub issues: Vec<EvaluationIssue>,
}
