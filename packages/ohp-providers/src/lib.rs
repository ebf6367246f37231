//! Uniform capability interface over transcription, translation, and
//! evaluation services, plus retry/backoff and routing policy. The
//! orchestrator never embeds provider-specific logic outside an adapter.

pub mod adapters;
mod error;
mod retry;
mod routing;
mod traits;
mod types;

pub use error::{ProviderError, Result};
pub use retry::RetryPolicy;
pub use routing::{ProviderRouting, RoutedTranslator, RoutingEntry};
pub use traits::{EvaluationProvider, TranscriptionProvider, TranslationProvider};
pub use types::{EvaluationIssue, EvaluationReport, ProviderSegment, TranscriptionHints, TranslatedSegment};
