//! Routing policy: which provider is primary/fallback per target language,
//! and the deterministic retry-then-fallback order. This is scheduler-facing
//! policy, not adapter logic — adapters only implement a capability.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::retry::RetryPolicy;
use crate::traits::TranslationProvider;
use crate::types::{ProviderSegment, TranslatedSegment};

/// Primary/fallback provider pair for one target language.
pub struct RoutingEntry {
    pub primary: Arc<dyn TranslationProvider>,
    pub fallback: Arc<dyn TranslationProvider>,
}

/// Per-target-language routing table, e.g. `he -> {primary: llm, fallback:
/// generic}`, `en`/`de` -> `{primary: generic, fallback: llm}`, per §4.C.
pub struct ProviderRouting {
    entries: BTreeMap<String, RoutingEntry>,
    retry_policy: RetryPolicy,
}

impl ProviderRouting {
    pub fn new(retry_policy: RetryPolicy) -> Self {
        Self {
            entries: BTreeMap::new(),
            retry_policy,
        }
    }

    pub fn with_route(mut self, target_lang: &str, primary: Arc<dyn TranslationProvider>, fallback: Arc<dyn TranslationProvider>) -> Self {
        self.entries.insert(target_lang.to_string(), RoutingEntry { primary, fallback });
        self
    }

    pub fn route_for(&self, target_lang: &str) -> Option<&RoutingEntry> {
        self.entries.get(target_lang)
    }
}

/// Wraps a routed pair and implements "retry first up to a configured
/// ceiling, then fall back" for one run of segments.
pub struct RoutedTranslator<'a> {
    routing: &'a ProviderRouting,
}

impl<'a> RoutedTranslator<'a> {
    pub fn new(routing: &'a ProviderRouting) -> Self {
        Self { routing }
    }

    /// Translates one run, retrying the primary per the retry policy, then
    /// falling back to the fallback provider on a non-retryable or
    /// retry-exhausted outcome. Sleeps the provider's declared delay
    /// between retries (callers in tests may use a zero-delay policy).
    pub async fn translate_run(
        &self,
        segments: &[ProviderSegment],
        target_lang: &str,
    ) -> Result<Vec<TranslatedSegment>> {
        let route = self
            .routing
            .route_for(target_lang)
            .ok_or_else(|| ProviderError::Permanent(format!("no route configured for {target_lang}")))?;

        let mut attempts = 0u32;
        loop {
            match route.primary.translate(segments, target_lang).await {
                Ok(out) => return validate_alignment(segments, out),
                Err(e) if e.is_retryable() => {
                    attempts += 1;
                    if self.routing.retry_policy.exhausted(attempts) {
                        break;
                    }
                    let delay = e
                        .retry_after_ms()
                        .map(std::time::Duration::from_millis)
                        .unwrap_or_else(|| self.routing.retry_policy.delay_for_attempt(attempts - 1));
                    tokio::time::sleep(delay).await;
                }
                Err(_) => break,
            }
        }

        route.fallback.translate(segments, target_lang).await.and_then(|out| validate_alignment(segments, out))
    }
}

fn validate_alignment(
    requested: &[ProviderSegment],
    got: Vec<TranslatedSegment>,
) -> Result<Vec<TranslatedSegment>> {
    if got.len() != requested.len() {
        return Err(ProviderError::AlignmentMismatch {
            requested: requested.len(),
            got: got.len(),
        });
    }
    Ok(got)
}
