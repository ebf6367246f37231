//! Non-verbal marker lexicon. Configuration-driven per the open question:
//! the set of bracketed tokens that mark a segment as non-verbal (skipped
//! by translation, emitted verbatim) rather than a fixed constant.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonVerbalLexicon {
    markers: Vec<String>,
}

impl Default for NonVerbalLexicon {
    fn default() -> Self {
        Self {
            markers: ["[pause]", "[crying]", "[inaudible]", "[unintelligible]"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl NonVerbalLexicon {
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }

    /// A segment is non-verbal if its trimmed source text is exactly one of
    /// the configured markers.
    pub fn is_non_verbal(&self, text: &str) -> bool {
        let trimmed = text.trim();
        self.markers.iter().any(|m| m == trimmed)
    }
}
