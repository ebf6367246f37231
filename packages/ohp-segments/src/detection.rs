//! Segment-by-segment language detection, the core design decision behind
//! this module: interviews mix languages mid-sentence, so detection and
//! translation operate per-segment rather than per-file.

use ohp_store::Segment;

use crate::lexicon::NonVerbalLexicon;

const MIN_WORDS_FOR_DETECTION: usize = 5;

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Maps a `whatlang` detection to the two-letter codes this pipeline cares
/// about, falling back to the three-letter ISO 639-3 code for anything
/// else so detection never silently drops information.
fn to_language_code(lang: whatlang::Lang) -> String {
    match lang {
        whatlang::Lang::Eng => "en".to_string(),
        whatlang::Lang::Deu => "de".to_string(),
        whatlang::Lang::Heb => "he".to_string(),
        other => other.code().to_string(),
    }
}

fn detect_confident(text: &str) -> Option<String> {
    if word_count(text) < MIN_WORDS_FOR_DETECTION {
        return None;
    }
    let info = whatlang::detect(text)?;
    if !info.is_reliable() {
        return None;
    }
    Some(to_language_code(info.lang()))
}

/// Annotates `segments` in place with `source_language` and `non_verbal`,
/// per §4.D:
///
/// - word count >= 5: detect from the segment's own text.
/// - shorter segments: inherit from the nearest preceding confident
///   detection, defaulting to `file_source_language`.
/// - segments consisting only of a non-verbal marker are flagged
///   `non_verbal` and never assigned a language to translate from.
pub fn annotate_languages(
    segments: &mut [Segment],
    lexicon: &NonVerbalLexicon,
    file_source_language: Option<&str>,
) {
    let mut last_confident: Option<String> = file_source_language.map(|s| s.to_string());

    for segment in segments.iter_mut() {
        if lexicon.is_non_verbal(&segment.source_text) {
            segment.non_verbal = true;
            segment.source_language = None;
            continue;
        }

        match detect_confident(&segment.source_text) {
            Some(lang) => {
                segment.source_language = Some(lang.clone());
                last_confident = Some(lang);
            }
            None => {
                segment.source_language = last_confident.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn seg(ordinal: u32, text: &str) -> Segment {
        Segment {
            file_id: uuid::Uuid::nil(),
            ordinal,
            start_ms: (ordinal as u64) * 1000,
            end_ms: (ordinal as u64 + 1) * 1000,
            source_text: text.to_string(),
            source_language: None,
            non_verbal: false,
            overlapping: false,
            translations: BTreeMap::new(),
        }
    }

    #[test]
    fn short_segment_inherits_preceding_detection() {
        let lexicon = NonVerbalLexicon::default();
        let mut segments = vec![
            seg(0, "Ich heisse Hans und ich wohne in Berlin"),
            seg(1, "ja"),
        ];
        annotate_languages(&mut segments, &lexicon, None);
        assert_eq!(segments[0].source_language.as_deref(), Some("de"));
        assert_eq!(segments[1].source_language.as_deref(), Some("de"));
    }

    #[test]
    fn short_segment_with_no_history_defaults_to_file_language() {
        let lexicon = NonVerbalLexicon::default();
        let mut segments = vec![seg(0, "ja")];
        annotate_languages(&mut segments, &lexicon, Some("de"));
        assert_eq!(segments[0].source_language.as_deref(), Some("de"));
    }

    #[test]
    fn non_verbal_marker_is_flagged_and_unlanguaged() {
        let lexicon = NonVerbalLexicon::default();
        let mut segments = vec![seg(0, "[pause]")];
        annotate_languages(&mut segments, &lexicon, Some("de"));
        assert!(segments[0].non_verbal);
        assert_eq!(segments[0].source_language, None);
    }
}
