//! SRT and plaintext transcript emission. Timing is byte-exact against the
//! source transcript: no re-timing, no merging, no splitting.

use ohp_store::Segment;

fn format_timecode(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Same clock, dot-separated millis — the transcript-line prefix format,
/// distinct from `format_timecode`'s comma-separated SRT convention.
fn format_timecode_dot(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Body text for one cue: translated text for verbal segments, the
/// original bracketed token for non-verbal segments, and the original
/// source text when the segment was already detected as the target
/// language (no round-trip translation).
fn cue_body<'a>(segment: &'a Segment, target_lang: &str) -> &'a str {
    if segment.non_verbal {
        return &segment.source_text;
    }
    if segment.source_language.as_deref() == Some(target_lang) {
        return &segment.source_text;
    }
    segment
        .translations
        .get(target_lang)
        .map(|s| s.as_str())
        .unwrap_or(&segment.source_text)
}

pub struct SubtitleBuilder;

impl SubtitleBuilder {
    /// Builds one SRT cue per source segment for `target_lang`. `segments`
    /// must already satisfy the ordering invariant (see `SegmentValidator`).
    pub fn build_srt(segments: &[Segment], target_lang: &str) -> String {
        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            let mut end_ms = segment.end_ms;
            // Tie-break: if this cue's end shares a boundary with the next
            // cue's start, end one millisecond early so cues never overlap
            // on screen even when the underlying segments are contiguous.
            if let Some(next) = segments.get(i + 1) {
                if end_ms == next.start_ms && end_ms > 0 {
                    end_ms -= 1;
                }
            }

            out.push_str(&format!("{}\r\n", segment.ordinal + 1));
            out.push_str(&format!(
                "{} --> {}\r\n",
                format_timecode(segment.start_ms),
                format_timecode(end_ms)
            ));
            out.push_str(cue_body(segment, target_lang));
            out.push_str("\r\n\r\n");
        }
        out
    }

    /// Plaintext transcript: one line per segment, prefixed
    /// `[HH:MM:SS.mmm → HH:MM:SS.mmm] `, in source language for
    /// `target_lang == None`-equivalent use (the transcription worker), or
    /// translated text for a translation worker's `.txt` artifact.
    pub fn build_transcript_text(segments: &[Segment], target_lang: Option<&str>) -> String {
        let mut out = String::new();
        for segment in segments {
            let line = match target_lang {
                None => segment.source_text.as_str(),
                Some(lang) => cue_body(segment, lang),
            };
            out.push_str(&format!(
                "[{} \u{2192} {}] ",
                format_timecode_dot(segment.start_ms),
                format_timecode_dot(segment.end_ms)
            ));
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn seg(ordinal: u32, start_ms: u64, end_ms: u64, text: &str, lang: Option<&str>, non_verbal: bool) -> Segment {
        let mut translations = BTreeMap::new();
        if !non_verbal {
            translations.insert("en".to_string(), format!("EN:{text}"));
        }
        Segment {
            file_id: uuid::Uuid::nil(),
            ordinal,
            start_ms,
            end_ms,
            source_text: text.to_string(),
            source_language: lang.map(|s| s.to_string()),
            non_verbal,
            overlapping: false,
            translations,
        }
    }

    #[test]
    fn format_timecode_matches_srt_convention() {
        assert_eq!(format_timecode(0), "00:00:00,000");
        assert_eq!(format_timecode(7_000), "00:00:07,000");
        assert_eq!(format_timecode(3_661_042), "01:01:01,042");
    }

    #[test]
    fn tie_break_shortens_earlier_cue_by_one_millisecond() {
        let segments = vec![
            seg(0, 0, 2000, "Guten Tag", Some("de"), false),
            seg(1, 2000, 5000, "Ich heisse Hans", Some("de"), false),
        ];
        let srt = SubtitleBuilder::build_srt(&segments, "en");
        assert!(srt.contains("00:00:00,000 --> 00:00:01,999"));
        assert!(srt.contains("00:00:02,000 --> 00:00:05,000"));
    }

    #[test]
    fn non_verbal_cue_is_emitted_verbatim() {
        let segments = vec![seg(0, 5000, 7000, "[pause]", None, true)];
        let srt = SubtitleBuilder::build_srt(&segments, "en");
        assert!(srt.contains("[pause]"));
    }

    #[test]
    fn already_target_language_segment_passes_through_source_text() {
        let segments = vec![seg(0, 0, 1000, "the army", Some("en"), false)];
        let srt = SubtitleBuilder::build_srt(&segments, "en");
        assert!(srt.contains("the army"));
        assert!(!srt.contains("EN:the army"));
    }

    #[test]
    fn srt_uses_crlf_line_endings_throughout() {
        let segments = vec![
            seg(0, 0, 2000, "Guten Tag", Some("de"), false),
            seg(1, 2000, 5000, "Ich heisse Hans", Some("de"), false),
        ];
        let srt = SubtitleBuilder::build_srt(&segments, "en");
        assert_eq!(srt.matches('\n').count(), srt.matches("\r\n").count(), "every newline must be part of a CRLF pair");
        assert_eq!(
            srt,
            "1\r\n00:00:00,000 --> 00:00:01,999\r\nEN:Guten Tag\r\n\r\n\
             2\r\n00:00:02,000 --> 00:00:05,000\r\nEN:Ich heisse Hans\r\n\r\n"
        );
    }

    #[test]
    fn transcript_text_lines_are_prefixed_with_dot_separated_timecode() {
        let segments = vec![seg(0, 0, 2000, "Guten Tag", Some("de"), false)];
        let text = SubtitleBuilder::build_transcript_text(&segments, None);
        assert_eq!(text, "[00:00:00.000 \u{2192} 00:00:02.000] Guten Tag\n");
    }

    #[test]
    fn translation_text_lines_are_also_prefixed_with_timecode() {
        let segments = vec![seg(0, 0, 2000, "Guten Tag", Some("de"), false)];
        let text = SubtitleBuilder::build_transcript_text(&segments, Some("en"));
        assert_eq!(text, "[00:00:00.000 \u{2192} 00:00:02.000] EN:Guten Tag\n");
    }
}
