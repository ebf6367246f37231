//! Translation run batching: consecutive same-language verbal segments are
//! grouped into runs of at most `batch_max_segments` and submitted as one
//! provider call. Non-verbal segments and language switches each start a
//! new run boundary.

use ohp_store::Segment;

/// A contiguous group of segments sharing one source language, bounded by
/// `batch_max_segments`. Non-verbal segments never appear in a run — they
/// pass through untranslated.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub language: String,
    pub ordinals: Vec<u32>,
}

pub fn build_runs(segments: &[Segment], batch_max_segments: usize) -> Vec<Run> {
    assert!(batch_max_segments > 0, "batch_max_segments must be positive");

    let mut runs = Vec::new();
    let mut current: Option<Run> = None;

    for segment in segments {
        if segment.non_verbal {
            if let Some(run) = current.take() {
                runs.push(run);
            }
            continue;
        }

        let Some(lang) = segment.source_language.clone() else {
            if let Some(run) = current.take() {
                runs.push(run);
            }
            continue;
        };

        match current.as_mut() {
            Some(run) if run.language == lang && run.ordinals.len() < batch_max_segments => {
                run.ordinals.push(segment.ordinal);
            }
            _ => {
                if let Some(run) = current.take() {
                    runs.push(run);
                }
                current = Some(Run { language: lang, ordinals: vec![segment.ordinal] });
            }
        }
    }
    if let Some(run) = current.take() {
        runs.push(run);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn seg(ordinal: u32, lang: &str, non_verbal: bool) -> Segment {
        Segment {
            file_id: uuid::Uuid::nil(),
            ordinal,
            start_ms: 0,
            end_ms: 1000,
            source_text: "x".to_string(),
            source_language: if non_verbal { None } else { Some(lang.to_string()) },
            non_verbal,
            overlapping: false,
            translations: BTreeMap::new(),
        }
    }

    #[test]
    fn same_language_segments_batch_into_one_run() {
        let segments = vec![seg(0, "de", false), seg(1, "de", false), seg(2, "de", false)];
        let runs = build_runs(&segments, 10);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].ordinals, vec![0, 1, 2]);
    }

    #[test]
    fn language_switch_starts_new_run() {
        let segments = vec![seg(0, "de", false), seg(1, "en", false), seg(2, "de", false)];
        let runs = build_runs(&segments, 10);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].language, "de");
        assert_eq!(runs[1].language, "en");
        assert_eq!(runs[2].language, "de");
    }

    #[test]
    fn non_verbal_segment_breaks_the_run_but_is_excluded() {
        let segments = vec![seg(0, "de", false), seg(1, "de", true), seg(2, "de", false)];
        let runs = build_runs(&segments, 10);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].ordinals, vec![0]);
        assert_eq!(runs[1].ordinals, vec![2]);
    }

    #[test]
    fn batch_max_segments_caps_run_size() {
        let segments: Vec<_> = (0..5).map(|i| seg(i, "de", false)).collect();
        let runs = build_runs(&segments, 2);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].ordinals, vec![0, 1]);
        assert_eq!(runs[1].ordinals, vec![2, 3]);
        assert_eq!(runs[2].ordinals, vec![4]);
    }

    use proptest::prelude::*;

    proptest! {
        /// No run ever exceeds the configured cap, and every verbal segment
        /// appears in exactly one run's ordinals, in non-decreasing order —
        /// batching must never drop, duplicate, or reorder a segment.
        #[test]
        fn runs_cap_size_and_cover_every_verbal_segment(
            flags in proptest::collection::vec((0u8..2, proptest::bool::ANY), 0..30),
            batch_max_segments in 1usize..6,
        ) {
            let segments: Vec<Segment> = flags
                .iter()
                .enumerate()
                .map(|(i, &(lang_idx, non_verbal))| {
                    seg(i as u32, if lang_idx == 0 { "de" } else { "en" }, non_verbal)
                })
                .collect();

            let runs = build_runs(&segments, batch_max_segments);

            for run in &runs {
                prop_assert!(run.ordinals.len() <= batch_max_segments);
                prop_assert!(run.ordinals.windows(2).all(|w| w[0] < w[1]));
            }

            let expected: Vec<u32> = segments.iter().filter(|s| !s.non_verbal).map(|s| s.ordinal).collect();
            let covered: Vec<u32> = runs.iter().flat_map(|r| r.ordinals.clone()).collect();
            prop_assert_eq!(expected, covered);
        }
    }
}
