//! Generalizes the explicit refusal to silently coerce
//! `alignment_mismatch` to the analogous segment-ordering case: a
//! transcription worker must not call `Store::put_segments` with a
//! malformed run.

use ohp_store::Segment;

use crate::error::{Result, SegmentError};

pub struct SegmentValidator;

impl SegmentValidator {
    /// Checks ordinals are dense and 0-based, and that
    /// `segment[i].end_ms <= segment[i+1].start_ms` unless segment `i` is
    /// explicitly marked `overlapping`.
    pub fn validate(segments: &[Segment]) -> Result<()> {
        for (i, segment) in segments.iter().enumerate() {
            if segment.ordinal != i as u32 {
                return Err(SegmentError::NonDenseOrdinal {
                    expected: i as u32,
                    got: segment.ordinal,
                });
            }
        }

        for window in segments.windows(2) {
            let [a, b] = window else { unreachable!() };
            if a.end_ms > b.start_ms && !a.overlapping {
                return Err(SegmentError::OrderViolation {
                    ordinal: a.ordinal,
                    end_ms: a.end_ms,
                    next_start_ms: b.start_ms,
                });
            }
        }

        Ok(())
    }
}
