use thiserror::Error;

pub type Result<T> = std::result::Result<T, SegmentError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    /// Segment `i` ends after segment `i+1` starts without being marked
    /// overlapping. Maps to the `input_unreadable` hard-failure class: a
    /// transcript this malformed cannot be trusted to drive subtitle
    /// emission, and is never silently coerced.
    #[error("segment ordering violated at ordinal {ordinal}: end_ms {end_ms} > next start_ms {next_start_ms}")]
    OrderViolation {
        ordinal: u32,
        end_ms: u64,
        next_start_ms: u64,
    },

    #[error("segment ordinals are not dense/ordered: expected {expected}, got {got}")]
    NonDenseOrdinal { expected: u32, got: u32 },
}

impl SegmentError {
    pub fn error_kind(&self) -> &'static str {
        "input_unreadable"
    }
}
