use crate::photo::Bounds;

pub type PixelMorphResult<T> = Result<T, PixelMorphError>;

#[derive(thiserror::Error, Debug)]
pub enum PixelMorphError {
    #[error("dimension mismatch: source is {expected}, target is {actual}")]
    DimensionMismatch { expected: Bounds, actual: Bounds },

    #[error("ranked sequences differ: {source_len} source vs {target_len} target pixels")]
    SequenceLengthMismatch { source_len: usize, target_len: usize },

    #[error("unknown algorithm '{0}' (valid choices: default, featured)")]
    UnknownAlgorithm(String),

    #[error("frame {frame} is out of range for a plan with {frame_count} frames")]
    FrameOutOfRange { frame: usize, frame_count: usize },

    #[error("invalid plan data: {0}")]
    InvalidPlanData(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixelMorphError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_plan(msg: impl Into<String>) -> Self {
        Self::InvalidPlanData(msg.into())
    }
}
