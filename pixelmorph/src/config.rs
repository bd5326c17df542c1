use std::fmt;

use crate::correspondence_ranking::RankingAlgorithm;

/// Delay between animation frames in hundredths of a second. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameDelay(u16);

impl FrameDelay {
    pub const DEFAULT: FrameDelay = FrameDelay(1);

    /// Returns `None` for a delay of zero.
    pub fn new(hundredths: u16) -> Option<Self> {
        (hundredths >= 1).then_some(FrameDelay(hundredths))
    }

    /// Parses a user-supplied delay. Missing, unparsable or zero values fall
    /// back to [FrameDelay::DEFAULT] with a warning.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::DEFAULT;
        };
        match raw.trim().parse::<u16>() {
            Ok(value) => Self::new(value).unwrap_or_else(|| {
                tracing::warn!(
                    "frame delay must be at least 1, using default {}",
                    Self::DEFAULT
                );
                Self::DEFAULT
            }),
            Err(e) => {
                tracing::warn!(
                    "invalid frame delay '{raw}' ({e}), using default {}",
                    Self::DEFAULT
                );
                Self::DEFAULT
            }
        }
    }

    pub fn hundredths(&self) -> u16 {
        self.0
    }

    pub fn as_millis(&self) -> u32 {
        self.0 as u32 * 10
    }
}

impl Default for FrameDelay {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for FrameDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}ms)", self.0, self.as_millis())
    }
}

/// Threading and chunking controls for linear-model frame rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderThreading {
    /// Render frames on a rayon pool when `true`.
    pub parallel: bool,
    /// Frames rendered per batch before they are handed to the sink in order.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            chunk_size: 32,
            threads: None,
        }
    }
}

impl RenderThreading {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}

/// Everything that varies between runs of the morph pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MorphConfig {
    pub algorithm: RankingAlgorithm,
    pub delay: FrameDelay,
    pub threading: RenderThreading,
}
