use thiserror::Error;

/// Reasons a segment table or spin plan is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("segment table must have at least one segment")]
    EmptyTable,
    #[error("{0} segments do not divide 360 degrees evenly")]
    UnevenSegments(usize),
    #[error("expected {expected} segments, got {actual}")]
    SegmentCountMismatch { expected: usize, actual: usize },
    #[error("segment {index} has negative payout {payout}")]
    NegativePayout { index: usize, payout: i64 },
    #[error("segment {index} payout {payout} overflows when doubled")]
    PayoutOverflow { index: usize, payout: i64 },
    #[error("expected {expected} weights, got {actual}")]
    WeightMismatch { expected: usize, actual: usize },
    #[error("segment weights are unusable: {0}")]
    InvalidWeights(String),
    #[error("target stop angle {0} is outside [0, 360)")]
    TargetOutOfRange(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WheelError {
    #[error("invalid wheel configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("wheel has not been configured")]
    NotConfigured,
    #[error("a spin is already in progress")]
    AlreadySpinning,
    #[error("spin was aborted before it settled")]
    Aborted,
    #[error("no spin is in progress")]
    NotSpinning,
    #[error("no segment pays {0}")]
    UnknownPayout(i64),
}

impl WheelError {
    /// Expected, recoverable rejections a caller may simply ignore.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AlreadySpinning | Self::NotSpinning)
    }
}
