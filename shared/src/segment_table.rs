use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::ConfigError;

/// Color of a wheel segment. Doubles as the segment label.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SegmentColor {
    Red,
    Green,
    Purple,
    Blue,
    Yellow,
    Orange,
    Cyan,
    Pink,
}

/// One fixed slice of the wheel.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub label: SegmentColor,
    pub payout: i64,
}

impl Segment {
    pub const fn new(label: SegmentColor, payout: i64) -> Self {
        Self { label, payout }
    }
}

#[derive(Debug, Deserialize)]
struct RawSegmentTable {
    segment_count: usize,
    segments: Vec<Segment>,
}

/// The wheel layout. Index order is the physical order on the wheel and is
/// never re-sorted; duplicate payouts encode weighting.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(try_from = "RawSegmentTable")]
pub struct SegmentTable {
    segment_count: usize,
    segments: Vec<Segment>,
}

/// Checks that `segment_count` slices tile the wheel with an exact width.
pub fn validate_segment_count(segment_count: usize) -> Result<(), ConfigError> {
    if segment_count == 0 {
        return Err(ConfigError::EmptyTable);
    }
    if 360 % segment_count != 0 {
        return Err(ConfigError::UnevenSegments(segment_count));
    }
    Ok(())
}

impl SegmentTable {
    pub fn new(segment_count: usize, segments: Vec<Segment>) -> Result<Self, ConfigError> {
        validate_segment_count(segment_count)?;
        if segments.len() != segment_count {
            return Err(ConfigError::SegmentCountMismatch {
                expected: segment_count,
                actual: segments.len(),
            });
        }
        for (index, segment) in segments.iter().enumerate() {
            if segment.payout < 0 {
                return Err(ConfigError::NegativePayout { index, payout: segment.payout });
            }
            if segment.payout > i64::MAX / 2 {
                return Err(ConfigError::PayoutOverflow { index, payout: segment.payout });
            }
        }

        Ok(Self { segment_count, segments })
    }

    /// Builds a table from a built-in layout without re-running validation.
    pub(crate) fn preset(segments: Vec<Segment>) -> Self {
        Self { segment_count: segments.len(), segments }
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Degrees covered by each segment.
    pub fn segment_width(&self) -> f64 {
        360.0 / self.segment_count as f64
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Angle at which segment `index` begins.
    pub fn segment_start_angle(&self, index: usize) -> f64 {
        (index % self.segment_count) as f64 * self.segment_width()
    }

    pub fn first_index_of(&self, payout: i64) -> Option<usize> {
        self.segments.iter().position(|s| s.payout == payout)
    }

    /// Highest payout on the wheel.
    pub fn jackpot_payout(&self) -> i64 {
        self.segments.iter().map(|s| s.payout).max().unwrap_or(0)
    }

    /// Every payout a player can sensibly predict, lowest first.
    pub fn distinct_payouts(&self) -> Vec<i64> {
        let mut payouts: Vec<i64> = self.segments.iter().map(|s| s.payout).collect();
        payouts.sort_unstable();
        payouts.dedup();
        payouts
    }
}

impl TryFrom<RawSegmentTable> for SegmentTable {
    type Error = ConfigError;

    fn try_from(raw: RawSegmentTable) -> Result<Self, Self::Error> {
        Self::new(raw.segment_count, raw.segments)
    }
}
