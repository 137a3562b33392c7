use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::segment_table::{Segment, SegmentColor, SegmentTable};

pub const DEFAULT_ROTATIONS: u32 = 5;
pub const MIN_ROTATIONS: u32 = 1;
pub const MAX_ROTATIONS: u32 = 20;

pub const DEFAULT_SPIN_DURATION_MS: u64 = 3000;
pub const MIN_SPIN_DURATION_MS: u64 = 1;
pub const MAX_SPIN_DURATION_MS: u64 = 30_000;

// Roughly one 60Hz frame
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

pub const JACKPOT: i64 = 10_000;
pub const YELLOW_PRIZE: i64 = 5_000;
pub const PURPLE_PRIZE: i64 = 1_000;
pub const BLUE_PRIZE: i64 = 50;
pub const GREEN_PRIZE: i64 = 5;

const RED: Segment = Segment::new(SegmentColor::Red, JACKPOT);
const YELLOW: Segment = Segment::new(SegmentColor::Yellow, YELLOW_PRIZE);
const PURPLE: Segment = Segment::new(SegmentColor::Purple, PURPLE_PRIZE);
const BLUE: Segment = Segment::new(SegmentColor::Blue, BLUE_PRIZE);
const GREEN: Segment = Segment::new(SegmentColor::Green, GREEN_PRIZE);

static CLASSIC: Lazy<SegmentTable> = Lazy::new(|| {
    SegmentTable::preset(vec![
        RED, GREEN, PURPLE, GREEN, BLUE, GREEN, YELLOW, GREEN, BLUE, GREEN,
        PURPLE, GREEN, BLUE, GREEN, YELLOW, GREEN, BLUE, GREEN, PURPLE, GREEN,
    ])
});

static COMPACT: Lazy<SegmentTable> = Lazy::new(|| {
    SegmentTable::preset(vec![
        RED, GREEN, BLUE, GREEN, PURPLE, GREEN, YELLOW, GREEN, BLUE, GREEN, PURPLE, GREEN,
    ])
});

static MINI: Lazy<SegmentTable> = Lazy::new(|| {
    SegmentTable::preset(vec![RED, GREEN, BLUE, GREEN, YELLOW, GREEN, PURPLE, GREEN])
});

/// Built-in wheel layouts.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WheelLayout {
    /// 20 segments of 18 degrees
    #[default]
    Classic,
    /// 12 segments of 30 degrees
    Compact,
    /// 8 segments of 45 degrees
    Mini,
}

impl WheelLayout {
    pub fn table(&self) -> &'static SegmentTable {
        match self {
            Self::Classic => &CLASSIC,
            Self::Compact => &COMPACT,
            Self::Mini => &MINI,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_presets_pass_validation() {
        for layout in WheelLayout::iter() {
            let table = layout.table();
            let rebuilt = SegmentTable::new(table.segment_count(), table.segments().to_vec());
            assert_eq!(rebuilt.as_ref(), Ok(table), "{layout} preset is malformed");
        }
    }

    #[test]
    fn test_classic_layout() {
        let table = WheelLayout::Classic.table();
        assert_eq!(table.segment_count(), 20);
        assert_eq!(table.segment_width(), 18.0);
        assert_eq!(table.segment(0).map(|s| s.payout), Some(JACKPOT));
        assert_eq!(table.segment(6).map(|s| s.label), Some(SegmentColor::Yellow));
        assert!(table.segments().iter().skip(1).step_by(2).all(|s| s.payout == GREEN_PRIZE));
    }

    #[test]
    fn test_layout_parsing() {
        assert_eq!(WheelLayout::from_str("MINI").unwrap(), WheelLayout::Mini);
        assert!(WheelLayout::from_str("huge").is_err());
    }
}
