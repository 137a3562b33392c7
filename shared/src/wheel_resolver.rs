use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::WheelError;
use crate::segment_table::{Segment, SegmentTable};

/// Outcome of one settled spin.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SpinResult {
    pub final_angle_degrees: f64,
    pub segment_index: usize,
    pub base_payout: i64,
    pub predicted_correctly: bool,
    pub awarded_payout: i64,
}

/// Reduces any angle into [0, 360). Non-finite angles map to 0.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    // Same as ((a mod 360) + 360) mod 360, but only shifts negative remainders
    // so values already in range come back bit-for-bit unchanged.
    let mut normalized = angle % 360.0;
    if normalized < 0.0 {
        normalized += 360.0;
    }
    // Tiny negatives round back up to 360
    if normalized >= 360.0 {
        0.0
    } else {
        normalized + 0.0
    }
}

/// Index of the segment under `angle` on a wheel of `segment_count` equal slices.
pub fn segment_index_for(angle: f64, segment_count: usize) -> usize {
    if segment_count == 0 {
        return 0;
    }
    let width = 360.0 / segment_count as f64;
    (normalize_angle(angle) / width).floor() as usize % segment_count
}

/// Maps settled angles to prizes and judges the player's prediction.
#[derive(Debug, Clone, Default)]
pub struct WheelResolver {
    table: Option<SegmentTable>,
    prediction: Option<i64>,
}

impl WheelResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: SegmentTable) -> Self {
        Self { table: Some(table), prediction: None }
    }

    /// Validates and installs a new layout.
    pub fn configure(&mut self, segment_count: usize, segments: Vec<Segment>) -> Result<(), WheelError> {
        let table = SegmentTable::new(segment_count, segments)?;
        self.configure_table(table);
        Ok(())
    }

    pub fn configure_table(&mut self, table: SegmentTable) {
        debug!("wheel configured with {} segments", table.segment_count());
        self.table = Some(table);
    }

    pub fn table(&self) -> Result<&SegmentTable, WheelError> {
        self.table.as_ref().ok_or(WheelError::NotConfigured)
    }

    /// A prediction that matches no payout simply never wins.
    pub fn set_prediction(&mut self, prediction: Option<i64>) {
        self.prediction = prediction;
    }

    pub fn prediction(&self) -> Option<i64> {
        self.prediction
    }

    pub fn resolve(&self, final_angle_degrees: f64) -> Result<SpinResult, WheelError> {
        let table = self.table()?;
        let final_angle_degrees = normalize_angle(final_angle_degrees);
        let segment_index = segment_index_for(final_angle_degrees, table.segment_count());
        let base_payout = table.segments()[segment_index].payout;
        let predicted_correctly = self.prediction == Some(base_payout);
        // Payouts are capped at i64::MAX / 2 when the table is built
        let awarded_payout = if predicted_correctly { base_payout * 2 } else { base_payout };

        Ok(SpinResult {
            final_angle_degrees,
            segment_index,
            base_payout,
            predicted_correctly,
            awarded_payout,
        })
    }
}
