//! Ways of choosing where a spin stops.
//!
//! Every strategy returns an angle already aligned to a segment boundary, so
//! the sequencer can animate to it without re-quantizing.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::{ConfigError, WheelError};
use crate::segment_table::SegmentTable;
use crate::wheel_resolver::normalize_angle;

/// Rounds `raw` to the nearest multiple of `width`, wrapped into [0, 360).
/// Exact halves go to the even multiple.
pub fn quantize_angle(raw: f64, width: f64) -> f64 {
    if width <= 0.0 || !width.is_finite() {
        return normalize_angle(raw);
    }
    normalize_angle((raw / width).round_ties_even() * width)
}

pub trait AngleStrategy {
    fn pick_angle(&mut self, table: &SegmentTable) -> Result<f64, WheelError>;
}

/// Always stops at the same place. Used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedAngle(pub f64);

impl AngleStrategy for FixedAngle {
    fn pick_angle(&mut self, table: &SegmentTable) -> Result<f64, WheelError> {
        Ok(quantize_angle(self.0, table.segment_width()))
    }
}

/// Whole degree in [0, 360) snapped to the nearest boundary.
#[derive(Debug)]
pub struct UniformAngle<R> {
    rng: R,
}

impl<R: Rng> UniformAngle<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> AngleStrategy for UniformAngle<R> {
    fn pick_angle(&mut self, table: &SegmentTable) -> Result<f64, WheelError> {
        let raw = self.rng.gen_range(0..360) as f64;
        Ok(quantize_angle(raw, table.segment_width()))
    }
}

/// Picks a segment by weight and stops at its start angle.
#[derive(Debug)]
pub struct WeightedAngle<R> {
    weights: Vec<u64>,
    index: WeightedIndex<u64>,
    rng: R,
}

impl<R: Rng> WeightedAngle<R> {
    pub fn new(weights: Vec<u64>, rng: R) -> Result<Self, ConfigError> {
        let index = WeightedIndex::new(weights.iter().copied())
            .map_err(|e| ConfigError::InvalidWeights(e.to_string()))?;
        Ok(Self { weights, index, rng })
    }

    /// Rarer (higher paying) segments get proportionally less weight.
    pub fn by_rarity(table: &SegmentTable, rng: R) -> Result<Self, ConfigError> {
        let top = table.jackpot_payout().max(1) as u64;
        let weights = table
            .segments()
            .iter()
            .map(|s| (top / s.payout.max(1) as u64).max(1))
            .collect();
        Self::new(weights, rng)
    }

    pub fn weights(&self) -> &[u64] {
        &self.weights
    }
}

impl<R: Rng> AngleStrategy for WeightedAngle<R> {
    fn pick_angle(&mut self, table: &SegmentTable) -> Result<f64, WheelError> {
        if self.weights.len() != table.segment_count() {
            return Err(ConfigError::WeightMismatch {
                expected: table.segment_count(),
                actual: self.weights.len(),
            }
            .into());
        }
        let segment = self.index.sample(&mut self.rng);
        Ok(table.segment_start_angle(segment))
    }
}

/// Stops on the first segment paying the given amount.
#[derive(Debug, Clone, Copy)]
pub struct PayoutAngle(pub i64);

impl AngleStrategy for PayoutAngle {
    fn pick_angle(&mut self, table: &SegmentTable) -> Result<f64, WheelError> {
        table
            .first_index_of(self.0)
            .map(|index| table.segment_start_angle(index))
            .ok_or(WheelError::UnknownPayout(self.0))
    }
}
