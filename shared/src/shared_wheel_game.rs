use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::angle_strategy::AngleStrategy;
use crate::constants::WheelLayout;
use crate::easing::Easing;
use crate::error::{ConfigError, WheelError};
use crate::running_totals::RunningTotals;
use crate::segment_table::{Segment, SegmentTable};
use crate::spin_sequencer::{SequencerState, SpinEvent, SpinListener, SpinPlan, SpinSample, SpinSequencer};
use crate::wheel_resolver::{SpinResult, WheelResolver};

pub type SpinId = u64;

/// One player's wheel session: layout, prediction, the spin in flight and
/// the running totals.
#[derive(Debug, Clone)]
pub struct WheelGame {
    resolver: WheelResolver,
    sequencer: SpinSequencer,
    totals: RunningTotals,
    last_result: Option<SpinResult>,
    active_spin: Option<SpinId>,
    next_spin_id: SpinId,
}

/// What a settled spin produced for the session.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SpinOutcome {
    pub spin_id: SpinId,
    pub result: SpinResult,
    pub totals: RunningTotals,
}

/// Read-only view of the session for API consumers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PublicWheelGame {
    pub is_spinning: bool,
    pub state: SequencerState,
    pub prediction: Option<i64>,
    pub last_result: Option<SpinResult>,
    pub totals: RunningTotals,
    pub segment_count: usize,
}

impl WheelGame {
    pub fn new(table: SegmentTable) -> Self {
        Self {
            resolver: WheelResolver::with_table(table),
            sequencer: SpinSequencer::new(),
            totals: RunningTotals::default(),
            last_result: None,
            active_spin: None,
            next_spin_id: 0,
        }
    }

    pub fn table(&self) -> Result<&SegmentTable, WheelError> {
        self.resolver.table()
    }

    /// Swaps the layout. Refused while a spin is in flight or unconsumed.
    pub fn configure(&mut self, table: SegmentTable) -> Result<(), WheelError> {
        if !self.sequencer.is_idle() {
            return Err(WheelError::AlreadySpinning);
        }
        self.resolver.configure_table(table);
        Ok(())
    }

    pub fn set_prediction(&mut self, prediction: Option<i64>) {
        self.resolver.set_prediction(prediction);
    }

    pub fn prediction(&self) -> Option<i64> {
        self.resolver.prediction()
    }

    pub fn totals(&self) -> RunningTotals {
        self.totals
    }

    pub fn last_result(&self) -> Option<SpinResult> {
        self.last_result
    }

    pub fn active_spin(&self) -> Option<SpinId> {
        self.active_spin
    }

    pub fn is_spinning(&self) -> bool {
        !self.sequencer.is_idle()
    }

    /// Builds a plan against the current layout.
    pub fn plan_spin<S: AngleStrategy + ?Sized>(
        &self,
        strategy: &mut S,
        rotation_count: u32,
        duration: Duration,
        easing: Easing,
    ) -> Result<SpinPlan, WheelError> {
        let plan = SpinPlan::from_strategy(strategy, self.table()?, rotation_count, duration)?;
        Ok(plan.with_easing(easing))
    }

    pub fn begin_spin(&mut self, plan: SpinPlan) -> Result<SpinId, WheelError> {
        self.sequencer.spin(plan)?;
        self.next_spin_id += 1;
        self.active_spin = Some(self.next_spin_id);
        Ok(self.next_spin_id)
    }

    /// Samples spin `spin_id`. A spin that was cancelled, or replaced by a
    /// newer one, reports `Aborted`.
    pub fn sample(&mut self, spin_id: SpinId, elapsed: Duration) -> Result<SpinSample, WheelError> {
        if self.active_spin != Some(spin_id) {
            return Err(WheelError::Aborted);
        }
        self.sequencer.sample(elapsed)
    }

    /// Consumes a settled spin: resolves it, folds it into the totals and
    /// frees the wheel for the next spin.
    pub fn settle(&mut self, spin_id: SpinId) -> Result<SpinOutcome, WheelError> {
        if self.active_spin != Some(spin_id) {
            return Err(WheelError::Aborted);
        }
        let final_angle = self.sequencer.take_settlement().ok_or(WheelError::NotSpinning)?;
        self.active_spin = None;

        let result = self.resolver.resolve(final_angle)?;
        self.totals = self.totals.apply(&result);
        self.last_result = Some(result);
        info!(
            "spin {} landed on segment {} paying {} (awarded {})",
            spin_id, result.segment_index, result.base_payout, result.awarded_payout
        );

        Ok(SpinOutcome { spin_id, result, totals: self.totals })
    }

    /// Aborts the spin in flight, if any, and returns its id.
    pub fn cancel_spin(&mut self) -> Option<SpinId> {
        if self.sequencer.cancel() {
            self.active_spin.take()
        } else {
            None
        }
    }

    /// Zeroes the totals. Layout and prediction are left alone.
    pub fn reset_totals(&mut self) {
        self.totals = self.totals.reset();
    }

    /// Runs a whole spin synchronously at the given sample instants.
    pub fn play<I, L>(&mut self, plan: SpinPlan, cadence: I, listener: &mut L) -> Result<SpinOutcome, WheelError>
    where
        I: IntoIterator<Item = Duration>,
        L: SpinListener + ?Sized,
    {
        let mut settled = false;
        for event in self.sequencer.run(plan, cadence)? {
            match event {
                SpinEvent::SegmentCrossed(index) => listener.on_segment_crossed(index),
                SpinEvent::SpinSettled(_) => settled = true,
            }
        }
        if !settled {
            return Err(WheelError::Aborted);
        }

        self.next_spin_id += 1;
        self.active_spin = Some(self.next_spin_id);
        let outcome = self.settle(self.next_spin_id)?;
        listener.on_settled(&outcome.result);
        Ok(outcome)
    }

    pub fn to_public(&self) -> PublicWheelGame {
        PublicWheelGame {
            is_spinning: self.is_spinning(),
            state: self.sequencer.state(),
            prediction: self.prediction(),
            last_result: self.last_result,
            totals: self.totals,
            segment_count: self.table().map(|t| t.segment_count()).unwrap_or(0),
        }
    }
}

/// How a result should be announced. Payout math is identical for every
/// kind; the jackpot only changes the wording.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    PredictedWin,
    Jackpot,
    Landed,
}

impl OutcomeKind {
    pub fn of(result: &SpinResult, jackpot_payout: i64) -> Self {
        if result.predicted_correctly {
            Self::PredictedWin
        } else if result.base_payout == jackpot_payout {
            Self::Jackpot
        } else {
            Self::Landed
        }
    }
}

pub fn outcome_message(result: &SpinResult, jackpot_payout: i64) -> String {
    match OutcomeKind::of(result, jackpot_payout) {
        OutcomeKind::PredictedWin => format!(
            "Congratulations! You predicted correctly and won 2x R{} = R{}!",
            result.base_payout, result.awarded_payout
        ),
        OutcomeKind::Jackpot => format!(
            "JACKPOT! The wheel landed on R{}. You won R{}!",
            result.base_payout, result.awarded_payout
        ),
        OutcomeKind::Landed => format!(
            "The wheel landed on R{}. You won R{}!",
            result.base_payout, result.awarded_payout
        ),
    }
}

// === API Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub prediction: Option<i64>,
}

/// Body of a spin request. Omitted fields fall back to server defaults.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct WheelSpinRequest {
    // Keep in step with MIN_ROTATIONS / MAX_ROTATIONS
    #[validate(range(min = 1, max = 20))]
    pub rotation_count: Option<u32>,
    // Keep in step with MIN_SPIN_DURATION_MS / MAX_SPIN_DURATION_MS
    #[validate(range(min = 1, max = 30000))]
    pub duration_ms: Option<u64>,
    /// Land on the first segment paying this amount instead of a random one
    pub target_payout: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WheelSpinResponse {
    pub success: bool,
    pub spin_id: SpinId,
    pub is_win: bool,
    pub kind: OutcomeKind,
    pub result: SpinResult,
    pub message: String,
    pub totals: RunningTotals,
}

impl WheelSpinResponse {
    pub fn from_outcome(outcome: &SpinOutcome, jackpot_payout: i64) -> Self {
        Self {
            success: true,
            spin_id: outcome.spin_id,
            is_win: outcome.result.predicted_correctly,
            kind: OutcomeKind::of(&outcome.result, jackpot_payout),
            result: outcome.result,
            message: outcome_message(&outcome.result, jackpot_payout),
            totals: outcome.totals,
        }
    }
}

/// Either a built-in layout or a custom table.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigureRequest {
    Preset { layout: WheelLayout },
    Custom { segment_count: usize, segments: Vec<Segment> },
}

impl ConfigureRequest {
    pub fn into_table(self) -> Result<SegmentTable, ConfigError> {
        match self {
            Self::Preset { layout } => Ok(layout.table().clone()),
            Self::Custom { segment_count, segments } => SegmentTable::new(segment_count, segments),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TableResponse {
    pub segment_count: usize,
    pub segment_width: f64,
    pub segments: Vec<Segment>,
    pub distinct_payouts: Vec<i64>,
    pub jackpot_payout: i64,
}

impl From<&SegmentTable> for TableResponse {
    fn from(table: &SegmentTable) -> Self {
        Self {
            segment_count: table.segment_count(),
            segment_width: table.segment_width(),
            segments: table.segments().to_vec(),
            distinct_payouts: table.distinct_payouts(),
            jackpot_payout: table.jackpot_payout(),
        }
    }
}

/// Frames pushed to WebSocket subscribers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WheelMessage {
    SpinStarted { spin_id: SpinId, target_stop_angle: f64, rotation_count: u32, duration_ms: u64 },
    SegmentCrossed { spin_id: SpinId, index: usize },
    SpinSettled { spin_id: SpinId, result: SpinResult, message: String },
    SpinAborted { spin_id: SpinId },
    TotalsReset,
}
