//! Drives a single spin of the wheel.
//!
//! The host samples the sequencer with the elapsed time of the spin at
//! whatever cadence its frame loop provides. Each sample reports at most one
//! segment crossing, and the sample at or past the spin duration settles the
//! spin on the exact planned stop angle.

use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::angle_strategy::AngleStrategy;
use crate::easing::Easing;
use crate::error::{ConfigError, WheelError};
use crate::segment_table::{validate_segment_count, SegmentTable};
use crate::wheel_resolver::{normalize_angle, segment_index_for, SpinResult};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum SpinEvent {
    SegmentCrossed(usize),
    SpinSettled(f64),
}

/// Everything needed to animate one spin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinPlan {
    /// Stop angle in [0, 360), already aligned to a segment boundary
    pub target_stop_angle: f64,
    pub rotation_count: u32,
    pub duration: Duration,
    pub segment_count: usize,
    pub easing: Easing,
}

impl SpinPlan {
    pub fn new(target_stop_angle: f64, rotation_count: u32, duration: Duration, segment_count: usize) -> Self {
        Self {
            target_stop_angle,
            rotation_count,
            duration,
            segment_count,
            easing: Easing::default(),
        }
    }

    pub fn from_strategy<S: AngleStrategy + ?Sized>(
        strategy: &mut S,
        table: &SegmentTable,
        rotation_count: u32,
        duration: Duration,
    ) -> Result<Self, WheelError> {
        let target = strategy.pick_angle(table)?;
        Ok(Self::new(target, rotation_count, duration, table.segment_count()))
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn total_rotation(&self) -> f64 {
        360.0 * self.rotation_count as f64 + self.target_stop_angle
    }

    /// Where the wheel rests once the spin settles.
    pub fn final_angle(&self) -> f64 {
        normalize_angle(self.total_rotation())
    }

    /// Absolute rotation `elapsed` into the spin.
    pub fn angle_at(&self, elapsed: Duration) -> f64 {
        if elapsed >= self.duration {
            return self.total_rotation();
        }
        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.total_rotation() * self.easing.apply(progress)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_segment_count(self.segment_count)?;
        if !(0.0..360.0).contains(&self.target_stop_angle) {
            return Err(ConfigError::TargetOutOfRange(self.target_stop_angle));
        }
        Ok(())
    }
}

/// Turns a stream of rotation samples into segment-change notifications.
#[derive(Debug, Clone)]
pub struct CrossingDetector {
    segment_count: usize,
    last_segment: Option<usize>,
}

impl CrossingDetector {
    pub fn new(segment_count: usize) -> Self {
        Self { segment_count, last_segment: None }
    }

    /// Returns the new segment when `angle` lies in a different segment than
    /// the previous sample. The first sample always reports.
    pub fn observe(&mut self, angle: f64) -> Option<usize> {
        let current = segment_index_for(angle, self.segment_count);
        if self.last_segment == Some(current) {
            return None;
        }
        self.last_segment = Some(current);
        Some(current)
    }

    pub fn last_segment(&self) -> Option<usize> {
        self.last_segment
    }
}

/// What a single sample produced. A crossing, when present, comes before
/// the settlement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinSample {
    pub angle: f64,
    pub crossed: Option<usize>,
    pub settled: Option<f64>,
}

impl SpinSample {
    pub fn events(&self) -> impl Iterator<Item = SpinEvent> {
        self.crossed
            .map(SpinEvent::SegmentCrossed)
            .into_iter()
            .chain(self.settled.map(SpinEvent::SpinSettled))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    Idle,
    Spinning,
    Settled,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Spinning { plan: SpinPlan, detector: CrossingDetector },
    Settled { final_angle: f64 },
}

#[derive(Debug, Clone)]
pub struct SpinSequencer {
    phase: Phase,
}

impl Default for SpinSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinSequencer {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn state(&self) -> SequencerState {
        match self.phase {
            Phase::Idle => SequencerState::Idle,
            Phase::Spinning { .. } => SequencerState::Spinning,
            Phase::Settled { .. } => SequencerState::Settled,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Starts a spin. Only one spin may be in flight, and a settled spin has
    /// to be consumed with [`take_settlement`](Self::take_settlement) first.
    pub fn spin(&mut self, plan: SpinPlan) -> Result<(), WheelError> {
        if !self.is_idle() {
            warn!("rejected spin request while {:?}", self.state());
            return Err(WheelError::AlreadySpinning);
        }
        plan.validate()?;
        debug!(
            "spin started: {} rotations to {} degrees over {:?}",
            plan.rotation_count, plan.target_stop_angle, plan.duration
        );
        self.phase = Phase::Spinning {
            plan,
            detector: CrossingDetector::new(plan.segment_count),
        };
        Ok(())
    }

    /// Samples the rotation `elapsed` into the current spin.
    pub fn sample(&mut self, elapsed: Duration) -> Result<SpinSample, WheelError> {
        let Phase::Spinning { plan, detector } = &mut self.phase else {
            return Err(WheelError::NotSpinning);
        };

        let angle = plan.angle_at(elapsed);
        let crossed = detector.observe(angle);
        if let Some(segment) = crossed {
            debug!("segment crossed: {segment}");
        }

        if elapsed < plan.duration {
            return Ok(SpinSample { angle, crossed, settled: None });
        }

        // Report the planned angle rather than trusting the last sample
        let final_angle = plan.final_angle();
        info!("spin settled at {final_angle} degrees");
        self.phase = Phase::Settled { final_angle };
        Ok(SpinSample { angle, crossed, settled: Some(final_angle) })
    }

    /// Hands over the final angle of a settled spin and returns to idle.
    pub fn take_settlement(&mut self) -> Option<f64> {
        match self.phase {
            Phase::Settled { final_angle } => {
                self.phase = Phase::Idle;
                Some(final_angle)
            }
            _ => None,
        }
    }

    /// Abandons an in-flight spin without settling it. Returns whether a spin
    /// was actually aborted.
    pub fn cancel(&mut self) -> bool {
        if let Phase::Spinning { .. } = self.phase {
            info!("spin aborted");
            self.phase = Phase::Idle;
            return true;
        }
        false
    }

    /// Starts a spin and returns its events as an iterator driven by the
    /// given sample instants.
    pub fn run<I>(&mut self, plan: SpinPlan, cadence: I) -> Result<SpinEvents<'_, I::IntoIter>, WheelError>
    where
        I: IntoIterator<Item = Duration>,
    {
        self.spin(plan)?;
        Ok(SpinEvents {
            sequencer: self,
            cadence: cadence.into_iter(),
            duration: plan.duration,
            pending: None,
            finished: false,
        })
    }
}

/// Lazy, finite sequence of events for one spin. Always ends with
/// [`SpinEvent::SpinSettled`]; dropping it early aborts the spin.
#[derive(Debug)]
pub struct SpinEvents<'a, I> {
    sequencer: &'a mut SpinSequencer,
    cadence: I,
    duration: Duration,
    pending: Option<SpinEvent>,
    finished: bool,
}

impl<I: Iterator<Item = Duration>> Iterator for SpinEvents<'_, I> {
    type Item = SpinEvent;

    fn next(&mut self) -> Option<SpinEvent> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }
        if self.finished {
            return None;
        }

        loop {
            // If the host stops sampling early the animation still ends
            let elapsed = self.cadence.next().unwrap_or(self.duration).min(self.duration);
            let sample = match self.sequencer.sample(elapsed) {
                Ok(sample) => sample,
                Err(_) => {
                    self.finished = true;
                    return None;
                }
            };

            if let Some(angle) = sample.settled {
                self.finished = true;
                let settled = SpinEvent::SpinSettled(angle);
                return match sample.crossed {
                    Some(segment) => {
                        self.pending = Some(settled);
                        Some(SpinEvent::SegmentCrossed(segment))
                    }
                    None => Some(settled),
                };
            }
            if let Some(segment) = sample.crossed {
                return Some(SpinEvent::SegmentCrossed(segment));
            }
        }
    }
}

impl<I> Drop for SpinEvents<'_, I> {
    fn drop(&mut self) {
        if !self.finished {
            self.sequencer.cancel();
        }
    }
}

/// Sample instants at a fixed frame interval: 0, f, 2f, ... up to and
/// including `duration`.
#[derive(Debug, Clone)]
pub struct FrameCadence {
    frame: Duration,
    next: Option<Duration>,
    end: Duration,
}

impl FrameCadence {
    pub fn fixed(frame: Duration, duration: Duration) -> Self {
        let next = if frame.is_zero() { duration } else { Duration::ZERO };
        Self { frame, next: Some(next), end: duration }
    }
}

impl Iterator for FrameCadence {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next?;
        self.next = if current >= self.end {
            None
        } else {
            Some((current + self.frame).min(self.end))
        };
        Some(current)
    }
}

/// Receives spin notifications. Called on the sampling loop, so
/// implementations must return quickly.
pub trait SpinListener {
    fn on_segment_crossed(&mut self, index: usize);
    fn on_settled(&mut self, result: &SpinResult);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn classic_plan(target: f64, rotations: u32) -> SpinPlan {
        SpinPlan::new(target, rotations, Duration::from_millis(3000), 20)
    }

    fn collect(plan: SpinPlan, frame: Duration) -> (SpinSequencer, Vec<SpinEvent>) {
        let mut sequencer = SpinSequencer::new();
        let events: Vec<SpinEvent> = sequencer
            .run(plan, FrameCadence::fixed(frame, plan.duration))
            .unwrap()
            .collect();
        (sequencer, events)
    }

    fn crossings(events: &[SpinEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                SpinEvent::SegmentCrossed(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_five_rotations_to_ninety() {
        let (mut sequencer, events) = collect(classic_plan(90.0, 5), Duration::from_millis(1));

        assert_eq!(events.last(), Some(&SpinEvent::SpinSettled(90.0)));
        assert_eq!(events.iter().filter(|e| matches!(e, SpinEvent::SpinSettled(_))).count(), 1);

        let crossed = crossings(&events);
        // Five full sweeps plus segments 0..=5 of the sixth
        assert_eq!(crossed.len(), 5 * 20 + 6);
        assert_eq!(crossed[0], 0);
        assert_eq!(*crossed.last().unwrap(), 5);
        for pair in crossed.windows(2) {
            assert_eq!(pair[1], (pair[0] + 1) % 20, "skipped or repeated a boundary");
        }
        for segment in 0..20 {
            let visits = crossed.iter().filter(|&&i| i == segment).count();
            let expected = if segment <= 5 { 6 } else { 5 };
            assert_eq!(visits, expected, "segment {segment}");
        }

        assert_eq!(sequencer.state(), SequencerState::Settled);
        assert_eq!(sequencer.take_settlement(), Some(90.0));
        assert_eq!(sequencer.state(), SequencerState::Idle);
    }

    #[test]
    fn test_wraparound_retriggers_segment_zero() {
        let mut detector = CrossingDetector::new(20);
        assert_eq!(detector.last_segment(), None);
        assert_eq!(detector.observe(0.0), Some(0));
        assert_eq!(detector.observe(5.0), None);
        assert_eq!(detector.observe(350.0), Some(19));
        assert_eq!(detector.last_segment(), Some(19));
        assert_eq!(detector.observe(361.0), Some(0));
        assert_eq!(detector.observe(362.0), None);
        assert_eq!(detector.last_segment(), Some(0));
    }

    #[test]
    fn test_coarse_cadence_drops_intermediate_crossings() {
        let (_, events) = collect(classic_plan(90.0, 5), Duration::from_millis(500));
        let crossed = crossings(&events);
        // Seven samples at most, each reporting at most one crossing
        assert!(crossed.len() <= 7);
        assert_eq!(events.last(), Some(&SpinEvent::SpinSettled(90.0)));
    }

    #[test]
    fn test_final_crossing_precedes_settlement() {
        let plan = classic_plan(90.0, 1);
        let mut sequencer = SpinSequencer::new();
        sequencer.spin(plan).unwrap();
        sequencer.sample(Duration::ZERO).unwrap();
        sequencer.sample(Duration::from_millis(2500)).unwrap();

        let last = sequencer.sample(plan.duration).unwrap();
        let events: Vec<SpinEvent> = last.events().collect();
        assert_eq!(events, vec![SpinEvent::SegmentCrossed(5), SpinEvent::SpinSettled(90.0)]);
    }

    #[test]
    fn test_second_spin_rejected_without_changing_outcome() {
        let plan = classic_plan(90.0, 5);
        let mut sequencer = SpinSequencer::new();
        sequencer.spin(plan).unwrap();
        sequencer.sample(SECOND).unwrap();

        assert_eq!(sequencer.spin(classic_plan(270.0, 2)), Err(WheelError::AlreadySpinning));
        assert_eq!(sequencer.state(), SequencerState::Spinning);

        let last = sequencer.sample(plan.duration).unwrap();
        assert_eq!(last.settled, Some(90.0));
        assert_eq!(sequencer.spin(plan), Err(WheelError::AlreadySpinning));
        assert_eq!(sequencer.take_settlement(), Some(90.0));
        assert!(sequencer.spin(plan).is_ok());
    }

    #[test]
    fn test_cancel_returns_to_idle_without_settlement() {
        let mut sequencer = SpinSequencer::new();
        sequencer.spin(classic_plan(90.0, 5)).unwrap();
        assert!(sequencer.cancel());
        assert_eq!(sequencer.state(), SequencerState::Idle);
        assert_eq!(sequencer.take_settlement(), None);
        assert_eq!(sequencer.sample(SECOND), Err(WheelError::NotSpinning));
        assert!(!sequencer.cancel());
    }

    #[test]
    fn test_dropping_events_early_aborts() {
        let plan = classic_plan(90.0, 5);
        let mut sequencer = SpinSequencer::new();
        {
            let mut events = sequencer
                .run(plan, FrameCadence::fixed(Duration::from_millis(1), plan.duration))
                .unwrap();
            assert_eq!(events.next(), Some(SpinEvent::SegmentCrossed(0)));
        }
        assert_eq!(sequencer.state(), SequencerState::Idle);
    }

    #[test]
    fn test_short_cadence_still_settles() {
        let plan = classic_plan(126.0, 2);
        let mut sequencer = SpinSequencer::new();
        let events: Vec<SpinEvent> = sequencer
            .run(plan, vec![Duration::ZERO, Duration::from_millis(10)])
            .unwrap()
            .collect();
        assert_eq!(events.last(), Some(&SpinEvent::SpinSettled(126.0)));
        assert_eq!(crossings(&events).last(), Some(&7));
    }

    #[test]
    fn test_zero_duration_settles_on_first_sample() {
        let plan = SpinPlan::new(36.0, 3, Duration::ZERO, 20);
        let mut sequencer = SpinSequencer::new();
        let sample = sequencer.sample(Duration::ZERO);
        assert_eq!(sample, Err(WheelError::NotSpinning));

        sequencer.spin(plan).unwrap();
        let sample = sequencer.sample(Duration::ZERO).unwrap();
        assert_eq!(sample.crossed, Some(2));
        assert_eq!(sample.settled, Some(36.0));
    }

    #[test]
    fn test_plan_validation() {
        let mut sequencer = SpinSequencer::new();
        let err = sequencer.spin(classic_plan(360.0, 1)).unwrap_err();
        assert_eq!(err, WheelError::Config(ConfigError::TargetOutOfRange(360.0)));
        let err = sequencer.spin(classic_plan(f64::NAN, 1)).unwrap_err();
        assert!(matches!(err, WheelError::Config(ConfigError::TargetOutOfRange(t)) if t.is_nan()));
        let err = sequencer.spin(classic_plan(-18.0, 1)).unwrap_err();
        assert_eq!(err, WheelError::Config(ConfigError::TargetOutOfRange(-18.0)));
        let err = sequencer.spin(SpinPlan::new(0.0, 1, SECOND, 7)).unwrap_err();
        assert_eq!(err, WheelError::Config(ConfigError::UnevenSegments(7)));
        assert!(sequencer.is_idle());
    }

    #[test]
    fn test_angle_curve() {
        let plan = classic_plan(90.0, 5);
        assert_eq!(plan.total_rotation(), 1890.0);
        assert_eq!(plan.angle_at(Duration::ZERO), 0.0);
        assert_eq!(plan.angle_at(plan.duration), 1890.0);
        assert_eq!(plan.angle_at(plan.duration * 2), 1890.0);
        assert!(plan.angle_at(Duration::from_millis(1500)) > 1890.0 / 2.0);
    }

    #[test]
    fn test_frame_cadence() {
        let instants: Vec<u64> = FrameCadence::fixed(Duration::from_millis(40), Duration::from_millis(100))
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(instants, vec![0, 40, 80, 100]);

        let instants: Vec<Duration> = FrameCadence::fixed(Duration::ZERO, SECOND).collect();
        assert_eq!(instants, vec![SECOND]);
    }
}
