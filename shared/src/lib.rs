//! Prize wheel engine shared by the backend and any other host.
//!
//! [`wheel_resolver`] maps a settled angle to a prize, [`spin_sequencer`]
//! turns a scripted rotation into segment-crossing events, and
//! [`shared_wheel_game`] ties both to a player session.

pub mod angle_strategy;
pub mod constants;
pub mod easing;
pub mod error;
pub mod running_totals;
pub mod segment_table;
pub mod shared_wheel_game;
pub mod spin_sequencer;
pub mod wheel_resolver;

pub use error::{ConfigError, WheelError};
pub use running_totals::RunningTotals;
pub use segment_table::{Segment, SegmentColor, SegmentTable};
pub use spin_sequencer::{SpinEvent, SpinListener, SpinPlan, SpinSequencer};
pub use wheel_resolver::{normalize_angle, SpinResult, WheelResolver};
