//! Bobber Sim - a fishing-minigame simulator
//!
//! Core modules:
//! - `sim`: Deterministic simulation (fish motion, bar physics, catch scoring)
//!
//! The simulator advances one discrete tick per external action and reports
//! an observation, a scalar reward, and a terminal flag each tick. Rendering
//! and policy inference live outside this crate: a renderer consumes
//! [`sim::DrawState`] snapshots, a policy consumes [`sim::Observation`]
//! vectors and supplies the button input.

pub mod sim;

pub use sim::{FishSim, MotionType};

/// Pixel-space and scoring constants
pub mod consts {
    /// Height of the track the bar travels; the bar's top edge lives in
    /// `[0, TRACK_HEIGHT - bar_height]`.
    pub const TRACK_HEIGHT: f64 = 568.0;
    /// Ceiling for the fish's goal; goals live in `[GOAL_IDLE, GOAL_MAX]`.
    pub const GOAL_MAX: f64 = 548.0;
    /// Sentinel goal meaning the fish is idling with no destination.
    pub const GOAL_IDLE: f64 = -1.0;
    /// Ceiling for the fish position after integration.
    pub const TARGET_MAX: f64 = 532.0;
    /// Fish spawn position at reset.
    pub const TARGET_SPAWN: f64 = 508.0;

    /// Bar sizing: base height plus a per-level bonus.
    pub const BAR_BASE_HEIGHT: i32 = 96;
    pub const BAR_HEIGHT_PER_LEVEL: i32 = 8;
    /// Offset from `bar_position` up to the top of the catch span.
    pub const BAR_TOP_OFFSET: f64 = 32.0;
    /// Fish sprite padding inside the catch span (below/above the anchor).
    pub const TARGET_PAD_LOW: f64 = 12.0;
    pub const TARGET_PAD_HIGH: f64 = 16.0;
    /// Slack for the pinned-at-bottom containment override.
    pub const BOTTOM_PIN_SLACK: f64 = 4.0;

    /// Raw control acceleration per tick.
    pub const BAR_ACCEL: f64 = 0.25;
    /// Control damping while the fish is contained.
    pub const IN_BAR_DAMPING: f64 = 0.6;
    /// Inelastic bounce factor at the rails.
    pub const BOUNCE_FACTOR: f64 = 2.0 / 3.0;

    /// Drift bias step and limit for Sink/Floater motion.
    pub const DRIFT_STEP: f64 = 0.01;
    pub const DRIFT_LIMIT: f64 = 1.5;

    /// Catch progress: starting value, gain per contained tick, drain otherwise.
    pub const PROGRESS_START: f64 = 0.1;
    pub const PROGRESS_GAIN: f64 = 1.0 / 500.0;
    pub const PROGRESS_DRAIN: f64 = 3.0 / 1000.0;

    /// Terminal and shaping rewards.
    pub const WIN_REWARD: f64 = 50.0;
    pub const PERFECT_BONUS: f64 = 200.0;
    pub const LOSS_REWARD: f64 = -50.0;
    pub const BREAK_PERFECT_PENALTY: f64 = 10.0;
    pub const PERFECT_TICK_BONUS: f64 = 0.5;

    /// Tolerance for comparisons against rail positions. Workaround for
    /// floating-point alignment after a reflection, not a tunable.
    pub const RAIL_EPSILON: f64 = 1e-4;
}

/// Tolerance-based equality with [`consts::RAIL_EPSILON`].
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < consts::RAIL_EPSILON
}
