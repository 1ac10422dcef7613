//! Simulation state and core types
//!
//! All state that must persist across ticks lives here. Per-tick temporaries
//! (the fish's pursuit acceleration, the player's button input) are locals of
//! the tick, never fields.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Behavioral profile governing how the fish seeks new goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MotionType {
    /// Occasional re-targeting, no bias.
    #[default]
    Mixed,
    /// Independently re-rolls large jumps, scaled up by difficulty.
    Dart,
    /// Only re-targets from idle; glides between goals.
    Smooth,
    /// Accumulates a downward drift bias.
    Sink,
    /// Accumulates an upward drift bias.
    Floater,
}

impl MotionType {
    /// Every profile, in wire order.
    pub const ALL: [MotionType; 5] = [
        MotionType::Mixed,
        MotionType::Dart,
        MotionType::Smooth,
        MotionType::Sink,
        MotionType::Floater,
    ];

    /// Decode the wire integer used by external callers.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Wire integer for this profile.
    pub fn index(self) -> u8 {
        match self {
            MotionType::Mixed => 0,
            MotionType::Dart => 1,
            MotionType::Smooth => 2,
            MotionType::Sink => 3,
            MotionType::Floater => 4,
        }
    }
}

/// Per-episode parameters, fixed at reset.
///
/// Values are accepted as-is; out-of-range input produces degenerate but
/// well-defined behavior rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FishConfig {
    /// Player skill tier; sizes the bar (7-12 typical).
    pub level: i32,
    /// Fish behavioral profile.
    pub motion_type: MotionType,
    /// Fish resistance, 0-130.
    pub difficulty: i32,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            level: 10,
            motion_type: MotionType::Mixed,
            difficulty: 100,
        }
    }
}

/// Mutable simulation state, advanced one tick at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishState {
    /// Vertical extent of the catch bar; fixed per episode.
    pub bar_height: f64,
    /// Fish position in `[0, TARGET_MAX]`.
    pub target_position: f64,
    /// Fish destination in `[GOAL_IDLE, GOAL_MAX]`; `GOAL_IDLE` means no goal.
    pub target_goal: f64,
    /// Fish speed toward its goal.
    pub target_velocity: f64,
    /// Slow bias accumulated by Sink/Floater motion, in `[-1.5, 1.5]`.
    pub drift_accel: f64,
    /// Top of the bar in `[0, TRACK_HEIGHT - bar_height]`.
    pub bar_position: f64,
    /// Bar speed; reflected (damped) on rail collision.
    pub bar_velocity: f64,
    /// Whether the fish currently sits inside the bar's catch span.
    pub in_bar: bool,
    /// Catch progress; win at >= 1, loss at <= 0.
    pub progress: f64,
    /// True until the fish first leaves the bar, then false for the episode.
    pub perfect: bool,
}

impl FishState {
    fn initial(config: &FishConfig) -> Self {
        let bar_height = f64::from(BAR_BASE_HEIGHT + config.level * BAR_HEIGHT_PER_LEVEL);
        Self {
            bar_height,
            target_position: TARGET_SPAWN,
            target_goal: (100.0 - f64::from(config.difficulty)) / 100.0 * GOAL_MAX,
            target_velocity: 0.0,
            drift_accel: 0.0,
            bar_position: TRACK_HEIGHT - bar_height,
            bar_velocity: 0.0,
            in_bar: true,
            progress: PROGRESS_START,
            perfect: true,
        }
    }
}

/// Episode lifecycle. `Won` and `Lost` are absorbing; only a reset leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EpisodePhase {
    #[default]
    Running,
    Won,
    Lost,
}

/// The state vector handed to the policy collaborator.
///
/// Units are pixel-space except inside [`StepOutcome::Won`], where the three
/// positional fields arrive divided by `TRACK_HEIGHT`.
///
/// [`StepOutcome::Won`]: super::tick::StepOutcome::Won
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub bar_height: f64,
    pub target_position: f64,
    pub bar_position: f64,
    pub in_bar: bool,
    pub bar_velocity: f64,
    pub progress: f64,
    pub perfect: bool,
}

impl Observation {
    /// Flatten to the 7-element vector a policy network consumes.
    pub fn as_vector(&self) -> [f64; 7] {
        [
            self.bar_height,
            self.target_position,
            self.bar_position,
            f64::from(self.in_bar),
            self.bar_velocity,
            self.progress,
            f64::from(self.perfect),
        ]
    }
}

/// Snapshot consumed by the rendering collaborator every frame.
/// Pixel-space values, no normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawState {
    pub bar_height: f64,
    pub target_position: f64,
    pub bar_position: f64,
    pub progress: f64,
}

/// The simulation engine: episode config, mutable state, and a seeded RNG.
///
/// The RNG is injected at construction so trajectories replay exactly from a
/// seed; the engine never reaches for process-wide randomness.
#[derive(Debug, Clone)]
pub struct FishSim {
    pub config: FishConfig,
    pub state: FishState,
    pub phase: EpisodePhase,
    pub(super) rng: Pcg32,
}

impl FishSim {
    /// Create an engine seeded with `seed`, reset to the default episode
    /// (level 10, Mixed motion, difficulty 100).
    pub fn new(seed: u64) -> Self {
        Self::from_rng(Pcg32::seed_from_u64(seed))
    }

    /// Create an engine driven by an explicit RNG.
    pub fn from_rng(rng: Pcg32) -> Self {
        let config = FishConfig::default();
        let state = FishState::initial(&config);
        Self {
            config,
            state,
            phase: EpisodePhase::Running,
            rng,
        }
    }

    /// (Re)initialize the episode. Inputs are accepted as-is, unvalidated.
    pub fn reset(&mut self, level: i32, motion_type: MotionType, difficulty: i32) {
        self.config = FishConfig {
            level,
            motion_type,
            difficulty,
        };
        self.state = FishState::initial(&self.config);
        self.phase = EpisodePhase::Running;
        log::debug!("reset: level {level}, {motion_type:?} motion, difficulty {difficulty}");
    }

    /// Reset with uniformly sampled parameters: level 7-12, any motion type,
    /// difficulty 40-130. Returns the initial observation, raw units.
    pub fn reset_randomly(&mut self) -> Observation {
        let level = self.rng.random_range(7..=12);
        let motion_type = MotionType::ALL[self.rng.random_range(0..MotionType::ALL.len())];
        let difficulty = self.rng.random_range(40..=130);
        self.reset(level, motion_type, difficulty);
        self.observation()
    }

    /// Current raw (pixel-space) observation. Pure read.
    pub fn observation(&self) -> Observation {
        Observation {
            bar_height: self.state.bar_height,
            target_position: self.state.target_position,
            bar_position: self.state.bar_position,
            in_bar: self.state.in_bar,
            bar_velocity: self.state.bar_velocity,
            progress: self.state.progress,
            perfect: self.state.perfect,
        }
    }

    /// Observation with positional fields divided by `TRACK_HEIGHT`; used by
    /// the win branch only.
    pub(super) fn normalized_observation(&self) -> Observation {
        Observation {
            bar_height: self.state.bar_height / TRACK_HEIGHT,
            target_position: self.state.target_position / TRACK_HEIGHT,
            bar_position: self.state.bar_position / TRACK_HEIGHT,
            ..self.observation()
        }
    }

    /// Snapshot for the renderer. Pure read; idempotent between ticks.
    pub fn draw_state(&self) -> DrawState {
        DrawState {
            bar_height: self.state.bar_height,
            target_position: self.state.target_position,
            bar_position: self.state.bar_position,
            progress: self.state.progress,
        }
    }
}
