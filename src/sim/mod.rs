//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One discrete tick per external action
//! - Seeded RNG only, injected at construction
//! - No rendering or platform dependencies
//!
//! Each tick is atomic: no partial update is ever observable. A single
//! `FishSim` is not meant for concurrent callers, but independent instances
//! share nothing and can run on separate threads.

pub mod state;
pub mod tick;

pub use state::{
    DrawState, EpisodePhase, FishConfig, FishSim, FishState, MotionType, Observation,
};
pub use tick::{Info, StepOutcome, StepResult};
