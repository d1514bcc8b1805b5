//! Stack Tower - A stacking tower arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (overlap cuts, box physics, game state)
//! - `renderer`: WebGPU rendering pipeline
//! - `persistence`: LocalStorage JSON helpers
//! - `tuning`: Data-driven game balance
//! - `audio`, `ui`: Browser-only sound and DOM glue

pub mod highscores;
pub mod persistence;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod ui;

pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::{Tuning, TuningError, TuningPreset};

/// Game configuration constants
pub mod consts {
    /// Simulation ticks per second
    pub const SIM_HZ: u32 = 120;
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Height of every layer (world units)
    pub const BOX_HEIGHT: f32 = 1.0;
    /// Where a fresh layer starts along its movement axis
    pub const START_OFFSET: f32 = 10.0;

    /// Overhangs thinner than this are not spawned; placement counts as perfect
    pub const PERFECT_EPSILON: f32 = 0.03;

    /// Gravity (units/s²), pointing down the Y axis
    pub const GRAVITY: f32 = -10.0;
    /// Mass of a full-size falling box before footprint scaling
    pub const OVERHANG_BASE_MASS: f32 = 5.0;
    /// Bodies falling below this height stop simulating
    pub const KILL_PLANE_Y: f32 = -40.0;

    /// Camera rise speed (units/s) while catching up with the tower
    pub const CAMERA_RISE_SPEED: f32 = 4.0;
    /// Camera orbit speed (radians/s) during the win celebration
    pub const CAMERA_ORBIT_SPEED: f32 = 0.6;
}

/// Sign of `x` as -1, 0 or 1 (unlike `f32::signum`, zero maps to zero)
#[inline]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
