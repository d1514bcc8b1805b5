//! Data-driven game balance
//!
//! Two presets ship with the game: `Classic` (wide boxes, endless) and
//! `Summit` (narrow, slower boxes with a win at 50 layers). Custom tuning can
//! be loaded from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a tuning file could not be used
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Named balance presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TuningPreset {
    Classic,
    #[default]
    Summit,
}

impl TuningPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            TuningPreset::Classic => "Classic",
            TuningPreset::Summit => "Summit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(TuningPreset::Classic),
            "summit" | "win" => Some(TuningPreset::Summit),
            _ => None,
        }
    }

    pub fn tuning(&self) -> Tuning {
        match self {
            TuningPreset::Classic => Tuning::classic(),
            TuningPreset::Summit => Tuning::summit(),
        }
    }
}

/// Gameplay balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Width and depth of the foundation and first layer
    pub box_size: f32,
    /// Sliding speed of the active layer (units/s)
    pub speed: f32,
    /// Distance past the tower center at which a layer counts as missed
    pub miss_distance: f32,
    /// Placed layers needed to win (None = endless)
    pub win_height: Option<u32>,
    /// Spread of the autopilot's placement error
    pub autopilot_precision: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        TuningPreset::default().tuning()
    }
}

impl Tuning {
    pub fn classic() -> Self {
        Self {
            box_size: 3.0,
            speed: 8.0,
            miss_distance: 10.0,
            win_height: None,
            autopilot_precision: 0.6,
        }
    }

    pub fn summit() -> Self {
        Self {
            box_size: 2.0,
            speed: 6.0,
            miss_distance: 10.0,
            win_height: Some(50),
            autopilot_precision: 0.4,
        }
    }

    /// Parse tuning from JSON; missing fields take the default preset's values
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Load tuning from a JSON file on disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// Clamp values into a playable range
    pub fn sanitized(mut self) -> Self {
        self.box_size = self.box_size.clamp(0.5, 8.0);
        self.speed = self.speed.clamp(0.5, 40.0);
        self.miss_distance = self.miss_distance.max(self.box_size * 2.0);
        self.autopilot_precision = self.autopilot_precision.clamp(0.0, self.box_size);
        if self.win_height == Some(0) {
            self.win_height = None;
        }
        self
    }
}
