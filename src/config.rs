//! Race configuration
//!
//! Loaded from JSON by the host; every field falls back to its default.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::course::CourseKind;
use crate::error::RaceError;

/// Tunables for one race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// RNG seed; `None` lets the host pick one
    pub seed: Option<u64>,
    /// Obstacle layout
    pub course: CourseKind,
    /// Viewport width (course width)
    pub view_width: f32,
    /// Viewport height (course is three of these tall)
    pub view_height: f32,
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    /// Largest step fed to the world per frame
    pub max_step: f32,
    /// Seconds before unfinished balls are ranked by progress
    pub time_limit: f32,
    /// Velocity clamp for every ball
    pub max_ball_speed: f32,
    /// First to arrive wins; `false` reverses the displayed order
    pub first_wins: bool,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            seed: None,
            course: CourseKind::default(),
            view_width: 600.0,
            view_height: 700.0,
            gravity: GRAVITY,
            max_step: MAX_STEP,
            time_limit: RACE_TIME_LIMIT,
            max_ball_speed: MAX_BALL_SPEED,
            first_wins: true,
        }
    }
}

impl RaceConfig {
    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self, RaceError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, RaceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), RaceError> {
        let positive = [
            ("view_width", self.view_width),
            ("view_height", self.view_height),
            ("max_step", self.max_step),
            ("time_limit", self.time_limit),
            ("max_ball_speed", self.max_ball_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(RaceError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !self.gravity.is_finite() {
            return Err(RaceError::InvalidConfig("gravity must be finite".into()));
        }
        Ok(())
    }

    /// Viewport scale relative to the 600px reference layout
    pub fn scale(&self) -> f32 {
        (self.view_width / crate::course::REFERENCE_WIDTH).min(1.0)
    }
}
