//! Marble Race - a falling-marble race through an obstacle course
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ball kinematics, obstacles, collisions, world tick)
//! - `race`: Race lifecycle, termination policy and standings
//! - `course`: Obstacle course layouts
//! - `roster`: Participant list parsing
//! - `config`: Data-driven race configuration

pub mod config;
pub mod course;
pub mod error;
pub mod race;
pub mod roster;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::RaceConfig;
pub use course::CourseKind;
pub use error::RaceError;
pub use race::{FinishReason, RaceController, RacePhase, Standing, StandingStatus};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Largest step the host may feed the world (~60 Hz)
    pub const MAX_STEP: f32 = 0.016;
    /// Race is force-ranked after this many seconds
    pub const RACE_TIME_LIMIT: f32 = 60.0;

    /// Downward acceleration (pixels/s²)
    pub const GRAVITY: f32 = 352.0;
    /// Course is this many viewports tall
    pub const COURSE_HEIGHT_FACTOR: f32 = 3.0;
    /// Finish line distance above the course bottom
    pub const FINISH_LINE_OFFSET: f32 = 70.0;
    /// Hard cap on ball speed (pixels/s)
    pub const MAX_BALL_SPEED: f32 = 2500.0;

    /// Ball defaults
    pub const BALL_RESTITUTION: f32 = 0.75;
    pub const AIR_RESISTANCE: f32 = 0.9995;
    pub const TRAIL_LENGTH: usize = 12;
    /// Position samples kept for ping-pong detection (3 s window)
    pub const POS_HISTORY_LEN: usize = 6;
    pub const POS_HISTORY_INTERVAL: f32 = 0.5;

    /// Stall detection
    pub const STUCK_SPEED: f32 = 5.0;
    pub const STUCK_MOVE: f32 = 1.0;
    pub const STUCK_TIMEOUT: f32 = 1.5;

    /// Ping-pong box (a ball confined to this box for 3 s is bounced out)
    pub const PING_PONG_RANGE_X: f32 = 100.0;
    pub const PING_PONG_RANGE_Y: f32 = 50.0;

    /// World boundary
    pub const WALL_MARGIN: f32 = 5.0;
    pub const WALL_RESTITUTION: f32 = 0.85;

    /// Line obstacles bounce with 1 + restitution * this
    pub const LINE_BOUNCE_FACTOR: f32 = 0.9;
    pub const SPINNER_THICKNESS: f32 = 5.0;
    pub const TRIANGLE_EDGE_THICKNESS: f32 = 3.0;

    /// Bumper radial kick = force * this
    pub const BUMPER_KICK: f32 = 0.05;
    /// Booster kick = force * this, every tick while touching
    pub const BOOSTER_KICK: f32 = 0.06;
    pub const PORTAL_RADIUS: f32 = 22.0;
    pub const PORTAL_COOLDOWN: f32 = 0.5;
    /// Extra gap below a portal exit so the ball does not land inside it
    pub const PORTAL_EXIT_GAP: f32 = 5.0;

    /// Ball-ball restitution (equal masses)
    pub const BALL_BALL_RESTITUTION: f32 = 0.95;

    /// Finish line: horizontal speed kept when a ball arrives
    pub const FINISH_DAMPING: f32 = 0.2;

    /// Camera keeps the leader this far down the viewport
    pub const CAMERA_LEAD: f32 = 0.35;
    pub const CAMERA_SMOOTHING: f32 = 0.08;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Rotate a vector counter-clockwise by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < 1e-6);
        assert!((normalize_angle(2.0 * PI + 0.25) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_polar_to_cartesian() {
        let p = polar_to_cartesian(2.0, PI);
        assert!((p.x + 2.0).abs() < 1e-5);
        assert!(p.y.abs() < 1e-5);
    }
}
