//! Ball kinematics and stall-breaking heuristics
//!
//! Pure gravity-and-bounce physics can park a ball on a flat ledge or trap it
//! bouncing between two obstacles. Two bounded, non-physical kicks get it
//! moving again so every race terminates.

use std::collections::VecDeque;
use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::polar_to_cartesian;

/// Stable handle for a ball: its index in `PhysicsWorld::balls`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallId(pub u32);

impl BallId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A racing marble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    /// Display name (duplicates allowed)
    pub name: String,
    /// 0xRRGGBB
    pub color: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub restitution: f32,
    /// Per-tick multiplicative velocity damping
    pub air_resistance: f32,
    pub finished: bool,
    /// Simulation time at which the ball became terminal
    pub finish_time: Option<f32>,
    /// Ranked by progress at a forced end or timeout
    pub timed_out: bool,
    /// Percent of the course covered, set only on forced end / timeout
    pub progress: Option<f32>,
    /// Recent positions, oldest first
    #[serde(skip)]
    pub trail: VecDeque<Vec2>,
    /// Seconds of near-zero motion
    #[serde(skip)]
    pub stuck_time: f32,
    #[serde(skip)]
    pub last_pos: Vec2,
    /// Samples taken every `POS_HISTORY_INTERVAL`, oldest first
    #[serde(skip)]
    pub pos_history: VecDeque<Vec2>,
    #[serde(skip)]
    pub pos_history_timer: f32,
}

impl Ball {
    pub fn new(name: impl Into<String>, color: u32, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            id: BallId(0),
            name: name.into(),
            color,
            pos,
            vel,
            radius,
            restitution: BALL_RESTITUTION,
            air_resistance: AIR_RESISTANCE,
            finished: false,
            finish_time: None,
            timed_out: false,
            progress: None,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
            stuck_time: 0.0,
            last_pos: pos,
            pos_history: VecDeque::with_capacity(POS_HISTORY_LEN + 1),
            pos_history_timer: 0.0,
        }
    }

    /// Integrate one tick and update stall tracking
    pub fn update(&mut self, gravity: Vec2, dt: f32) {
        if self.finished {
            self.trail.clear();
            return;
        }

        // Trail holds positions from before this step
        self.trail.push_back(self.pos);
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }

        // Semi-implicit Euler with per-tick drag
        self.vel += gravity * dt;
        self.vel *= self.air_resistance;
        self.pos += self.vel * dt;

        // Sample for ping-pong detection
        self.pos_history_timer += dt;
        if self.pos_history_timer >= POS_HISTORY_INTERVAL {
            self.pos_history_timer = 0.0;
            self.pos_history.push_back(self.pos);
            if self.pos_history.len() > POS_HISTORY_LEN {
                self.pos_history.pop_front();
            }
        }

        // Stall timer resets on any real motion
        let speed = self.vel.length();
        let moved = (self.pos - self.last_pos).length();
        if speed < STUCK_SPEED && moved < STUCK_MOVE {
            self.stuck_time += dt;
        } else {
            self.stuck_time = 0.0;
        }
        self.last_pos = self.pos;
    }

    /// True when the last 3 s of samples fit in a small box
    pub fn is_ping_ponging(&self) -> bool {
        if self.pos_history.len() < POS_HISTORY_LEN {
            return false;
        }

        let (min, max) = self.pos_history.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), &p| (min.min(p), max.max(p)),
        );
        let range = max - min;

        range.x < PING_PONG_RANGE_X && range.y < PING_PONG_RANGE_Y
    }

    /// Whether the stall timer has run out
    #[inline]
    pub fn is_stuck(&self) -> bool {
        self.stuck_time > STUCK_TIMEOUT
    }

    /// Random kick in any direction, nudged upward
    pub fn unstuck<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let angle = rng.random::<f32>() * TAU;
        let force = 150.0 + rng.random::<f32>() * 100.0;
        self.vel += polar_to_cartesian(force, angle) - Vec2::new(0.0, 50.0);
        self.stuck_time = 0.0;
        self.pos_history.clear();
    }

    /// Replace velocity with a strong kick inside a ±45° cone around straight down
    pub fn escape_ping_pong<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let angle = FRAC_PI_2 + (rng.random::<f32>() - 0.5) * FRAC_PI_2;
        let force = 300.0 + rng.random::<f32>() * 150.0;
        self.vel = polar_to_cartesian(force, angle) + Vec2::new(0.0, 200.0);
        self.pos_history.clear();
    }

    /// Percent of the way from the top of the course to `finish_line`
    pub fn progress_toward(&self, finish_line: f32) -> f32 {
        if finish_line <= 0.0 {
            return 100.0;
        }
        (self.pos.y / finish_line * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 1.0 / 60.0;

    fn ball_at(x: f32, y: f32) -> Ball {
        Ball::new("test", 0xff6b6b, Vec2::new(x, y), Vec2::ZERO, 10.0)
    }

    #[test]
    fn test_update_applies_gravity_and_damping() {
        let mut ball = ball_at(100.0, 100.0);
        ball.update(Vec2::new(0.0, GRAVITY), DT);

        let expected_vy = GRAVITY * DT * AIR_RESISTANCE;
        assert!((ball.vel.y - expected_vy).abs() < 1e-4);
        assert!((ball.pos.y - (100.0 + expected_vy * DT)).abs() < 1e-4);
        assert_eq!(ball.trail.len(), 1);
        assert_eq!(ball.trail[0], Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_trail_is_bounded() {
        let mut ball = ball_at(100.0, 100.0);
        for _ in 0..40 {
            ball.update(Vec2::new(0.0, GRAVITY), DT);
        }
        assert_eq!(ball.trail.len(), TRAIL_LENGTH);
    }

    #[test]
    fn test_finished_ball_is_frozen() {
        let mut ball = ball_at(100.0, 100.0);
        ball.vel = Vec2::new(3.0, 0.0);
        ball.trail.push_back(Vec2::ZERO);
        ball.finished = true;

        ball.update(Vec2::new(0.0, GRAVITY), DT);

        assert_eq!(ball.pos, Vec2::new(100.0, 100.0));
        assert_eq!(ball.vel, Vec2::new(3.0, 0.0));
        assert!(ball.trail.is_empty());
    }

    #[test]
    fn test_history_keeps_three_second_window() {
        let mut ball = ball_at(100.0, 100.0);
        for _ in 0..(60 * 5) {
            ball.update(Vec2::ZERO, DT);
        }
        assert_eq!(ball.pos_history.len(), POS_HISTORY_LEN);
    }

    #[test]
    fn test_resting_ball_accumulates_stuck_time() {
        let mut ball = ball_at(100.0, 100.0);
        for _ in 0..100 {
            ball.update(Vec2::ZERO, DT);
        }
        assert!(ball.is_stuck());

        ball.vel = Vec2::new(50.0, 0.0);
        ball.update(Vec2::ZERO, DT);
        assert_eq!(ball.stuck_time, 0.0);
    }

    #[test]
    fn test_ping_pong_needs_full_history() {
        let mut ball = ball_at(0.0, 0.0);
        for i in 0..5 {
            ball.pos_history.push_back(Vec2::new(i as f32, 0.0));
        }
        assert!(!ball.is_ping_ponging());

        ball.pos_history.push_back(Vec2::new(5.0, 0.0));
        assert!(ball.is_ping_ponging());
    }

    #[test]
    fn test_ping_pong_rejects_vertical_progress() {
        let mut ball = ball_at(0.0, 0.0);
        for i in 0..6 {
            ball.pos_history.push_back(Vec2::new(0.0, i as f32 * 20.0));
        }
        assert!(!ball.is_ping_ponging());
    }

    #[test]
    fn test_unstuck_kick_is_bounded() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            let mut ball = ball_at(0.0, 0.0);
            ball.stuck_time = 2.0;
            ball.pos_history.push_back(Vec2::ZERO);
            ball.unstuck(&mut rng);

            let kick = ball.vel + Vec2::new(0.0, 50.0);
            assert!(kick.length() >= 149.9 && kick.length() <= 250.1);
            assert_eq!(ball.stuck_time, 0.0);
            assert!(ball.pos_history.is_empty());
        }
    }

    #[test]
    fn test_escape_ping_pong_points_down() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..100 {
            let mut ball = ball_at(0.0, 0.0);
            ball.vel = Vec2::new(-80.0, -300.0);
            ball.escape_ping_pong(&mut rng);

            assert!(ball.vel.y > 400.0, "vy = {}", ball.vel.y);
            assert!(ball.vel.x.abs() <= 450.0 * std::f32::consts::FRAC_1_SQRT_2 + 0.1);
        }
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut ball = ball_at(0.0, -50.0);
        assert_eq!(ball.progress_toward(1000.0), 0.0);
        ball.pos.y = 500.0;
        assert!((ball.progress_toward(1000.0) - 50.0).abs() < 1e-4);
        ball.pos.y = 1500.0;
        assert_eq!(ball.progress_toward(1000.0), 100.0);
    }
}
