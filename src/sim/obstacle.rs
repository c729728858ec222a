//! Course obstacles
//!
//! A closed set of variants dispatched by `match` in the world tick. Only
//! pegs are ever removed; spinners rotate in place and portals keep a
//! per-ball cooldown, everything else is fixed geometry.

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::BallId;
use crate::consts::*;
use crate::{normalize_angle, polar_to_cartesian};

/// Portal pair colours, cycled by layouts
pub const PORTAL_COLORS: [u32; 5] = [0x00d4ff, 0xff6b9d, 0xa855f7, 0x10ac84, 0xffd93d];

/// Small consumable pin, destroyed at the end of the tick it is first hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peg {
    pub pos: Vec2,
    pub radius: f32,
    #[serde(skip)]
    pub hit: bool,
}

impl Peg {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self { pos, radius, hit: false }
    }
}

/// Springy circle that adds a radial kick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bumper {
    pub pos: Vec2,
    pub radius: f32,
    pub force: f32,
    /// Last contact time (visual pulse only)
    #[serde(skip)]
    pub hit_time: f32,
}

impl Bumper {
    pub const DEFAULT_FORCE: f32 = 600.0;

    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            radius,
            force: Self::DEFAULT_FORCE,
            hit_time: 0.0,
        }
    }
}

/// Rotating bar centred on a pivot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spinner {
    pub pivot: Vec2,
    pub length: f32,
    /// Angular speed (radians/sec, sign = direction)
    pub speed: f32,
    /// Current angle, advanced every tick
    pub angle: f32,
}

impl Spinner {
    pub fn new(pivot: Vec2, length: f32, speed: f32, angle: f32) -> Self {
        Self {
            pivot,
            length,
            speed,
            angle: normalize_angle(angle),
        }
    }

    pub fn rotate(&mut self, dt: f32) {
        self.angle = normalize_angle(self.angle + self.speed * dt);
    }

    /// Both ends of the bar
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        let half = polar_to_cartesian(self.length / 2.0, self.angle);
        (self.pivot - half, self.pivot + half)
    }
}

/// Two linked mouths; touching one moves the ball just below the other
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portal {
    pub a: Vec2,
    pub b: Vec2,
    pub radius: f32,
    pub color: u32,
    /// Last teleport time per ball
    #[serde(skip)]
    pub cooldown: HashMap<BallId, f32>,
}

impl Portal {
    pub fn new(a: Vec2, b: Vec2, color: u32) -> Self {
        Self {
            a,
            b,
            radius: PORTAL_RADIUS,
            color,
            cooldown: HashMap::new(),
        }
    }

    /// Whether `ball` may teleport through this portal at `time`
    pub fn is_ready(&self, ball: BallId, time: f32) -> bool {
        self.cooldown
            .get(&ball)
            .is_none_or(|&last| time - last >= PORTAL_COOLDOWN)
    }
}

/// Pad that pushes in a fixed direction every tick a ball touches it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booster {
    pub pos: Vec2,
    /// Push direction, fixed at creation
    pub angle: f32,
    pub force: f32,
    pub radius: f32,
    #[serde(skip)]
    pub hit_time: f32,
}

impl Booster {
    pub const RADIUS: f32 = 18.0;

    pub fn new(pos: Vec2, angle: f32, force: f32) -> Self {
        Self {
            pos,
            angle,
            force,
            radius: Self::RADIUS,
            hit_time: 0.0,
        }
    }

    /// Velocity added per tick of contact
    pub fn kick(&self) -> Vec2 {
        polar_to_cartesian(self.force * BOOSTER_KICK, self.angle)
    }
}

/// Static thick line segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub a: Vec2,
    pub b: Vec2,
    pub thickness: f32,
}

impl Wall {
    pub fn new(a: Vec2, b: Vec2, thickness: f32) -> Self {
        Self { a, b, thickness }
    }
}

/// Equilateral triangle; vertices derived from centre, size and angle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Triangle {
    pub center: Vec2,
    /// Centre-to-vertex distance
    pub size: f32,
    pub angle: f32,
}

impl Triangle {
    pub fn new(center: Vec2, size: f32, angle: f32) -> Self {
        Self { center, size, angle }
    }

    /// First vertex points up at angle 0
    pub fn vertices(&self) -> [Vec2; 3] {
        std::array::from_fn(|i| {
            let a = self.angle + i as f32 * TAU / 3.0 - FRAC_PI_2;
            self.center + polar_to_cartesian(self.size, a)
        })
    }

    pub fn edges(&self) -> [(Vec2, Vec2); 3] {
        let v = self.vertices();
        [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])]
    }
}

/// Any course obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Obstacle {
    Peg(Peg),
    Bumper(Bumper),
    Spinner(Spinner),
    Portal(Portal),
    Booster(Booster),
    Wall(Wall),
    Triangle(Triangle),
}

impl Obstacle {
    /// Representative position (centre, pivot, or first endpoint)
    pub fn anchor(&self) -> Vec2 {
        match self {
            Obstacle::Peg(p) => p.pos,
            Obstacle::Bumper(b) => b.pos,
            Obstacle::Spinner(s) => s.pivot,
            Obstacle::Portal(p) => p.a,
            Obstacle::Booster(b) => b.pos,
            Obstacle::Wall(w) => w.a,
            Obstacle::Triangle(t) => t.center,
        }
    }

    /// Display colour (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            Obstacle::Peg(_) => 0xffffff,
            Obstacle::Bumper(_) => 0xff6b6b,
            Obstacle::Spinner(_) => 0xffd700,
            Obstacle::Portal(p) => p.color,
            Obstacle::Booster(_) => 0x10ac84,
            Obstacle::Wall(_) => 0xffffff,
            Obstacle::Triangle(_) => 0xff9f43,
        }
    }

    /// Pegs that were hit this tick
    #[inline]
    pub fn is_spent(&self) -> bool {
        matches!(self, Obstacle::Peg(Peg { hit: true, .. }))
    }
}

impl From<Peg> for Obstacle {
    fn from(p: Peg) -> Self {
        Obstacle::Peg(p)
    }
}

impl From<Bumper> for Obstacle {
    fn from(b: Bumper) -> Self {
        Obstacle::Bumper(b)
    }
}

impl From<Spinner> for Obstacle {
    fn from(s: Spinner) -> Self {
        Obstacle::Spinner(s)
    }
}

impl From<Portal> for Obstacle {
    fn from(p: Portal) -> Self {
        Obstacle::Portal(p)
    }
}

impl From<Booster> for Obstacle {
    fn from(b: Booster) -> Self {
        Obstacle::Booster(b)
    }
}

impl From<Wall> for Obstacle {
    fn from(w: Wall) -> Self {
        Obstacle::Wall(w)
    }
}

impl From<Triangle> for Obstacle {
    fn from(t: Triangle) -> Self {
        Obstacle::Triangle(t)
    }
}
