//! Obstacle course layouts
//!
//! Layouts are expressed in fractions of the course width and height so the
//! same course fits any viewport. `prepare_course` then shrinks obstacles for
//! narrow screens and clears bumpers/triangles out of the peg fields.

use std::f32::consts::{FRAC_PI_4, FRAC_PI_6, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::{Booster, Bumper, Obstacle, PORTAL_COLORS, Peg, Portal, Spinner, Triangle, Wall};

/// Layout width the obstacle sizes were tuned for
pub const REFERENCE_WIDTH: f32 = 600.0;
/// Largest bumper radius at scale 1
const MAX_BUMPER_RADIUS: f32 = 24.0;
/// Largest spinner length at scale 1
const MAX_SPINNER_LENGTH: f32 = 120.0;
const SPINNER_STRETCH: f32 = 1.5;
/// Largest triangle size at scale 1
const MAX_TRIANGLE_SIZE: f32 = 22.0;
/// Minimum gap between a peg and a bumper/triangle at scale 1
const PEG_CLEARANCE: f32 = 35.0;

/// Available course layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseKind {
    /// Everything at once
    #[default]
    Chaos,
    /// Bumper clusters and side rails
    Pinball,
    /// Stacked funnels and branches
    Funnel,
}

impl CourseKind {
    pub const ALL: [CourseKind; 3] = [CourseKind::Chaos, CourseKind::Pinball, CourseKind::Funnel];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseKind::Chaos => "chaos",
            CourseKind::Pinball => "pinball",
            CourseKind::Funnel => "funnel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chaos" => Some(CourseKind::Chaos),
            "pinball" => Some(CourseKind::Pinball),
            "funnel" => Some(CourseKind::Funnel),
            _ => None,
        }
    }
}

/// Emits obstacles at fractional course coordinates
struct CourseBuilder<'r, R: Rng + ?Sized> {
    w: f32,
    h: f32,
    rng: &'r mut R,
    obstacles: Vec<Obstacle>,
}

impl<'r, R: Rng + ?Sized> CourseBuilder<'r, R> {
    fn new(w: f32, h: f32, rng: &'r mut R) -> Self {
        Self {
            w,
            h,
            rng,
            obstacles: Vec::new(),
        }
    }

    fn at(&self, fx: f32, fy: f32) -> Vec2 {
        Vec2::new(self.w * fx, self.h * fy)
    }

    fn push(&mut self, obstacle: impl Into<Obstacle>) {
        self.obstacles.push(obstacle.into());
    }

    /// Five colour-coded portal pairs
    fn portals(&mut self, pairs: &[(f32, f32, f32, f32); 5]) {
        for (i, &(ax, ay, bx, by)) in pairs.iter().enumerate() {
            let portal = Portal::new(self.at(ax, ay), self.at(bx, by), PORTAL_COLORS[i]);
            self.push(portal);
        }
    }

    /// Staggered peg rows: `cols` on even rows, one fewer on odd rows
    fn peg_field(&mut self, rows: u32, cols: u32, top: f32, row_gap: f32, radius: f32) {
        let spacing = self.w / cols as f32;
        for row in 0..rows {
            let (count, offset) = if row % 2 == 0 {
                (cols, spacing / 2.0)
            } else {
                (cols - 1, spacing)
            };
            let y = top + row as f32 * row_gap;
            for col in 0..count {
                let x = offset + col as f32 * spacing;
                self.push(Peg::new(Vec2::new(x, y), radius));
            }
        }
    }

    fn bumpers(&mut self, list: &[(f32, f32, f32)]) {
        for &(fx, fy, r) in list {
            let bumper = Bumper::new(self.at(fx, fy), r);
            self.push(bumper);
        }
    }

    /// Spinners start at a random angle
    fn spinners(&mut self, list: &[(f32, f32, f32, f32)]) {
        for &(fx, fy, length, speed) in list {
            let angle = self.rng.random::<f32>() * TAU;
            let spinner = Spinner::new(self.at(fx, fy), length, speed, angle);
            self.push(spinner);
        }
    }

    /// Boosters push in a random direction fixed at creation
    fn boosters(&mut self, list: &[(f32, f32, f32)]) {
        for &(fx, fy, force) in list {
            let angle = self.rng.random::<f32>() * TAU;
            let booster = Booster::new(self.at(fx, fy), angle, force);
            self.push(booster);
        }
    }

    fn walls(&mut self, list: &[(f32, f32, f32, f32, f32)]) {
        for &(ax, ay, bx, by, thickness) in list {
            let wall = Wall::new(self.at(ax, ay), self.at(bx, by), thickness);
            self.push(wall);
        }
    }

    /// Wall from 5px inside the left (or right) edge toward the centre
    fn edge_walls(&mut self, top: f32, bottom: f32, reach: f32, thickness: f32) {
        let (w, h) = (self.w, self.h);
        self.push(Wall::new(
            Vec2::new(5.0, h * top),
            Vec2::new(w * reach, h * bottom),
            thickness,
        ));
        self.push(Wall::new(
            Vec2::new(w - 5.0, h * top),
            Vec2::new(w * (1.0 - reach), h * bottom),
            thickness,
        ));
    }

    fn triangles(&mut self, list: &[(f32, f32, f32, f32)]) {
        for &(fx, fy, size, angle) in list {
            let tri = Triangle::new(self.at(fx, fy), size, angle);
            self.push(tri);
        }
    }

    fn finish(self) -> Vec<Obstacle> {
        self.obstacles
    }
}

/// Lay out a course of `width` x `height`
pub fn build_course<R: Rng + ?Sized>(
    kind: CourseKind,
    width: f32,
    height: f32,
    rng: &mut R,
) -> Vec<Obstacle> {
    let mut b = CourseBuilder::new(width, height, rng);
    match kind {
        CourseKind::Chaos => chaos(&mut b),
        CourseKind::Pinball => pinball(&mut b),
        CourseKind::Funnel => funnel(&mut b),
    }
    let obstacles = b.finish();
    log::debug!("built {} course: {} obstacles", kind.as_str(), obstacles.len());
    obstacles
}

fn chaos<R: Rng + ?Sized>(b: &mut CourseBuilder<'_, R>) {
    let h = b.h;
    b.portals(&[
        (0.08, 0.08, 0.92, 0.22),
        (0.15, 0.35, 0.85, 0.52),
        (0.1, 0.58, 0.5, 0.72),
        (0.9, 0.75, 0.2, 0.88),
        (0.5, 0.45, 0.5, 0.82),
    ]);

    // Opening peg field
    b.peg_field(10, 9, 60.0, 42.0, 6.0);
    b.spinners(&[(0.2, 0.06, 55.0, 3.5), (0.5, 0.04, 65.0, -3.0), (0.8, 0.06, 55.0, 3.5)]);
    b.bumpers(&[(0.35, 0.1, 22.0), (0.65, 0.1, 22.0)]);

    // Bumper gauntlet
    b.bumpers(&[
        (0.15, 0.17, 24.0),
        (0.35, 0.15, 22.0),
        (0.5, 0.18, 26.0),
        (0.65, 0.15, 22.0),
        (0.85, 0.17, 24.0),
    ]);
    b.spinners(&[(0.25, 0.22, 70.0, -2.5), (0.75, 0.22, 70.0, 2.5)]);
    b.bumpers(&[(0.5, 0.25, 28.0)]);
    b.boosters(&[(0.12, 0.24, 600.0), (0.88, 0.24, 600.0)]);
    b.triangles(&[(0.2, 0.28, 24.0, FRAC_PI_6), (0.8, 0.28, 24.0, -FRAC_PI_6)]);

    // Spinner forest
    b.spinners(&[
        (0.15, 0.32, 50.0, 3.0),
        (0.35, 0.35, 60.0, -2.5),
        (0.55, 0.33, 55.0, 3.0),
        (0.75, 0.36, 60.0, -2.5),
        (0.9, 0.34, 45.0, 3.0),
    ]);
    b.peg_field(6, 7, h * 0.38, 38.0, 5.0);
    b.boosters(&[(0.1, 0.42, 650.0), (0.9, 0.42, 650.0)]);

    // Booster zone
    b.bumpers(&[(0.25, 0.48, 26.0), (0.5, 0.46, 30.0), (0.75, 0.48, 26.0)]);
    b.boosters(&[(0.15, 0.52, 700.0), (0.5, 0.54, 800.0), (0.85, 0.52, 700.0)]);
    b.spinners(&[(0.35, 0.56, 65.0, 2.5), (0.65, 0.56, 65.0, -2.5)]);
    b.walls(&[(0.2, 0.58, 0.35, 0.62, 6.0), (0.8, 0.58, 0.65, 0.62, 6.0)]);

    // Dense pegs and bumpers
    b.peg_field(8, 10, h * 0.63, 35.0, 5.0);
    b.bumpers(&[
        (0.2, 0.67, 24.0),
        (0.4, 0.7, 22.0),
        (0.6, 0.7, 22.0),
        (0.8, 0.67, 24.0),
    ]);
    b.spinners(&[(0.5, 0.73, 80.0, 3.0)]);
    b.boosters(&[(0.1, 0.74, 600.0), (0.9, 0.74, 600.0)]);

    // Final stretch
    b.edge_walls(0.76, 0.82, 0.2, 6.0);
    b.triangles(&[(0.25, 0.78, 24.0, FRAC_PI_4), (0.75, 0.78, 24.0, -FRAC_PI_4)]);
    b.bumpers(&[(0.15, 0.8, 22.0), (0.5, 0.78, 26.0), (0.85, 0.8, 22.0)]);
    b.peg_field(5, 7, h * 0.82, 28.0, 5.0);
    b.spinners(&[(0.3, 0.85, 50.0, -3.0), (0.7, 0.85, 50.0, 3.0)]);
    b.bumpers(&[(0.35, 0.88, 20.0), (0.65, 0.88, 20.0)]);
    b.boosters(&[
        (0.15, 0.92, 650.0),
        (0.35, 0.94, 700.0),
        (0.5, 0.93, 750.0),
        (0.65, 0.94, 700.0),
        (0.85, 0.92, 650.0),
    ]);
    b.triangles(&[(0.25, 0.96, 18.0, 0.0), (0.5, 0.97, 20.0, 0.0), (0.75, 0.96, 18.0, 0.0)]);
}

fn pinball<R: Rng + ?Sized>(b: &mut CourseBuilder<'_, R>) {
    let h = b.h;
    b.portals(&[
        (0.1, 0.05, 0.9, 0.18),
        (0.08, 0.3, 0.5, 0.45),
        (0.92, 0.5, 0.15, 0.68),
        (0.3, 0.75, 0.7, 0.88),
        (0.2, 0.62, 0.8, 0.38),
    ]);

    // Top bumper cluster
    b.bumpers(&[
        (0.25, 0.03, 28.0),
        (0.4, 0.05, 24.0),
        (0.5, 0.02, 26.0),
        (0.6, 0.05, 24.0),
        (0.75, 0.03, 28.0),
    ]);
    b.edge_walls(0.01, 0.1, 0.12, 8.0);
    b.spinners(&[(0.35, 0.08, 50.0, -3.0), (0.65, 0.08, 50.0, 3.0)]);

    // Pegs and spinners
    b.peg_field(8, 8, h * 0.12, 38.0, 5.0);
    b.spinners(&[(0.2, 0.18, 60.0, 2.5), (0.5, 0.16, 75.0, -3.0), (0.8, 0.18, 60.0, 2.5)]);
    b.bumpers(&[(0.35, 0.22, 22.0), (0.65, 0.22, 22.0)]);

    // Side rails
    b.edge_walls(0.25, 0.4, 0.15, 8.0);
    b.bumpers(&[
        (0.2, 0.28, 30.0),
        (0.4, 0.32, 26.0),
        (0.5, 0.28, 32.0),
        (0.6, 0.32, 26.0),
        (0.8, 0.28, 30.0),
    ]);
    b.boosters(&[(0.12, 0.35, 750.0), (0.88, 0.35, 750.0)]);
    b.spinners(&[(0.5, 0.38, 85.0, 3.0)]);
    b.triangles(&[(0.3, 0.42, 28.0, 0.0), (0.7, 0.42, 28.0, 0.0)]);

    // Spinner maze
    b.spinners(&[
        (0.15, 0.48, 55.0, -2.5),
        (0.3, 0.52, 60.0, 3.0),
        (0.5, 0.48, 70.0, -2.5),
        (0.7, 0.52, 60.0, 3.0),
        (0.85, 0.48, 55.0, -2.5),
    ]);
    b.boosters(&[(0.1, 0.52, 650.0), (0.9, 0.52, 650.0)]);
    b.peg_field(5, 6, h * 0.54, 35.0, 5.0);
    b.bumpers(&[(0.25, 0.58, 24.0), (0.5, 0.56, 28.0), (0.75, 0.58, 24.0)]);
    b.boosters(&[(0.5, 0.60, 550.0)]);

    // Flipper zone
    b.walls(&[(0.1, 0.62, 0.25, 0.72, 6.0), (0.9, 0.62, 0.75, 0.72, 6.0)]);
    b.triangles(&[(0.28, 0.68, 32.0, FRAC_PI_6), (0.72, 0.68, 32.0, -FRAC_PI_6)]);
    b.peg_field(6, 7, h * 0.65, 35.0, 5.0);
    b.bumpers(&[(0.4, 0.72, 24.0), (0.6, 0.72, 24.0)]);
    b.spinners(&[(0.5, 0.75, 70.0, -3.0)]);

    // Final stretch
    b.bumpers(&[
        (0.2, 0.8, 26.0),
        (0.35, 0.82, 22.0),
        (0.5, 0.78, 30.0),
        (0.65, 0.82, 22.0),
        (0.8, 0.8, 26.0),
    ]);
    b.spinners(&[(0.25, 0.86, 50.0, 3.0), (0.75, 0.86, 50.0, -3.0)]);
    b.boosters(&[(0.12, 0.84, 600.0), (0.88, 0.84, 600.0)]);
    b.boosters(&[
        (0.15, 0.91, 600.0),
        (0.3, 0.93, 700.0),
        (0.5, 0.92, 750.0),
        (0.7, 0.93, 700.0),
        (0.85, 0.91, 600.0),
    ]);
    b.triangles(&[
        (0.15, 0.96, 20.0, FRAC_PI_4),
        (0.5, 0.97, 22.0, 0.0),
        (0.85, 0.96, 20.0, -FRAC_PI_4),
    ]);
}

fn funnel<R: Rng + ?Sized>(b: &mut CourseBuilder<'_, R>) {
    let h = b.h;
    b.portals(&[
        (0.08, 0.06, 0.92, 0.2),
        (0.12, 0.32, 0.88, 0.48),
        (0.1, 0.55, 0.5, 0.7),
        (0.9, 0.72, 0.25, 0.88),
        (0.3, 0.42, 0.7, 0.78),
    ]);

    // Top funnel over a dense peg field
    b.edge_walls(0.005, 0.06, 0.18, 6.0);
    b.spinners(&[(0.5, 0.03, 50.0, 3.0)]);
    b.peg_field(8, 8, h * 0.045, 28.0, 5.0);
    b.bumpers(&[(0.25, 0.14, 18.0), (0.5, 0.13, 20.0), (0.75, 0.14, 18.0)]);

    // Second funnel
    b.walls(&[(0.08, 0.15, 0.28, 0.22, 6.0), (0.92, 0.15, 0.72, 0.22, 6.0)]);
    b.spinners(&[(0.25, 0.19, 50.0, -2.5), (0.75, 0.19, 50.0, 2.5)]);
    b.bumpers(&[(0.5, 0.21, 22.0)]);
    b.triangles(&[(0.35, 0.24, 20.0, 0.0), (0.65, 0.24, 20.0, 0.0)]);

    // Three-way split
    b.walls(&[
        (0.15, 0.26, 0.3, 0.36, 6.0),
        (0.85, 0.26, 0.7, 0.36, 6.0),
        (0.42, 0.28, 0.42, 0.35, 5.0),
        (0.58, 0.28, 0.58, 0.35, 5.0),
    ]);
    b.bumpers(&[(0.28, 0.32, 16.0), (0.5, 0.30, 18.0), (0.72, 0.32, 16.0)]);
    b.spinners(&[(0.28, 0.37, 40.0, 3.0), (0.5, 0.38, 45.0, -2.5), (0.72, 0.37, 40.0, 3.0)]);
    b.boosters(&[(0.2, 0.36, 550.0), (0.8, 0.36, 550.0)]);

    // Bumper field and pegs
    b.bumpers(&[
        (0.15, 0.42, 18.0),
        (0.35, 0.44, 16.0),
        (0.5, 0.42, 20.0),
        (0.65, 0.44, 16.0),
        (0.85, 0.42, 18.0),
    ]);
    b.boosters(&[(0.1, 0.48, 700.0), (0.5, 0.45, 600.0), (0.9, 0.48, 700.0)]);
    b.peg_field(6, 7, h * 0.46, 26.0, 5.0);

    // Spinner zone
    b.spinners(&[
        (0.15, 0.54, 50.0, 3.0),
        (0.35, 0.57, 55.0, -2.5),
        (0.5, 0.54, 60.0, 3.0),
        (0.65, 0.57, 55.0, -2.5),
        (0.85, 0.54, 50.0, 3.0),
    ]);
    b.boosters(&[(0.25, 0.56, 500.0), (0.75, 0.56, 500.0)]);
    b.edge_walls(0.58, 0.64, 0.2, 6.0);
    b.bumpers(&[(0.35, 0.62, 16.0), (0.65, 0.62, 16.0)]);

    // Dense pegs
    b.peg_field(8, 9, h * 0.64, 30.0, 5.0);
    b.spinners(&[(0.25, 0.70, 45.0, -2.0), (0.5, 0.68, 50.0, 2.5), (0.75, 0.70, 45.0, -2.0)]);
    b.boosters(&[(0.15, 0.73, 600.0), (0.85, 0.73, 600.0)]);

    // Last funnel
    b.walls(&[(0.08, 0.76, 0.28, 0.84, 6.0), (0.92, 0.76, 0.72, 0.84, 6.0)]);
    b.triangles(&[(0.32, 0.80, 20.0, 0.0), (0.68, 0.80, 20.0, 0.0)]);
    b.bumpers(&[(0.5, 0.78, 20.0)]);
    b.spinners(&[(0.4, 0.84, 45.0, 2.5), (0.6, 0.84, 45.0, -2.5)]);
    b.boosters(&[(0.5, 0.82, 500.0)]);

    // Bottom
    b.bumpers(&[
        (0.2, 0.88, 18.0),
        (0.35, 0.90, 16.0),
        (0.5, 0.87, 20.0),
        (0.65, 0.90, 16.0),
        (0.8, 0.88, 18.0),
    ]);
    b.boosters(&[
        (0.12, 0.92, 600.0),
        (0.28, 0.94, 700.0),
        (0.5, 0.95, 750.0),
        (0.72, 0.94, 700.0),
        (0.88, 0.92, 600.0),
    ]);
    b.spinners(&[(0.15, 0.96, 30.0, 3.0), (0.85, 0.96, 30.0, -3.0)]);
    b.triangles(&[(0.35, 0.97, 16.0, 0.0), (0.65, 0.97, 16.0, 0.0)]);
}

/// Fit a layout to the viewport scale and clear space around pegs
pub fn prepare_course(mut obstacles: Vec<Obstacle>, scale: f32) -> Vec<Obstacle> {
    for obs in &mut obstacles {
        match obs {
            Obstacle::Peg(p) => p.radius *= scale,
            Obstacle::Bumper(b) => b.radius = (b.radius * scale).min(MAX_BUMPER_RADIUS * scale),
            Obstacle::Portal(p) => p.radius *= scale,
            Obstacle::Booster(b) => b.radius *= scale,
            Obstacle::Spinner(s) => {
                s.length = (s.length * scale * SPINNER_STRETCH).min(MAX_SPINNER_LENGTH * scale);
            }
            Obstacle::Triangle(t) => t.size = (t.size * scale).min(MAX_TRIANGLE_SIZE * scale),
            Obstacle::Wall(_) => {}
        }
    }

    let pegs: Vec<(Vec2, f32)> = obstacles
        .iter()
        .filter_map(|obs| match obs {
            Obstacle::Peg(p) => Some((p.pos, p.radius)),
            _ => None,
        })
        .collect();
    let clearance = PEG_CLEARANCE * scale;

    let before = obstacles.len();
    obstacles.retain(|obs| {
        let (pos, size) = match obs {
            Obstacle::Bumper(b) => (b.pos, b.radius),
            Obstacle::Triangle(t) => (t.center, t.size),
            _ => return true,
        };
        pegs.iter()
            .all(|&(peg_pos, peg_radius)| pos.distance(peg_pos) >= peg_radius + size + clearance)
    });
    log::debug!(
        "prepared course at scale {scale:.2}: removed {} crowded obstacles",
        before - obstacles.len()
    );

    obstacles
}
