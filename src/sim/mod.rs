//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (balls by id, obstacles by insertion)
//! - No rendering or platform dependencies

pub mod ball;
pub mod collision;
pub mod obstacle;
pub mod world;

pub use ball::{Ball, BallId};
pub use collision::{CollisionResult, ball_circle_collision, ball_segment_collision, collide_balls};
pub use obstacle::{Booster, Bumper, Obstacle, PORTAL_COLORS, Peg, Portal, Spinner, Triangle, Wall};
pub use world::{BallView, PhysicsWorld, WorldEvent, WorldSnapshot};
