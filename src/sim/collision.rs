//! Collision detection and response
//!
//! Every contact follows the same shape: find the penetration, push the ball
//! out along the contact normal, then scale back the normal component of the
//! velocity. Tangential velocity is left untouched.

use glam::Vec2;

use super::ball::Ball;
use crate::consts::*;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Unit normal pointing from the obstacle toward the ball centre
    pub normal: Vec2,
    /// Overlap to push out
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Ball against a solid circle
///
/// A ball centred exactly on the circle has no defined normal and is ignored.
pub fn ball_circle_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    center: Vec2,
    radius: f32,
) -> CollisionResult {
    let delta = ball_pos - center;
    let dist = delta.length();
    let min_dist = ball_radius + radius;

    if dist < min_dist && dist > 0.0 {
        CollisionResult {
            hit: true,
            normal: delta / dist,
            penetration: min_dist - dist,
        }
    } else {
        CollisionResult::miss()
    }
}

/// Ball against a thick line segment
///
/// Zero-length segments and balls centred on the segment are ignored.
pub fn ball_segment_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    a: Vec2,
    b: Vec2,
    thickness: f32,
) -> CollisionResult {
    let line_vec = b - a;
    let line_len_sq = line_vec.length_squared();
    if line_len_sq == 0.0 {
        return CollisionResult::miss();
    }

    let t = ((ball_pos - a).dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    let closest = a + line_vec * t;
    let delta = ball_pos - closest;
    let dist = delta.length();
    let min_dist = ball_radius + thickness / 2.0;

    if dist < min_dist && dist > 0.0 {
        CollisionResult {
            hit: true,
            normal: delta / dist,
            penetration: min_dist - dist,
        }
    } else {
        CollisionResult::miss()
    }
}

/// Remove the normal velocity component scaled by `bounce`
///
/// `bounce = 1` stops the ball dead along the normal, `bounce = 2` is a
/// perfect mirror reflection.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, bounce: f32) -> Vec2 {
    velocity - bounce * velocity.dot(normal) * normal
}

/// Push the ball out of the contact and reflect its velocity
pub fn resolve_contact(ball: &mut Ball, contact: &CollisionResult, bounce: f32) {
    ball.pos += contact.normal * contact.penetration;
    ball.vel = reflect_velocity(ball.vel, contact.normal, bounce);
}

/// Bounce factor for circle obstacles; `restitution` scales the ball's own
pub fn circle_bounce(ball: &Ball, restitution: f32) -> f32 {
    1.0 + restitution * ball.restitution
}

/// Bounce factor for every line obstacle
pub fn line_bounce(ball: &Ball) -> f32 {
    1.0 + ball.restitution * LINE_BOUNCE_FACTOR
}

/// Keep the ball inside the left, right and top edges of the course
///
/// There is no bottom edge; the finish line takes its place.
pub fn collide_world_bounds(ball: &mut Ball, width: f32) {
    if ball.pos.x - ball.radius < WALL_MARGIN {
        ball.pos.x = ball.radius + WALL_MARGIN;
        ball.vel.x *= -WALL_RESTITUTION;
    }
    if ball.pos.x + ball.radius > width - WALL_MARGIN {
        ball.pos.x = width - ball.radius - WALL_MARGIN;
        ball.vel.x *= -WALL_RESTITUTION;
    }
    if ball.pos.y - ball.radius < WALL_MARGIN {
        ball.pos.y = ball.radius + WALL_MARGIN;
        ball.vel.y *= -WALL_RESTITUTION;
    }
}

/// Equal-mass collision between two balls
///
/// Positions are always separated; the impulse only applies while the balls
/// are still approaching.
pub fn collide_balls(a: &mut Ball, b: &mut Ball) {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let min_dist = a.radius + b.radius;

    if dist >= min_dist || dist <= 0.0 {
        return;
    }

    let normal = delta / dist;
    let overlap = min_dist - dist;
    a.pos -= normal * overlap * 0.5;
    b.pos += normal * overlap * 0.5;

    let approach = (a.vel - b.vel).dot(normal);
    if approach > 0.0 {
        let impulse = approach * (1.0 + BALL_BALL_RESTITUTION) / 2.0;
        a.vel -= normal * impulse;
        b.vel += normal * impulse;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(x: f32, y: f32, vx: f32, vy: f32) -> Ball {
        Ball::new("b", 0, Vec2::new(x, y), Vec2::new(vx, vy), 10.0)
    }

    #[test]
    fn test_circle_collision_normal_points_to_ball() {
        let result = ball_circle_collision(Vec2::new(0.0, -15.0), 10.0, Vec2::ZERO, 8.0);
        assert!(result.hit);
        assert!((result.normal - Vec2::new(0.0, -1.0)).length() < 1e-6);
        assert!((result.penetration - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_collision_miss_and_degenerate() {
        assert!(!ball_circle_collision(Vec2::new(0.0, -30.0), 10.0, Vec2::ZERO, 8.0).hit);
        // Coincident centres have no normal
        assert!(!ball_circle_collision(Vec2::ZERO, 10.0, Vec2::ZERO, 8.0).hit);
    }

    #[test]
    fn test_segment_collision_interior() {
        let result = ball_segment_collision(
            Vec2::new(50.0, -10.0),
            10.0,
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            6.0,
        );
        assert!(result.hit);
        assert!((result.normal - Vec2::new(0.0, -1.0)).length() < 1e-6);
        assert!((result.penetration - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_segment_collision_clamps_to_endpoint() {
        let result = ball_segment_collision(
            Vec2::new(-8.0, 0.0),
            10.0,
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            6.0,
        );
        assert!(result.hit);
        assert!((result.normal - Vec2::new(-1.0, 0.0)).length() < 1e-6);
        assert!((result.penetration - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_length_segment_is_ignored() {
        let p = Vec2::new(5.0, 5.0);
        assert!(!ball_segment_collision(Vec2::new(6.0, 5.0), 10.0, p, p, 6.0).hit);
    }

    #[test]
    fn test_reflect_velocity() {
        let v = Vec2::new(3.0, 10.0);
        let n = Vec2::new(0.0, -1.0);
        let mirrored = reflect_velocity(v, n, 2.0);
        assert!((mirrored - Vec2::new(3.0, -10.0)).length() < 1e-5);
        let damped = reflect_velocity(v, n, 1.5);
        assert!((damped - Vec2::new(3.0, -5.0)).length() < 1e-5);
    }

    #[test]
    fn test_world_bounds_reflect() {
        let mut b = ball(8.0, 200.0, -100.0, 0.0);
        collide_world_bounds(&mut b, 400.0);
        assert_eq!(b.pos.x, 15.0);
        assert!((b.vel.x - 85.0).abs() < 1e-4);

        let mut b = ball(200.0, 2.0, 0.0, -40.0);
        collide_world_bounds(&mut b, 400.0);
        assert_eq!(b.pos.y, 15.0);
        assert!((b.vel.y - 34.0).abs() < 1e-4);

        // No floor
        let mut b = ball(200.0, 10_000.0, 0.0, 100.0);
        collide_world_bounds(&mut b, 400.0);
        assert_eq!(b.pos, Vec2::new(200.0, 10_000.0));
        assert_eq!(b.vel, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn test_ball_collision_head_on() {
        let mut a = ball(100.0, 100.0, 50.0, 0.0);
        let mut b = ball(115.0, 100.0, -50.0, 0.0);
        collide_balls(&mut a, &mut b);

        assert!(((b.pos - a.pos).length() - 20.0).abs() < 1e-4);
        assert!((a.vel.x - (-47.5)).abs() < 1e-3);
        assert!((b.vel.x - 47.5).abs() < 1e-3);
    }

    #[test]
    fn test_separating_balls_get_no_impulse() {
        let mut a = ball(100.0, 100.0, -50.0, 0.0);
        let mut b = ball(115.0, 100.0, 50.0, 0.0);
        collide_balls(&mut a, &mut b);
        assert!(((b.pos - a.pos).length() - 20.0).abs() < 1e-4);
        assert_eq!(a.vel.x, -50.0);
        assert_eq!(b.vel.x, 50.0);
    }

    #[test]
    fn test_apart_balls_are_untouched() {
        let mut a = ball(100.0, 100.0, 50.0, 0.0);
        let mut b = ball(130.0, 100.0, -50.0, 0.0);
        collide_balls(&mut a, &mut b);
        assert_eq!(a.pos, Vec2::new(100.0, 100.0));
        assert_eq!(b.vel, Vec2::new(-50.0, 0.0));
    }
}
