//! Physics world and fixed-step tick
//!
//! Owns every ball and obstacle, advances the simulation clock, records
//! finish-line arrivals in order and smooths a camera toward the leader.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::ball::{Ball, BallId};
use super::collision::{
    ball_circle_collision, ball_segment_collision, circle_bounce, collide_balls,
    collide_world_bounds, line_bounce, resolve_contact,
};
use super::obstacle::Obstacle;
use crate::consts::*;

/// Something that happened during a tick, for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorldEvent {
    BallFinished { ball: BallId, time: f32 },
    PegBroken { pos: Vec2 },
    BumperHit { ball: BallId, pos: Vec2 },
    BoosterFired { ball: BallId, pos: Vec2 },
    Teleported { ball: BallId, from: Vec2, to: Vec2 },
}

/// Per-frame ball data for a renderer
#[derive(Debug, Clone, Serialize)]
pub struct BallView<'a> {
    pub id: BallId,
    pub name: &'a str,
    pub color: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub finished: bool,
    pub trail: Vec<Vec2>,
}

/// Read-only view of the world after a tick
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot<'a> {
    pub width: f32,
    pub height: f32,
    pub finish_line: f32,
    pub camera_y: f32,
    pub time: f32,
    pub balls: Vec<BallView<'a>>,
    pub obstacles: &'a [Obstacle],
    pub rankings: &'a [BallId],
}

/// The simulation world
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    pub width: f32,
    /// Visible viewport height
    pub view_height: f32,
    /// Full course height (several viewports)
    pub height: f32,
    pub gravity: Vec2,
    pub finish_line: f32,
    /// Velocity clamp applied after obstacle contacts
    pub max_ball_speed: f32,
    pub balls: Vec<Ball>,
    pub obstacles: Vec<Obstacle>,
    /// Arrival / termination order
    pub rankings: Vec<BallId>,
    /// Simulation clock (seconds)
    pub time: f32,
    pub camera_y: f32,
    rng: Pcg32,
    events: Vec<WorldEvent>,
}

impl PhysicsWorld {
    /// Create an empty world for a viewport of `width` x `view_height`
    pub fn new(width: f32, view_height: f32, rng: Pcg32) -> Self {
        let height = view_height * COURSE_HEIGHT_FACTOR;
        Self {
            width,
            view_height,
            height,
            gravity: Vec2::new(0.0, GRAVITY),
            finish_line: height - FINISH_LINE_OFFSET,
            max_ball_speed: MAX_BALL_SPEED,
            balls: Vec::new(),
            obstacles: Vec::new(),
            rankings: Vec::new(),
            time: 0.0,
            camera_y: 0.0,
            rng,
            events: Vec::new(),
        }
    }

    /// Add a ball; its id is its index
    pub fn add_ball(&mut self, mut ball: Ball) -> BallId {
        let id = BallId(self.balls.len() as u32);
        ball.id = id;
        self.balls.push(ball);
        id
    }

    pub fn add_obstacle(&mut self, obstacle: impl Into<Obstacle>) {
        self.obstacles.push(obstacle.into());
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(id.index())
    }

    /// Non-finished ball furthest down the course
    pub fn leading_ball(&self) -> Option<&Ball> {
        self.balls
            .iter()
            .filter(|b| !b.finished)
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
    }

    /// Every ball has reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.balls.iter().all(|b| b.finished)
    }

    /// Balls still racing
    pub fn racing_count(&self) -> usize {
        self.balls.iter().filter(|b| !b.finished).count()
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        let time = self.time;

        // Rotate spinners before anything touches them
        for obs in &mut self.obstacles {
            if let Obstacle::Spinner(spinner) = obs {
                spinner.rotate(dt);
            }
        }

        for ball in &mut self.balls {
            if ball.finished {
                continue;
            }

            // Move, then keep inside the side and top edges
            ball.update(self.gravity, dt);
            collide_world_bounds(ball, self.width);

            for obs in &mut self.obstacles {
                collide_obstacle(ball, obs, time, &mut self.events);
            }
            // Bumpers and boosters add energy
            ball.vel = ball.vel.clamp_length_max(self.max_ball_speed);

            // Crossed the finish line: freeze and rank
            if ball.pos.y + ball.radius >= self.finish_line {
                ball.finished = true;
                ball.finish_time = Some(time);
                ball.pos.y = self.finish_line - ball.radius;
                ball.vel = Vec2::new(ball.vel.x * FINISH_DAMPING, 0.0);
                ball.trail.clear();
                self.rankings.push(ball.id);
                self.events.push(WorldEvent::BallFinished { ball: ball.id, time });
                log::debug!(
                    "{} finished #{} at {:.2}s",
                    ball.name,
                    self.rankings.len(),
                    time
                );
                continue;
            }

            // Kick balls that stopped or are bouncing in place
            if ball.is_stuck() {
                log::debug!("{} stuck at {:?}, kicking", ball.name, ball.pos);
                ball.unstuck(&mut self.rng);
            }
            if ball.is_ping_ponging() {
                log::debug!("{} ping-ponging at {:?}, escaping", ball.name, ball.pos);
                ball.escape_ping_pong(&mut self.rng);
            }
        }

        // Ball-ball contacts, each pair once
        for i in 0..self.balls.len() {
            let (head, tail) = self.balls.split_at_mut(i + 1);
            let a = &mut head[i];
            if a.finished {
                continue;
            }
            for b in tail.iter_mut().filter(|b| !b.finished) {
                collide_balls(a, b);
            }
        }

        // Drop pegs that took their last hit
        for obs in &self.obstacles {
            if obs.is_spent() {
                self.events.push(WorldEvent::PegBroken { pos: obs.anchor() });
            }
        }
        self.obstacles.retain(|obs| !obs.is_spent());

        self.update_camera();
    }

    /// Ease the camera toward the leading ball
    pub fn update_camera(&mut self) {
        let Some(leader_y) = self.leading_ball().map(|b| b.pos.y) else {
            return;
        };
        let target = leader_y - self.view_height * CAMERA_LEAD;
        self.camera_y += (target - self.camera_y) * CAMERA_SMOOTHING;
        let max_y = (self.height - self.view_height).max(0.0);
        self.camera_y = self.camera_y.clamp(0.0, max_y);
    }

    /// Terminate every still-racing ball, most progressed first
    ///
    /// Returns the ids appended to `rankings`, in order.
    pub fn finish_by_progress(&mut self) -> Vec<BallId> {
        let mut racing: Vec<BallId> = self
            .balls
            .iter()
            .filter(|b| !b.finished)
            .map(|b| b.id)
            .collect();
        racing.sort_by(|&a, &b| {
            let ya = self.balls[a.index()].pos.y;
            let yb = self.balls[b.index()].pos.y;
            yb.total_cmp(&ya)
        });

        for &id in &racing {
            let finish_line = self.finish_line;
            let ball = &mut self.balls[id.index()];
            ball.finished = true;
            ball.timed_out = true;
            ball.finish_time = Some(self.time);
            ball.progress = Some(ball.progress_toward(finish_line));
            ball.trail.clear();
            self.rankings.push(id);
        }

        racing
    }

    /// Read-only view for rendering
    pub fn snapshot(&self) -> WorldSnapshot<'_> {
        WorldSnapshot {
            width: self.width,
            height: self.height,
            finish_line: self.finish_line,
            camera_y: self.camera_y,
            time: self.time,
            balls: self
                .balls
                .iter()
                .map(|b| BallView {
                    id: b.id,
                    name: &b.name,
                    color: b.color,
                    pos: b.pos,
                    radius: b.radius,
                    finished: b.finished,
                    trail: b.trail.iter().copied().collect(),
                })
                .collect(),
            obstacles: &self.obstacles,
            rankings: &self.rankings,
        }
    }
}

/// Resolve one ball against one obstacle
fn collide_obstacle(ball: &mut Ball, obs: &mut Obstacle, time: f32, events: &mut Vec<WorldEvent>) {
    match obs {
        Obstacle::Peg(peg) => {
            let contact = ball_circle_collision(ball.pos, ball.radius, peg.pos, peg.radius);
            if contact.hit {
                let bounce = circle_bounce(ball, ball.restitution);
                resolve_contact(ball, &contact, bounce);
                peg.hit = true;
            }
        }
        Obstacle::Bumper(bumper) => {
            let contact = ball_circle_collision(ball.pos, ball.radius, bumper.pos, bumper.radius);
            if contact.hit {
                resolve_contact(ball, &contact, circle_bounce(ball, 1.0));
                ball.vel += contact.normal * bumper.force * BUMPER_KICK;
                bumper.hit_time = time;
                events.push(WorldEvent::BumperHit {
                    ball: ball.id,
                    pos: bumper.pos,
                });
            }
        }
        Obstacle::Spinner(spinner) => {
            let (a, b) = spinner.endpoints();
            let contact = ball_segment_collision(ball.pos, ball.radius, a, b, SPINNER_THICKNESS);
            if contact.hit {
                resolve_contact(ball, &contact, line_bounce(ball));
            }
        }
        Obstacle::Wall(wall) => {
            let contact =
                ball_segment_collision(ball.pos, ball.radius, wall.a, wall.b, wall.thickness);
            if contact.hit {
                resolve_contact(ball, &contact, line_bounce(ball));
            }
        }
        Obstacle::Triangle(tri) => {
            for (a, b) in tri.edges() {
                let contact =
                    ball_segment_collision(ball.pos, ball.radius, a, b, TRIANGLE_EDGE_THICKNESS);
                if contact.hit {
                    resolve_contact(ball, &contact, line_bounce(ball));
                }
            }
        }
        Obstacle::Portal(portal) => {
            if !portal.is_ready(ball.id, time) {
                return;
            }
            let reach = portal.radius + ball.radius;
            let exit = if ball.pos.distance(portal.a) < reach {
                Some(portal.b)
            } else if ball.pos.distance(portal.b) < reach {
                Some(portal.a)
            } else {
                None
            };
            if let Some(exit) = exit {
                let from = ball.pos;
                ball.pos = exit + Vec2::new(0.0, reach + PORTAL_EXIT_GAP);
                portal.cooldown.insert(ball.id, time);
                events.push(WorldEvent::Teleported {
                    ball: ball.id,
                    from,
                    to: ball.pos,
                });
            }
        }
        Obstacle::Booster(booster) => {
            if ball.pos.distance(booster.pos) < booster.radius + ball.radius {
                ball.vel += booster.kick();
                booster.hit_time = time;
                events.push(WorldEvent::BoosterFired {
                    ball: ball.id,
                    pos: booster.pos,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacle::{
        Booster, Bumper, PORTAL_COLORS, Peg, Portal, Spinner, Triangle, Wall,
    };
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(600.0, 600.0, Pcg32::seed_from_u64(42))
    }

    fn ball_at(x: f32, y: f32) -> Ball {
        Ball::new("ball", 0xfeca57, Vec2::new(x, y), Vec2::ZERO, 10.0)
    }

    #[test]
    fn test_world_dimensions() {
        let w = world();
        assert_eq!(w.height, 1800.0);
        assert_eq!(w.finish_line, 1730.0);
        assert_eq!(w.gravity, Vec2::new(0.0, 352.0));
    }

    #[test]
    fn test_add_ball_assigns_index_ids() {
        let mut w = world();
        assert_eq!(w.add_ball(ball_at(100.0, 100.0)), BallId(0));
        assert_eq!(w.add_ball(ball_at(200.0, 100.0)), BallId(1));
        assert_eq!(w.balls[1].id, BallId(1));
    }

    #[test]
    fn test_peg_bounce_resolves_overlap() {
        let mut w = world();
        w.add_ball(ball_at(300.0, 98.0));
        w.add_obstacle(Peg::new(Vec2::new(300.0, 100.0), 8.0));

        w.update(DT);

        let ball = &w.balls[0];
        let dist = ball.pos.distance(Vec2::new(300.0, 100.0));
        assert!((dist - 18.0).abs() < 1e-3, "dist = {dist}");
        assert!(ball.vel.y < 0.0, "vertical velocity should flip, got {}", ball.vel.y);
        // Peg is destroyed at the end of the tick
        assert!(w.obstacles.is_empty());
        assert!(w.drain_events().contains(&WorldEvent::PegBroken {
            pos: Vec2::new(300.0, 100.0)
        }));
    }

    #[test]
    fn test_destroyed_peg_does_not_collide_again() {
        let mut w = world();
        w.gravity = Vec2::ZERO;
        w.add_ball(ball_at(300.0, 90.0));
        w.add_obstacle(Peg::new(Vec2::new(300.0, 100.0), 8.0));
        w.update(DT);
        assert!(w.obstacles.is_empty());

        // Put the ball straight back where the peg was
        w.balls[0].pos = Vec2::new(300.0, 98.0);
        w.balls[0].vel = Vec2::ZERO;
        w.update(DT);
        assert_eq!(w.balls[0].pos, Vec2::new(300.0, 98.0));
    }

    #[test]
    fn test_bumper_adds_energy() {
        let mut w = world();
        w.gravity = Vec2::ZERO;
        let mut ball = ball_at(300.0, 275.0);
        ball.vel = Vec2::new(0.0, 100.0);
        w.add_ball(ball);
        w.add_obstacle(Bumper::new(Vec2::new(300.0, 300.0), 20.0));

        w.update(DT);

        let ball = &w.balls[0];
        // Reflected at 1 + 0.75 and kicked by 600 * 0.05
        assert!(ball.vel.y < -100.0, "vy = {}", ball.vel.y);
        assert!(ball.pos.distance(Vec2::new(300.0, 300.0)) >= 30.0 - 1e-3);
        match &w.obstacles[0] {
            Obstacle::Bumper(b) => assert!((b.hit_time - DT).abs() < 1e-6),
            other => panic!("unexpected obstacle {other:?}"),
        }
    }

    #[test]
    fn test_wall_blocks_ball() {
        let mut w = world();
        let mut ball = ball_at(300.0, 195.0);
        ball.vel = Vec2::new(0.0, 200.0);
        w.add_ball(ball);
        w.add_obstacle(Wall::new(Vec2::new(200.0, 210.0), Vec2::new(400.0, 210.0), 6.0));

        w.update(DT);

        let ball = &w.balls[0];
        assert!(ball.pos.y <= 210.0 - 13.0 + 1e-3);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_spinners_rotate_each_tick() {
        let mut w = world();
        w.add_obstacle(Spinner::new(Vec2::new(300.0, 300.0), 60.0, 2.0, 0.0));
        w.update(0.01);
        match &w.obstacles[0] {
            Obstacle::Spinner(s) => assert!((s.angle - 0.02).abs() < 1e-6),
            other => panic!("unexpected obstacle {other:?}"),
        }
    }

    #[test]
    fn test_triangle_edges_collide() {
        let mut w = world();
        w.gravity = Vec2::ZERO;
        let tri = Triangle::new(Vec2::new(300.0, 300.0), 30.0, 0.0);
        let apex = tri.vertices()[0];
        let mut ball = ball_at(apex.x, apex.y - 11.0);
        ball.vel = Vec2::new(0.0, 60.0);
        w.add_ball(ball);
        w.add_obstacle(tri);

        w.update(DT);

        assert!(w.balls[0].vel.y < 0.0);
    }

    #[test]
    fn test_portal_teleports_and_cools_down() {
        let mut w = world();
        w.gravity = Vec2::ZERO;
        let a = Vec2::new(100.0, 200.0);
        let b = Vec2::new(400.0, 800.0);
        w.add_ball(ball_at(a.x, a.y));
        w.add_obstacle(Portal::new(a, b, PORTAL_COLORS[0]));

        w.update(DT);
        let exit = b + Vec2::new(0.0, 22.0 + 10.0 + 5.0);
        assert!(w.balls[0].pos.distance(exit) < 1e-3);
        assert_eq!(w.balls[0].vel, Vec2::ZERO);

        // Dropped straight back on the entry mouth within the cooldown
        w.balls[0].pos = a;
        for _ in 0..10 {
            w.update(DT);
        }
        assert!(w.balls[0].pos.distance(a) < 1e-3);

        // After the cooldown it works again
        for _ in 0..25 {
            w.update(DT);
        }
        assert!(w.balls[0].pos.distance(exit) < 1e-3);
    }

    #[test]
    fn test_booster_kicks_every_tick() {
        let mut w = world();
        w.gravity = Vec2::ZERO;
        w.add_ball(ball_at(300.0, 300.0));
        w.add_obstacle(Booster::new(Vec2::new(300.0, 300.0), 0.0, 600.0));

        w.update(DT);
        let after_one = w.balls[0].vel.x;
        assert!((after_one - 36.0).abs() < 0.1);

        w.update(DT);
        assert!(w.balls[0].vel.x > after_one + 30.0);
    }

    #[test]
    fn test_head_on_balls_swap() {
        let mut w = world();
        w.gravity = Vec2::ZERO;
        let v = 120.0;
        let mut a = ball_at(300.0, 300.0);
        a.vel = Vec2::new(v, 0.0);
        let mut b = ball_at(319.0, 300.0);
        b.vel = Vec2::new(-v, 0.0);
        w.add_ball(a);
        w.add_ball(b);

        w.update(DT);

        let damped = v * AIR_RESISTANCE;
        let expected = damped - damped * (1.0 + BALL_BALL_RESTITUTION);
        assert!((w.balls[0].vel.x - expected).abs() < 1e-2);
        assert!((w.balls[1].vel.x + expected).abs() < 1e-2);
        assert!(w.balls[0].vel.x < 0.0 && w.balls[1].vel.x > 0.0);
    }

    #[test]
    fn test_finish_line_freezes_and_ranks() {
        let mut w = world();
        let mut ball = ball_at(300.0, 1715.0);
        ball.vel = Vec2::new(100.0, 300.0);
        w.add_ball(ball);
        w.add_ball(ball_at(100.0, 100.0));

        w.update(DT);

        let ball = &w.balls[0];
        assert!(ball.finished);
        assert_eq!(ball.pos.y, w.finish_line - ball.radius);
        assert_eq!(ball.vel.y, 0.0);
        assert!((ball.vel.x - 100.0 * AIR_RESISTANCE * FINISH_DAMPING).abs() < 1e-3);
        assert!(ball.trail.is_empty());
        assert_eq!(ball.finish_time, Some(w.time));
        assert_eq!(w.rankings, vec![BallId(0)]);
        assert!(!w.is_finished());
        assert_eq!(w.racing_count(), 1);

        let frozen = ball.pos;
        w.update(DT);
        assert_eq!(w.balls[0].pos, frozen);
        assert_eq!(w.rankings.len(), 1);
    }

    #[test]
    fn test_stuck_ball_gets_kicked() {
        let mut w = world();
        w.gravity = Vec2::ZERO;
        w.add_ball(ball_at(300.0, 300.0));

        // 1.5 s at 60 Hz, plus one tick
        for _ in 0..91 {
            w.update(DT);
        }
        assert!(w.balls[0].vel.length() > 0.0);
    }

    #[test]
    fn test_ping_pong_ball_redirected_down() {
        let mut w = world();
        let mut ball = ball_at(300.0, 300.0);
        for i in 0..6 {
            let x = 300.0 + (i % 2) as f32 * 80.0;
            let y = 300.0 + (i % 3) as f32 * 15.0;
            ball.pos_history.push_back(Vec2::new(x, y));
        }
        ball.vel = Vec2::new(60.0, -40.0);
        w.add_ball(ball);

        w.update(DT);

        assert!(w.balls[0].vel.y > 400.0, "vy = {}", w.balls[0].vel.y);
        assert!(w.balls[0].pos_history.is_empty());
    }

    #[test]
    fn test_leading_ball_and_camera() {
        let mut w = world();
        w.gravity = Vec2::ZERO;
        w.add_ball(ball_at(100.0, 400.0));
        w.add_ball(ball_at(200.0, 900.0));
        assert_eq!(w.leading_ball().map(|b| b.id), Some(BallId(1)));

        w.update(DT);
        let target = 900.0 - 600.0 * CAMERA_LEAD;
        assert!((w.camera_y - target * CAMERA_SMOOTHING).abs() < 1e-2);

        for _ in 0..500 {
            w.update_camera();
        }
        assert!((w.camera_y - target).abs() < 1.0);
    }

    #[test]
    fn test_camera_clamped_to_course() {
        let mut w = world();
        w.add_ball(ball_at(100.0, 50.0));
        w.camera_y = 500.0;
        for _ in 0..200 {
            w.update_camera();
        }
        assert_eq!(w.camera_y, 0.0);
    }

    #[test]
    fn test_finish_by_progress_orders_by_depth() {
        let mut w = world();
        w.add_ball(ball_at(100.0, 300.0));
        w.add_ball(ball_at(200.0, 1200.0));
        w.add_ball(ball_at(300.0, -40.0));

        assert_eq!(w.racing_count(), 3);
        let appended = w.finish_by_progress();

        assert_eq!(w.racing_count(), 0);
        assert_eq!(appended, vec![BallId(1), BallId(0), BallId(2)]);
        assert_eq!(w.rankings, appended);
        assert!(w.is_finished());
        assert!(w.balls.iter().all(|b| b.timed_out));
        assert_eq!(w.balls[2].progress, Some(0.0));
        let p = w.balls[1].progress.unwrap();
        assert!((p - 1200.0 / 1730.0 * 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_world_is_finished() {
        let mut w = world();
        assert!(w.is_finished());
        w.update(DT);
        assert!(w.leading_ball().is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut w = world();
        w.add_ball(ball_at(100.0, 100.0));
        w.add_obstacle(Wall::new(Vec2::ZERO, Vec2::new(10.0, 10.0), 6.0));
        w.update(DT);

        let json = serde_json::to_string(&w.snapshot()).unwrap();
        assert!(json.contains("\"finish_line\":1730.0"));
        assert!(json.contains("\"type\":\"wall\""));
        assert!(json.contains("\"name\":\"ball\""));
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let build = || {
            let mut w = world();
            w.gravity = Vec2::ZERO;
            w.add_ball(ball_at(300.0, 300.0));
            w
        };
        let mut w1 = build();
        let mut w2 = build();
        for _ in 0..400 {
            w1.update(DT);
            w2.update(DT);
        }
        assert_eq!(w1.balls[0].pos, w2.balls[0].pos);
        assert_eq!(w1.balls[0].vel, w2.balls[0].vel);
    }
}
