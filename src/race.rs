//! Race lifecycle and standings
//!
//! The controller owns the participant list and a seeded generator, rebuilds
//! the world for every race, drives it one frame at a time and turns
//! `PhysicsWorld::rankings` into presentation-ready standings. The physics
//! core never sees the display order: reversing for "last one wins" happens
//! only when standings are read.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::config::RaceConfig;
use crate::course::{CourseKind, build_course, prepare_course};
use crate::error::RaceError;
use crate::roster::color_for;
use crate::sim::{Ball, BallId, PhysicsWorld, WorldEvent};

/// Fewest entrants a race can start with
pub const MIN_PARTICIPANTS: usize = 2;

/// Base ball radius before viewport scaling is `BALL_RADIUS_BUDGET / n`,
/// clamped to this range
const BALL_RADIUS_MIN: f32 = 10.0;
const BALL_RADIUS_MAX: f32 = 18.0;
const BALL_RADIUS_BUDGET: f32 = 250.0;
/// Share of the course width balls spawn in, centred
const SPAWN_BAND: f32 = 0.6;

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];
const LAST_PLACE: &str = "💀";

/// Why a race ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Every ball crossed the finish line
    AllArrived,
    /// Operator stopped the race early
    ForcedEnd,
    /// The race clock ran out
    TimedOut,
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "reason", rename_all = "snake_case")]
pub enum RacePhase {
    /// World built, waiting for `start`
    Ready,
    /// Advancing every frame
    Running,
    /// Halted mid-race; state is kept as is
    Stopped,
    /// Every ball is ranked
    Over(FinishReason),
}

/// Where a ball stands
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StandingStatus {
    /// Crossed the finish line at `time` (simulation seconds)
    Arrived { time: f32 },
    /// Ranked by progress at a forced end or timeout
    TimedOut { progress: f32 },
    /// Still on the course
    Racing { progress: f32 },
}

/// One row of a standings table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    /// 1-based display rank
    pub rank: usize,
    pub ball: BallId,
    pub name: String,
    pub color: u32,
    pub status: StandingStatus,
    /// `"12.34s"`, `"12.90s (+0.56s)"` or `"87%"`
    pub time_label: String,
}

/// Runs races over a participant list
#[derive(Debug, Clone)]
pub struct RaceController {
    config: RaceConfig,
    participants: Vec<String>,
    rng: Pcg32,
    world: PhysicsWorld,
    phase: RacePhase,
    /// Unclamped frame time since `start`
    elapsed: f32,
}

impl RaceController {
    /// Validate the config and lay out the first course
    ///
    /// Without a configured seed one is drawn from the OS.
    pub fn new(config: RaceConfig, participants: Vec<String>) -> Result<Self, RaceError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!(
            "race controller: {} participants, {} course, seed {seed}",
            participants.len(),
            config.course.as_str()
        );

        let mut rng = Pcg32::seed_from_u64(seed);
        let world = Self::build_world(&config, &participants, &mut rng);
        Ok(Self {
            config,
            participants,
            rng,
            world,
            phase: RacePhase::Ready,
            elapsed: 0.0,
        })
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RacePhase::Running
    }

    /// Race clock in seconds (wall-clock frame time, not simulation time)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Read-only world for rendering
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Events recorded by the world since the last call
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        self.world.drain_events()
    }

    /// Build a fresh world and start racing
    pub fn start(&mut self) -> Result<(), RaceError> {
        if self.phase == RacePhase::Running {
            return Err(RaceError::AlreadyRunning);
        }
        let count = self.participants.len();
        if count < MIN_PARTICIPANTS {
            return Err(RaceError::NotEnoughParticipants { count });
        }

        self.rebuild();
        self.phase = RacePhase::Running;
        log::info!("race started with {count} balls");
        Ok(())
    }

    /// Halt without touching the world
    pub fn stop(&mut self) {
        if self.phase == RacePhase::Running {
            self.phase = RacePhase::Stopped;
            log::info!("race stopped at {:.2}s", self.elapsed);
        }
    }

    /// End a running race now, ranking the rest by progress
    ///
    /// On a race that is not running this resets instead.
    pub fn force_end(&mut self) {
        if self.phase != RacePhase::Running {
            self.reset();
            return;
        }
        let ranked = self.world.finish_by_progress();
        log::info!("race force-ended, {} balls ranked by progress", ranked.len());
        self.conclude(FinishReason::ForcedEnd);
    }

    /// Rebuild the world and wait for `start`
    pub fn reset(&mut self) {
        self.rebuild();
        self.phase = RacePhase::Ready;
        log::debug!("race reset");
    }

    /// Randomise entrant order (and so spawn order and colours)
    pub fn shuffle(&mut self) {
        self.participants.shuffle(&mut self.rng);
        self.reset();
    }

    /// Replace the entrant list
    ///
    /// A running race keeps going; the new list takes effect at the next
    /// `start`. Otherwise the world is rebuilt right away.
    pub fn set_participants(&mut self, participants: Vec<String>) {
        self.participants = participants;
        if self.phase != RacePhase::Running {
            self.reset();
        }
    }

    /// Resize the viewport the course is laid out for
    ///
    /// Like `set_participants`, a running race is left alone and the new
    /// size applies from the next `start`.
    pub fn set_viewport(&mut self, width: f32, height: f32) -> Result<(), RaceError> {
        let resized = RaceConfig {
            view_width: width,
            view_height: height,
            ..self.config.clone()
        };
        resized.validate()?;
        self.config = resized;
        log::debug!("viewport now {width}x{height}, scale {:.2}", self.config.scale());

        if self.phase != RacePhase::Running {
            self.reset();
        }
        Ok(())
    }

    pub fn set_course(&mut self, course: CourseKind) {
        self.config.course = course;
        self.reset();
    }

    /// Display flag only; rankings are never reordered
    pub fn set_first_wins(&mut self, first_wins: bool) {
        self.config.first_wins = first_wins;
    }

    /// Feed one rendered frame of `frame_dt` seconds
    ///
    /// The world steps at most `max_step`; the race clock takes the full
    /// frame time. Returns the phase after the frame.
    pub fn advance(&mut self, frame_dt: f32) -> RacePhase {
        if self.phase != RacePhase::Running {
            return self.phase;
        }

        // Race clock runs on real frame time, the world on a clamped step
        let frame_dt = frame_dt.max(0.0);
        self.elapsed += frame_dt;
        self.world.update(frame_dt.min(self.config.max_step));

        // Natural finish wins over the time limit on the same frame
        if self.world.is_finished() {
            self.conclude(FinishReason::AllArrived);
        } else if self.elapsed >= self.config.time_limit {
            // Out of time: rank whoever is left by how far down they got
            let ranked = self.world.finish_by_progress();
            log::info!(
                "race timed out after {:.1}s, {} balls ranked by progress",
                self.elapsed,
                ranked.len()
            );
            self.conclude(FinishReason::TimedOut);
        }

        self.phase
    }

    /// Standings while racing: ranked balls plus racers ordered by depth
    ///
    /// With `first_wins` off the order flips: balls still up the course lead
    /// and the first arrival sits last.
    pub fn live_standings(&self) -> Vec<Standing> {
        let finish_line = self.world.finish_line;
        let mut racing: Vec<&Ball> = self.world.balls.iter().filter(|b| !b.finished).collect();
        let ranked = self.ranked_balls();

        let mut rows = Vec::with_capacity(self.world.balls.len());
        if self.config.first_wins {
            racing.sort_by(|a, b| b.pos.y.total_cmp(&a.pos.y));
            let first_time = ranked.iter().find_map(|b| arrival_time(b));
            for (i, ball) in ranked.iter().enumerate() {
                let label = match (arrival_time(ball), first_time) {
                    (Some(t), Some(first)) if i > 0 => format!("+{:.2}s", t - first),
                    _ => base_label(ball),
                };
                rows.push(standing(ball, label, finish_line));
            }
            for ball in racing {
                rows.push(standing(ball, base_label_racing(ball, finish_line), finish_line));
            }
        } else {
            racing.sort_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
            for ball in racing {
                rows.push(standing(ball, base_label_racing(ball, finish_line), finish_line));
            }
            for ball in ranked.iter().rev() {
                rows.push(standing(ball, base_label(ball), finish_line));
            }
        }

        number(rows)
    }

    /// Final order, reversed when the last arrival wins
    ///
    /// Arrivals after the leading arrival are labelled with their gap to it.
    pub fn final_standings(&self) -> Vec<Standing> {
        let finish_line = self.world.finish_line;
        let mut ranked = self.ranked_balls();
        if !self.config.first_wins {
            ranked.reverse();
        }

        let reference = ranked.iter().find_map(|b| arrival_time(b));
        let sign = if self.config.first_wins { '+' } else { '-' };

        let rows = ranked
            .iter()
            .enumerate()
            .map(|(i, ball)| {
                let label = match (arrival_time(ball), reference) {
                    (Some(t), Some(first)) if i > 0 => {
                        format!("{t:.2}s ({sign}{:.2}s)", (t - first).abs())
                    }
                    _ => base_label(ball),
                };
                standing(ball, label, finish_line)
            })
            .collect();

        number(rows)
    }

    /// Top of the final standings
    pub fn winner(&self) -> Option<Standing> {
        self.final_standings().into_iter().next()
    }

    /// Shareable plain-text results
    pub fn results_text(&self) -> String {
        let standings = self.final_standings();
        let total = standings.len();

        let mut text = String::from("🏅 Marble Race Results\n");
        text.push_str(if self.config.first_wins {
            "(first to arrive wins)\n\n"
        } else {
            "(last to arrive wins)\n\n"
        });

        for (i, row) in standings.iter().enumerate() {
            let medal = match MEDALS.get(i) {
                Some(m) => Some(*m),
                None if i + 1 == total && total > MEDALS.len() => Some(LAST_PLACE),
                None => None,
            };
            match medal {
                Some(m) => text.push_str(&format!(
                    "{}. {m} {} - {}\n",
                    row.rank, row.name, row.time_label
                )),
                None => text.push_str(&format!(
                    "{}. {} - {}\n",
                    row.rank, row.name, row.time_label
                )),
            }
        }

        text
    }

    fn conclude(&mut self, reason: FinishReason) {
        self.phase = RacePhase::Over(reason);
        if let Some(winner) = self.winner() {
            log::info!(
                "race over ({reason:?}) after {:.2}s, winner: {}",
                self.elapsed,
                winner.name
            );
        }
    }

    fn ranked_balls(&self) -> Vec<&Ball> {
        self.world
            .rankings
            .iter()
            .filter_map(|&id| self.world.ball(id))
            .collect()
    }

    fn rebuild(&mut self) {
        self.world = Self::build_world(&self.config, &self.participants, &mut self.rng);
        self.elapsed = 0.0;
    }

    /// Course, scaling and ball spawn for one race
    fn build_world(config: &RaceConfig, participants: &[String], rng: &mut Pcg32) -> PhysicsWorld {
        let width = config.view_width;
        let scale = config.scale();

        let world_rng = Pcg32::seed_from_u64(rng.random());
        let mut world = PhysicsWorld::new(width, config.view_height, world_rng);
        world.gravity = Vec2::new(0.0, config.gravity);
        world.max_ball_speed = config.max_ball_speed;

        let course = build_course(config.course, width, world.height, rng);
        world.obstacles = prepare_course(course, scale);

        let count = participants.len().max(1) as f32;
        let radius = (BALL_RADIUS_BUDGET / count).clamp(BALL_RADIUS_MIN, BALL_RADIUS_MAX) * scale;
        let band = width * SPAWN_BAND;
        let left = (width - band) / 2.0;
        let vy = 150.0 + rng.random::<f32>() * 100.0;

        for (i, name) in participants.iter().enumerate() {
            let x = left + rng.random::<f32>() * band;
            let y = -20.0 - rng.random::<f32>() * 80.0 - 8.0 * i as f32;
            let vx = (rng.random::<f32>() - 0.5) * 50.0;
            let (pos, vel) = (Vec2::new(x, y), Vec2::new(vx, vy));
            world.add_ball(Ball::new(name.clone(), color_for(i), pos, vel, radius));
        }

        world
    }
}

/// Finish time of a ball that crossed the line
fn arrival_time(ball: &Ball) -> Option<f32> {
    if ball.timed_out {
        None
    } else {
        ball.finish_time
    }
}

fn status(ball: &Ball, finish_line: f32) -> StandingStatus {
    match (ball.finished, ball.timed_out, ball.finish_time) {
        (true, false, Some(time)) => StandingStatus::Arrived { time },
        (true, true, _) => StandingStatus::TimedOut {
            progress: ball.progress.unwrap_or_else(|| ball.progress_toward(finish_line)),
        },
        _ => StandingStatus::Racing {
            progress: ball.progress_toward(finish_line),
        },
    }
}

/// `"12.34s"` for arrivals, `"87%"` for everything else
fn base_label(ball: &Ball) -> String {
    match (arrival_time(ball), ball.progress) {
        (Some(t), _) => format!("{t:.2}s"),
        (None, Some(p)) => format!("{p:.0}%"),
        (None, None) => String::new(),
    }
}

fn base_label_racing(ball: &Ball, finish_line: f32) -> String {
    format!("{:.0}%", ball.progress_toward(finish_line))
}

fn standing(ball: &Ball, time_label: String, finish_line: f32) -> Standing {
    Standing {
        rank: 0,
        ball: ball.id,
        name: ball.name.clone(),
        color: ball.color,
        status: status(ball, finish_line),
        time_label,
    }
}

fn number(mut rows: Vec<Standing>) -> Vec<Standing> {
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}
