//! Browser bindings
//!
//! A thin `wasm-bindgen` wrapper over `RaceController`. The page owns the
//! canvas and the animation-frame loop; it calls `tick` once per frame and
//! pulls JSON snapshots for drawing.

use wasm_bindgen::prelude::*;

use crate::config::RaceConfig;
use crate::course::CourseKind;
use crate::error::RaceError;
use crate::race::{RaceController, RacePhase};
use crate::roster::parse_participants;

fn to_js(e: RaceError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn init_logging() {
    console_error_panic_hook::set_once();
    // A second race on the same page finds the logger already installed
    let _ = console_log::init_with_level(log::Level::Info);
}

/// 64-bit seed from two `Math.random` draws
fn random_seed() -> u64 {
    let half = || (js_sys::Math::random() * f64::from(u32::MAX)) as u64;
    (half() << 32) | half()
}

#[wasm_bindgen]
pub struct MarbleRace {
    race: RaceController,
}

#[wasm_bindgen]
impl MarbleRace {
    /// `participants_text` uses the roster syntax; `config_json` may be empty
    #[wasm_bindgen(constructor)]
    pub fn new(participants_text: &str, config_json: &str) -> Result<MarbleRace, JsValue> {
        init_logging();

        let mut config = if config_json.trim().is_empty() {
            RaceConfig::default()
        } else {
            RaceConfig::from_json(config_json).map_err(to_js)?
        };
        if config.seed.is_none() {
            config.seed = Some(random_seed());
        }

        let participants = parse_participants(participants_text);
        let race = RaceController::new(config, participants).map_err(to_js)?;
        Ok(MarbleRace { race })
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.race.start().map_err(to_js)
    }

    pub fn stop(&mut self) {
        self.race.stop();
    }

    pub fn force_end(&mut self) {
        self.race.force_end();
    }

    pub fn reset(&mut self) {
        self.race.reset();
    }

    pub fn shuffle(&mut self) {
        self.race.shuffle();
    }

    pub fn set_participants(&mut self, participants_text: &str) {
        self.race.set_participants(parse_participants(participants_text));
    }

    pub fn set_course(&mut self, name: &str) -> Result<(), JsValue> {
        let course = CourseKind::parse(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown course: {name}")))?;
        self.race.set_course(course);
        Ok(())
    }

    /// Call on canvas resize; a running race keeps its layout until the next start
    pub fn set_viewport(&mut self, width: f32, height: f32) -> Result<(), JsValue> {
        self.race.set_viewport(width, height).map_err(to_js)
    }

    pub fn set_first_wins(&mut self, first_wins: bool) {
        self.race.set_first_wins(first_wins);
    }

    /// Advance one animation frame; returns whether the race is still running
    pub fn tick(&mut self, frame_dt: f32) -> bool {
        self.race.advance(frame_dt) == RacePhase::Running
    }

    pub fn phase_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.race.phase()).map_err(|e| to_js(e.into()))
    }

    /// Balls, obstacles, camera and rankings for the renderer
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.race.world().snapshot()).map_err(|e| to_js(e.into()))
    }

    /// Live standings while racing, final standings once over
    pub fn standings_json(&self) -> Result<String, JsValue> {
        let standings = match self.race.phase() {
            RacePhase::Over(_) => self.race.final_standings(),
            _ => self.race.live_standings(),
        };
        serde_json::to_string(&standings).map_err(|e| to_js(e.into()))
    }

    /// Events since the last call (finishes, peg breaks, bumper hits...)
    pub fn events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.race.drain_events()).map_err(|e| to_js(e.into()))
    }

    pub fn results_text(&self) -> String {
        self.race.results_text()
    }
}
