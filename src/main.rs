//! Marble Race entry point
//!
//! On the web the page drives `marble_race::web::MarbleRace`. Natively this
//! runs one headless race and prints the results.
//!
//! ```text
//! marble-race [--seed N] [--course chaos|pinball|funnel] [--last-wins] NAME...
//! ```
//! Names use the roster syntax, so `Bob*3` enters three Bobs.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    if let Err(e) = native::run(std::env::args().skip(1).collect()) {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The page constructs MarbleRace itself
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use marble_race::roster::parse_participants;
    use marble_race::{CourseKind, RaceConfig, RaceController, RaceError, RacePhase};

    /// Frame time of a 60 Hz display
    const FRAME: f32 = 1.0 / 60.0;
    const DEFAULT_FIELD: &str = "Red, Yellow, Blue, Pink, Green, Purple";

    pub fn run(args: Vec<String>) -> Result<(), RaceError> {
        let mut config = RaceConfig::default();
        let mut entries = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = args.next().unwrap_or_default();
                    let seed = value
                        .parse()
                        .map_err(|_| RaceError::InvalidConfig(format!("bad seed: {value:?}")))?;
                    config.seed = Some(seed);
                }
                "--course" => {
                    let value = args.next().unwrap_or_default();
                    config.course = CourseKind::parse(&value).ok_or_else(|| {
                        RaceError::InvalidConfig(format!("unknown course: {value:?}"))
                    })?;
                }
                "--last-wins" => config.first_wins = false,
                _ => entries.push(arg),
            }
        }

        let text = if entries.is_empty() {
            DEFAULT_FIELD.to_string()
        } else {
            entries.join(",")
        };

        let mut race = RaceController::new(config, parse_participants(&text))?;
        race.start()?;

        let mut frames = 0u32;
        while race.advance(FRAME) == RacePhase::Running {
            frames += 1;
            if frames % 600 == 0 {
                let world = race.world();
                log::info!(
                    "t={:.1}s: {}/{} arrived, {} still racing",
                    race.elapsed(),
                    world.rankings.len(),
                    world.balls.len(),
                    world.racing_count()
                );
            }
        }

        println!("{}", race.results_text());
        println!("{}", serde_json::to_string_pretty(&race.final_standings())?);
        Ok(())
    }
}
