//! Tank Arena headless runner
//!
//! Drives the simulation core at 60 Hz with a scripted pilot and logs how the
//! run went. Handy for balance checks: `tank-arena [tuning.json] [seed] [seconds]`.

mod runner {
    use std::error::Error;

    use tank_arena::audio::AudioManager;
    use tank_arena::persistence::{self, MemoryStore, ProgressRecord};
    use tank_arena::sim::{
        ArcadePhysics, ArenaSize, ControlIntent, GameState, LevelState, LocalHost, ShootIntent,
        tick,
    };
    use tank_arena::{HighScores, Settings, Tuning, angle_towards};

    /// Options taken from the command line
    struct RunOptions {
        tuning: Tuning,
        seed: u64,
        seconds: u64,
    }

    impl RunOptions {
        fn from_args() -> Result<Self, Box<dyn Error>> {
            let mut args = std::env::args().skip(1);
            let tuning = match args.next() {
                Some(path) if path != "-" => {
                    let json = std::fs::read_to_string(&path)?;
                    let tuning = Tuning::from_json(&json)?;
                    log::info!("Loaded tuning from {}", path);
                    tuning
                }
                _ => Tuning::default(),
            };
            let seed = args.next().map(|s| s.parse::<u64>()).transpose()?.unwrap_or(42);
            let seconds = args.next().map(|s| s.parse::<u64>()).transpose()?.unwrap_or(120);
            Ok(Self {
                tuning,
                seed,
                seconds,
            })
        }
    }

    /// Steer toward the nearest enemy and keep the trigger down
    fn pilot(state: &GameState, physics: &ArcadePhysics, host: &mut LocalHost) {
        let Ok(tank_pos) = state.tank_position(physics) else {
            return;
        };
        let nearest = state
            .enemies
            .iter()
            .filter_map(|e| state.position_of(physics, e.id).ok())
            .min_by(|a, b| {
                a.distance_squared(tank_pos)
                    .total_cmp(&b.distance_squared(tank_pos))
            });

        match nearest {
            Some(target) => {
                host.control = Some(ControlIntent::Move {
                    angle: angle_towards(tank_pos, target),
                });
                host.shoot = Some(ShootIntent::CreateBullet);
            }
            None => {
                host.control = None;
                host.shoot = None;
            }
        }
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let options = RunOptions::from_args()?;
        options.tuning.validate()?;

        let mut store = MemoryStore::new();
        let settings = Settings::load(&store);
        let mut audio = AudioManager::from_settings(&settings);
        let mut scores = HighScores::load(&store);

        let arena = ArenaSize::default();
        let mut physics = ArcadePhysics::new();
        let mut host = LocalHost::new(arena, options.tuning.tank_max_health);
        let mut state = GameState::with_tuning(options.seed, options.tuning);
        state.set_arena(arena);
        let spawn_point = state.bounds.center();
        state.spawn_tank(&mut physics, spawn_point);

        log::info!(
            "Tank Arena (headless) seed {} for {}s",
            options.seed,
            options.seconds
        );

        let frames = options.seconds * 60;
        let mut defeats = 0u32;
        for frame in 0..frames {
            let now_ms = frame * 1000 / 60;
            pilot(&state, &physics, &mut host);

            let run_user = host.user_id.clone();
            let report = tick(
                &mut state,
                Some(&mut physics),
                &mut host,
                now_ms,
                settings.effective_sound(true),
            );
            for sound in host.sounds.drain(..) {
                audio.play(sound);
            }

            if report.level_won {
                host.advance_level();
                let progress = ProgressRecord {
                    level: host.level,
                    score: host.score,
                };
                if let Err(err) = persistence::save_progress(&mut store, &progress) {
                    log::warn!("Progress not saved: {}", err);
                }
            }

            if report.player_defeated {
                defeats += 1;
                if let Some(rank) = scores.add_score(&run_user, host.score) {
                    log::info!("{} placed #{} with {}", run_user, rank, host.score);
                }
                host.score = 0;
                host.health = host.max_health;
                host.level = LevelState::new(1);
                state.spawn_tank(&mut physics, spawn_point);
            }
        }

        scores.add_score(&host.user_id, host.score);
        scores.save(&mut store);

        log::info!(
            "Finished on level {} with score {} ({} wins, {} boosts, {} defeats)",
            host.level.level,
            host.score,
            host.wins,
            host.boosts_collected,
            defeats
        );
        log::info!(
            "Played {} sounds; best score {}",
            audio.played(),
            scores.top_score().unwrap_or(0)
        );
        Ok(())
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = runner::run() {
        log::error!("Run failed: {}", err);
        std::process::exit(1);
    }
}
