//! Bobber Sim entry point
//!
//! Headless episode runner: plays randomized episodes with a simple chase
//! heuristic standing in for a learned policy. Useful for smoke-testing the
//! simulation and eyeballing reward balance.
//!
//! Usage: `bobber-sim [seed]`

use bobber_sim::consts::BAR_TOP_OFFSET;
use bobber_sim::sim::{FishSim, Observation, StepOutcome};

const EPISODES: u32 = 10;

fn main() {
    env_logger::init();

    let seed = match std::env::args().nth(1) {
        Some(arg) => match arg.parse::<u64>() {
            Ok(seed) => seed,
            Err(_) => {
                eprintln!("usage: bobber-sim [seed]");
                std::process::exit(2);
            }
        },
        None => rand::random(),
    };
    log::info!("running {EPISODES} episodes with seed {seed}");

    let mut sim = FishSim::new(seed);
    let mut caught = 0;
    for episode in 0..EPISODES {
        let mut obs = sim.reset_randomly();
        log::info!(
            "episode {episode}: level {}, {:?} fish, difficulty {}",
            sim.config.level,
            sim.config.motion_type,
            sim.config.difficulty
        );

        let mut ticks = 0u32;
        let mut total_reward = 0.0;
        loop {
            let result = sim.step(chase_policy(&obs));
            ticks += 1;
            total_reward += result.reward;
            match result.outcome {
                StepOutcome::Ongoing(next) => obs = next,
                StepOutcome::Won(_) => {
                    caught += 1;
                    log::info!(
                        "episode {episode}: caught in {ticks} ticks, reward {total_reward:.1}, perfect {}",
                        sim.state.perfect
                    );
                    break;
                }
                StepOutcome::Lost(_) => {
                    log::info!(
                        "episode {episode}: escaped after {ticks} ticks, reward {total_reward:.1}"
                    );
                    break;
                }
            }
        }
    }
    log::info!("caught {caught}/{EPISODES}");
}

/// Press (bar climbs) whenever the fish sits above the bar's center.
fn chase_policy(obs: &Observation) -> bool {
    let bar_center = obs.bar_position - BAR_TOP_OFFSET + obs.bar_height / 2.0;
    obs.target_position < bar_center
}
