//! OFC Trainer
//!
//! Plays self-play games against a random opponent, credits each game's net
//! score to the AI's placement decisions, and persists the engine tables.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use ofc_regret::cfr::{EngineConfig, RegretEngine};
use ofc_regret::games::ofc::{Line, OfcAgent, OfcState, Table};

/// Points for fouling (lines out of order).
const FOUL_PENALTY: f64 = 3.0;

#[derive(Parser, Debug)]
#[command(about = "Train the OFC placement engine by self-play")]
struct Args {
    /// Number of games to play
    #[arg(short, long, default_value_t = 10_000)]
    episodes: u64,

    /// Random seed for dealing and sampling
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Progress document (overrides the configuration)
    #[arg(short, long)]
    progress: Option<PathBuf>,

    /// Start from empty tables instead of the saved progress
    #[arg(long)]
    fresh: bool,

    /// Also push progress to the configured remote store
    #[arg(long)]
    push: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(path) = &args.progress {
        config = config.with_progress_path(path);
    }

    let engine = if args.fresh {
        RegretEngine::new(config.clone())
    } else {
        RegretEngine::open(config.clone())?
    };
    log::info!("{:<32}{:<32}", "known states", engine.num_states());

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };
    let mut agent = OfcAgent::new(engine);

    let start = Instant::now();
    let bar = ProgressBar::new(args.episodes);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} games [{elapsed_precise}] {msg}")?,
    );

    let mut total_reward = 0.0;
    for episode in 1..=args.episodes {
        let reward = play_episode(&mut agent, &mut rng)?;
        agent.record_outcome(reward);
        total_reward += reward;

        if episode % 100 == 0 {
            bar.set_message(format!("avg reward {:+.3}", total_reward / episode as f64));
        }
        bar.inc(1);
    }
    bar.finish();

    let engine = agent.into_engine();
    let elapsed = start.elapsed().as_secs_f64();
    log::info!(
        "{:<32}{:<32}",
        "games per second",
        format!("{:.0}", args.episodes as f64 / elapsed.max(f64::EPSILON))
    );
    log::info!("{:<32}{:<32}", "states", engine.num_states());
    log::info!("{:<32}{:<32}", "table bytes", engine.storage().memory_usage());

    engine.save()?;
    if args.push {
        engine.push_remote()?;
    }

    println!("\n=== Complete ===");
    println!("Games: {}", args.episodes);
    println!("Average AI reward: {:+.3}", total_reward / args.episodes.max(1) as f64);
    println!("Saved: {}", engine.config().progress_path.display());
    Ok(())
}

/// Play one game and return the AI's reward.
fn play_episode(agent: &mut OfcAgent, rng: &mut StdRng) -> Result<f64> {
    let mut state = OfcState::new(rng);
    loop {
        let n = state.placements_this_round();
        agent.play_hand(&mut state)?;

        for card in state.deal_cards(n)? {
            let line = random_open_line(&state.player_table, rng)?;
            state.player_table.place(line, card)?;
        }

        if state.is_over() {
            break;
        }
        state.deal_next_hand()?;
    }
    Ok(reward(&state))
}

fn random_open_line(table: &Table, rng: &mut StdRng) -> Result<Line> {
    table
        .open_lines()
        .choose(rng)
        .copied()
        .context("opponent table is full")
}

/// Net score for the AI, with fouled tables losing every line.
fn reward(state: &OfcState) -> f64 {
    match (state.ai_table.is_valid(), state.player_table.is_valid()) {
        (false, true) => -FOUL_PENALTY,
        (true, false) => FOUL_PENALTY,
        (false, false) => 0.0,
        (true, true) => state.scores().net_for_ai() as f64,
    }
}
