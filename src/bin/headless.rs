use std::{fs::File, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;

use corridor::config::{GridConfig, SimConfig};
use corridor::robot::{AgentConfig, LearningRule, PolicyKind};
use corridor::world::World;

#[derive(Debug, Parser)]
#[command(
    name = "headless",
    about = "Corridor-following robot simulator (no GUI)",
    version
)]
struct Args {
    /// Grid description file: `N M` / `D` / `xs ys` / `d1` / `d2`
    grid: PathBuf,

    /// Total number of simulation ticks to run
    #[arg(long, default_value_t = 10_000)]
    ticks: u64,

    /// Steps per episode
    #[arg(long, default_value_t = 500)]
    runs: u32,

    /// Use softmax action selection instead of ε-greedy
    #[arg(long)]
    softmax: bool,

    /// Exploration parameter: ε for ε-greedy, τ for softmax
    #[arg(long, default_value_t = 0.1)]
    param: f32,

    /// Use SARSA instead of Q-learning
    #[arg(long)]
    sarsa: bool,

    /// Learning rate α
    #[arg(long, default_value_t = 0.7)]
    alpha: f32,

    /// Discount factor γ
    #[arg(long, default_value_t = 0.99)]
    gamma: f32,

    /// Write the per-episode reward series to this file as JSON
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    anyhow::ensure!(
        !args.softmax || args.param > 0.0,
        "softmax temperature must be positive"
    );
    anyhow::ensure!(
        args.softmax || (0.0..=1.0).contains(&args.param),
        "ε must be in [0, 1]"
    );
    anyhow::ensure!(args.runs > 0, "episodes must have at least one step");

    let grid = GridConfig::load(&args.grid)
        .with_context(|| format!("no simulation built from {}", args.grid.display()))?;
    let agent = AgentConfig {
        policy: if args.softmax {
            PolicyKind::Softmax
        } else {
            PolicyKind::EpsilonGreedy
        },
        param: args.param,
        rule: if args.sarsa {
            LearningRule::Sarsa
        } else {
            LearningRule::QLearning
        },
        alpha: args.alpha,
        gamma: args.gamma,
    };

    let mut world = World::new(SimConfig {
        grid,
        runs: args.runs,
        agent,
    });

    for _ in 0..args.ticks {
        let outcome = world.step();
        if outcome.episode_ended {
            info!(
                "episode {} finished with reward {:.2}",
                world.reward_history().len(),
                outcome.reward
            );
        }
    }

    let history = world.reward_history();
    println!(
        "{} episodes completed, {} states visited",
        history.len(),
        world.robot().q_table().len()
    );
    if let Some(last) = history.last() {
        println!("last episode reward: {last:.2}");
    }

    if let Some(path) = &args.out {
        let file =
            File::create(path).with_context(|| format!("cannot write {}", path.display()))?;
        serde_json::to_writer(file, history)?;
        info!("reward series written to {}", path.display());
    }

    Ok(())
}
