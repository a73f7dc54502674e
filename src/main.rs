use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use snake_qlearn::config::Config;
use snake_qlearn::db::{self, EraseOutcome, LoadOutcome};
use snake_qlearn::game_input::STATE_SIZE;
use snake_qlearn::network::Net;
use snake_qlearn::snake::{Action, Direction};
use snake_qlearn::training::{Mode, TrainingLoop, evaluate};
use snake_qlearn::utils::vec_stats;
use snake_qlearn::versus::Versus;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "snake_qlearn")]
#[command(version, about = "Snake with a Q-learning agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Checkpoint path, overrides the config
    #[arg(long, global = true)]
    checkpoint: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Pause between ticks in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// -v debug, -vv trace (RUST_LOG wins)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Train the agent, resuming from the checkpoint if there is one
    Train {
        /// Stop after this many games (default: run forever)
        #[arg(long)]
        games: Option<u32>,
    },
    /// Let the stored policy play greedily
    Watch {
        #[arg(long)]
        games: Option<u32>,
    },
    /// Steer one snake from stdin (w/a/s/d) next to the stored policy
    Versus,
    /// Greedy evaluation over independent games in parallel
    Eval {
        #[arg(long, default_value = "100")]
        games: usize,
    },
    /// Delete the checkpoint
    Reset {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    snake_qlearn::log::init(cli.verbose);

    let mut cfg = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(path) = cli.checkpoint {
        cfg.checkpoint = path;
    }
    if let Some(ms) = cli.delay_ms {
        cfg.tick_delay_ms = ms;
    }

    match cli.command {
        Command::Train { games } => run_loop(cfg, Mode::Train, cli.seed, games),
        Command::Watch { games } => run_loop(cfg, Mode::Watch, cli.seed, games),
        Command::Versus => versus(&cfg, cli.seed),
        Command::Eval { games } => eval(&cfg, cli.seed, games),
        Command::Reset { yes } => reset(&cfg, yes),
    }
}

fn run_loop(cfg: Config, mode: Mode, seed: Option<u64>, games: Option<u32>) -> Result<()> {
    let mut tl = TrainingLoop::new(cfg, mode, seed).context("starting the game loop")?;
    let stats = tl.run(games)?;
    info!(games = stats.games(), mean = stats.mean(), "done");
    Ok(())
}

/// The stored policy, or a fresh random one when nothing is saved yet.
fn load_policy(cfg: &Config) -> Result<Net> {
    let model = match db::load_checkpoint(&cfg.checkpoint)? {
        LoadOutcome::Modern(ckpt) => ckpt.model,
        LoadOutcome::Legacy(model) => model,
        LoadOutcome::NotFound => {
            warn!("no trained model, the policy is random");
            let mut rng = rand::thread_rng();
            return Ok(Net::new(STATE_SIZE, cfg.agent.hidden, Action::ALL.len(), &mut rng));
        }
    };
    let net = Net::from_model(model)?;
    // any hidden width plays, the ends must fit the encoder and the actions
    net.ensure_shape(STATE_SIZE, net.hidden_size, Action::ALL.len())?;
    Ok(net)
}

fn eval(cfg: &Config, seed: Option<u64>, games: usize) -> Result<()> {
    let net = load_policy(cfg)?;
    let scores = evaluate(&net, &cfg.game, games, seed.unwrap_or(0))?;
    let as_f32: Vec<f32> = scores.iter().map(|&s| s as f32).collect();
    let s = vec_stats(&as_f32);
    println!("games {} min {} max {} mean {:.2}", scores.len(), s.min, s.max, s.mean);
    Ok(())
}

fn parse_heading(line: &str) -> Option<Direction> {
    match line.trim() {
        "w" | "up" => Some(Direction::Up),
        "a" | "left" => Some(Direction::Left),
        "s" | "down" => Some(Direction::Down),
        "d" | "right" => Some(Direction::Right),
        _ => None,
    }
}

fn versus(cfg: &Config, seed: Option<u64>) -> Result<()> {
    let mut v = Versus::new(&cfg.game, load_policy(cfg)?, seed)?;
    println!("w/a/s/d then enter, empty line keeps heading, q quits");
    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim() == "q" {
            break;
        }
        let scores = v.tick(parse_heading(&line))?;
        println!(
            "you {} head {:?} | ai {} head {:?}",
            scores.human,
            v.human().head(),
            scores.ai,
            v.ai().head()
        );
    }
    Ok(())
}

fn reset(cfg: &Config, yes: bool) -> Result<()> {
    if !yes {
        print!("delete {}? [y/n] ", cfg.checkpoint.display());
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        match answer.trim() {
            "y" | "Y" => {}
            "n" | "N" => {
                info!("kept the checkpoint");
                return Ok(());
            }
            other => bail!("expected y or n, got {other:?}"),
        }
    }
    match db::erase_checkpoint(&cfg.checkpoint) {
        Ok(EraseOutcome::Removed) => info!(path = %cfg.checkpoint.display(), "checkpoint removed"),
        Ok(EraseOutcome::NothingToRemove) => info!("nothing to remove"),
        Err(e) => error!(error = %e, "could not remove the checkpoint"),
    }
    Ok(())
}
