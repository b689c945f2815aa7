use anyhow::Context;
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use stepwise_common::history::History;
use stepwise_common::platform::Platform;
use stepwise_engine::config::PlannerConfig;
use stepwise_engine::goal::GoalSpec;
use stepwise_engine::planner::Planner;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stepwise",
    version,
    about = "Deterministic next-action resolver for UI automation"
)]
struct Args {
    /// UI tree dump to resolve against; reads stdin when omitted
    #[arg(long)]
    tree: Option<PathBuf>,

    /// Goal file (YAML): description, steps, completion condition
    #[arg(long)]
    goal: PathBuf,

    /// History of executed actions (JSON array); empty when omitted
    #[arg(long)]
    history: Option<PathBuf>,

    /// Tree platform (ios, android, web); auto-detected when omitted
    #[arg(long)]
    platform: Option<Platform>,

    /// Config file overriding the standard lookup locations
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Logging goes to stderr; stdout carries only the action JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let tree = match &args.tree {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading tree from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading tree from stdin")?;
            buf
        }
    };

    let goal: GoalSpec = serde_yaml::from_str(
        &std::fs::read_to_string(&args.goal)
            .with_context(|| format!("reading goal from {}", args.goal.display()))?,
    )
    .context("parsing goal file")?;

    let history: History = match &args.history {
        Some(path) => serde_json::from_str(
            &std::fs::read_to_string(path)
                .with_context(|| format!("reading history from {}", path.display()))?,
        )
        .context("parsing history file")?,
        None => History::new(),
    };

    let config = match &args.config {
        Some(path) => PlannerConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PlannerConfig::load().context("loading config")?,
    };

    let action = Planner::new(config).next_action(&tree, args.platform, &goal, &history);
    tracing::debug!(kind = action.kind(), "resolved next action");
    println!("{}", serde_json::to_string(&action)?);
    Ok(())
}
