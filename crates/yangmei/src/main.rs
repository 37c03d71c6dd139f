//! yangmei: solve a CTF problem with one round of sandboxed Python

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use yangmei::render::Renderer;
use yangmei::{Config, YangmeiAgent};

/// Bundled sample problem, independent of the working directory
const DEFAULT_QUESTION: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/samples/question.txt");

const DEFAULT_TASK: &str = "\
This one is supposed to be a pretty tough ksnCTF problem-yo...!!
Think about the intended solution and run some Python code for it-aru!!";

#[derive(Debug, Parser)]
#[command(name = "yangmei")]
#[command(about = "Single-round CTF solving agent", version)]
struct Cli {
    /// File containing the problem statement
    #[arg(default_value = DEFAULT_QUESTION)]
    question: PathBuf,

    /// What the agent should do with the problem
    #[arg(short, long)]
    task: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "YANGMEI_CONFIG")]
    config: Option<PathBuf>,

    /// Print the conversation as JSON instead of panels
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stderr keeps rendered output clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref()).context("Invalid configuration")?;

    let question = std::fs::read_to_string(&cli.question)
        .with_context(|| format!("Failed to read {}", cli.question.display()))?;
    let task = cli.task.as_deref().unwrap_or(DEFAULT_TASK);

    let renderer = Renderer::detect();
    if !cli.json {
        println!("{}", renderer.problem(&question, task));
    }

    let agent = YangmeiAgent::from_config(&config).context("Failed to start agent")?;
    let conversation = agent.run(&question, task).await.context("Agent run failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&conversation)?);
    } else {
        print!("{}", renderer.answers(&conversation));
    }

    Ok(())
}
