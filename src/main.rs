mod config;
mod pipeline;
mod repl;
mod speech;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use config::AppConfig;
use pipeline::Pipeline;
use speech::Speaker;
use tft_advisor::Advisor;
use tft_data::GameData;
use tft_state::{GameState, StateUpdate};

#[derive(Parser)]
#[command(name = "tft-copilot", about = "Voice-style strategy assistant for Teamfight Tactics")]
struct Cli {
    /// Path to config.json
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture the game window and answer questions interactively
    Run,
    /// Ask a one-shot question, optionally describing your game state
    Ask {
        /// The question, e.g. "what should I sell?"
        question: Vec<String>,
        /// Game state in the same free form the REPL accepts,
        /// e.g. "50 gold level 7 with jinx and vi on my board"
        #[arg(long)]
        state: Option<String>,
    },
    /// Refresh champions.json, traits.json, and comps.json from the web
    Fetch,
    /// Print a summary of the loaded data files
    Data,
    /// List visible window titles, for the capture.window_title setting
    Windows,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tft_copilot=debug,tft_capture=debug,tft_vision=debug,tft_state=debug,\
                 tft_data=debug,tft_advisor=debug"
                    .into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run => run(&config).await,
        Command::Ask { question, state } => ask(&config, question.join(" "), state).await,
        Command::Fetch => fetch(&config).await,
        Command::Data => data_summary(&config),
        Command::Windows => {
            for title in tft_capture::list_window_titles() {
                println!("{}", title);
            }
            Ok(())
        }
    }
}

async fn run(config: &AppConfig) -> Result<()> {
    let data_dir = config.data_dir();
    let mut data = GameData::load(&data_dir)?;

    // The data files are ephemeral; a cold start just refetches them.
    if data.champions.is_empty() {
        warn!("No champion data found, fetching...");
        match tft_data::fetch::refresh(&config.fetch_config(), &data_dir).await {
            Ok(fresh) => data = fresh,
            Err(e) => warn!("Fetch failed, continuing with empty data: {:#}", e),
        }
    }

    let data = Arc::new(data);
    let index = Arc::new(data.name_index());
    let advisor = Advisor::new(config.llm_client());
    let speaker = Speaker::new(&config.speech);

    let pipeline = Pipeline::start(config, data.clone(), index.clone());
    info!("Watching for the game window...");

    let result = repl::run(&advisor, &data, &index, Some(&pipeline), &speaker).await;
    pipeline.stop();
    result
}

async fn ask(config: &AppConfig, question: String, state_text: Option<String>) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("No question given. Try: tft-copilot ask \"what should I sell?\"");
    }

    let data = GameData::load(&config.data_dir())?;
    let index = data.name_index();
    let advisor = Advisor::new(config.llm_client());
    let speaker = Speaker::new(&config.speech);

    let mut state = GameState::new();
    if let Some(text) = state_text {
        match StateUpdate::parse(&text, &index) {
            Some(update) => state.apply(update),
            None => warn!("Could not parse any game state from '{}'", text),
        }
    }

    let answer = advisor
        .answer(&state, &data, &index, &question)
        .await
        .context("Failed to answer question")?;
    println!("{}", answer);
    speaker.speak(&answer).await;
    Ok(())
}

async fn fetch(config: &AppConfig) -> Result<()> {
    let data_dir = config.data_dir();
    let data = tft_data::fetch::refresh(&config.fetch_config(), &data_dir)
        .await
        .context("Failed to refresh data files")?;
    println!(
        "Fetched {} champions, {} traits, {} comps into {}",
        data.champions.len(),
        data.traits.len(),
        data.comps.len(),
        data_dir.display()
    );
    Ok(())
}

fn data_summary(config: &AppConfig) -> Result<()> {
    let data = GameData::load(&config.data_dir())?;
    println!(
        "{} champions, {} traits, {} comps",
        data.champions.len(),
        data.traits.len(),
        data.comps.len()
    );
    for comp in &data.comps {
        println!("  {} [{}]", comp.name, comp.units.join(", "));
    }
    Ok(())
}
