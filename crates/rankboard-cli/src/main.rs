mod commands;
mod recorder;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rankboard")]
#[command(about = "Replay and inspect ranking-table transitions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Transition settings (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging: -v for transitions, -vv for every step
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every row of an update against the current board
    Plan {
        /// Feed of the board as shown now
        initial: PathBuf,
        /// Feed of the next board
        update: PathBuf,
    },

    /// Run updates through an in-memory board and print every step
    Replay {
        /// Feed of the board as served with the page
        initial: PathBuf,

        /// Update feeds, applied in order
        #[arg(required = true)]
        frames: Vec<PathBuf>,

        /// Wait in wall-clock time between steps
        #[arg(long)]
        realtime: bool,

        /// Only print the boards, not the steps
        #[arg(short, long)]
        quiet: bool,
    },

    /// Turn a standings file into an update feed
    Rank {
        /// JSON array of {"id", "name", "score"}
        standings: PathBuf,

        /// Write the feed here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    // RUST_LOG still wins over -v
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan { initial, update } => {
            commands::plan::run(&config, &initial, &update)?;
        }

        Commands::Replay {
            initial,
            frames,
            realtime,
            quiet,
        } => {
            let options = commands::replay::Options { realtime, quiet };
            commands::replay::run(config, &initial, &frames, options)?;
        }

        Commands::Rank { standings, output } => {
            commands::rank::run(&config, &standings, output.as_deref())?;
        }
    }

    Ok(())
}
