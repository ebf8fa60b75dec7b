//! Replay update feeds against an in-memory board.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rankboard::{MemorySurface, Outcome, ReconcileSummary, Reconciler, TransitionConfig};

use super::read_feed;
use crate::recorder::Recorder;

type Board = Reconciler<Recorder<MemorySurface>>;

pub struct Options {
    pub realtime: bool,
    pub quiet: bool,
}

pub fn run(config: TransitionConfig, initial: &Path, frames: &[PathBuf], options: Options) -> Result<()> {
    let initial = read_feed(initial, &config)?;
    let surface = Recorder::new(MemorySurface::from_snapshot(&initial.into_snapshot()));
    let mut board = Reconciler::new(surface, config)?;
    print_board(&board);

    let runtime = if options.realtime {
        Some(
            tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("Failed to start the timer runtime")?,
        )
    } else {
        None
    };

    for frame in frames {
        let update = read_feed(frame, board.config())?;
        println!("== {}", frame.display());

        let outcome = board
            .reconcile(update)
            .with_context(|| format!("Cannot apply {}", frame.display()))?;
        let done = match outcome {
            Outcome::Completed(summary) => vec![summary],
            Outcome::Started { completes_at_ms } => {
                log::debug!("{} completes at {} ms", frame.display(), completes_at_ms);
                match &runtime {
                    Some(runtime) => runtime.block_on(play(&mut board, options.quiet))?,
                    None => board.run_to_end()?,
                }
            }
            Outcome::Queued { position } => {
                log::warn!("{} queued at {}", frame.display(), position);
                Vec::new()
            }
        };

        print_steps(&mut board, options.quiet);
        for summary in done {
            print_summary(&summary);
        }
        print_board(&board);
    }
    Ok(())
}

/// Advance in wall-clock time, one due step at a time.
async fn play(board: &mut Board, quiet: bool) -> Result<Vec<ReconcileSummary>> {
    let mut done = Vec::new();
    while let Some(wait_ms) = board.time_to_next_step() {
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        done.extend(board.advance_by(wait_ms)?);
        print_steps(board, quiet);
    }
    Ok(done)
}

fn print_steps(board: &mut Board, quiet: bool) {
    let lines = board.surface_mut().drain();
    if quiet {
        return;
    }
    for line in lines {
        println!("{}", line);
    }
}

fn print_summary(summary: &ReconcileSummary) {
    println!("-- {}", summary);
}

fn print_board(board: &Board) {
    print!("{}", board.surface().inner().render_text());
}
