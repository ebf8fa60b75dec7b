use std::path::Path;

use anyhow::{Context, Result};
use rankboard::ranking::{standings_to_update, Standing};
use rankboard::{feed, TransitionConfig};

pub fn run(config: &TransitionConfig, standings: &Path, output: Option<&Path>) -> Result<()> {
    let json = std::fs::read_to_string(standings)
        .with_context(|| format!("Failed to read standings: {}", standings.display()))?;
    let standings: Vec<Standing> = serde_json::from_str(&json)
        .with_context(|| format!("Invalid standings in {}", standings.display()))?;
    let count = standings.len();

    let update = standings_to_update(standings, config)?;
    let feed = feed::encode_rows(update.rows())?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", feed))
                .with_context(|| format!("Failed to write feed: {}", path.display()))?;
            log::info!("wrote {} rows to {}", count, path.display());
        }
        None => println!("{}", feed),
    }
    Ok(())
}
