pub mod plan;
pub mod rank;
pub mod replay;

use std::path::Path;

use anyhow::{Context, Result};
use rankboard::{feed, TransitionConfig, Update};

/// Read and decode a feed file.
pub fn read_feed(path: &Path, config: &TransitionConfig) -> Result<Update> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed: {}", path.display()))?;
    feed::decode_update(&json, &config.mutable_class)
        .with_context(|| format!("Invalid feed in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn demo(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos").join(name)
    }

    #[test]
    fn demo_feeds_decode() {
        let config = TransitionConfig::default();
        let initial = read_feed(&demo("initial.json"), &config).unwrap();
        let frame = read_feed(&demo("frame-2.json"), &config).unwrap();
        assert_eq!(initial.len(), 3);
        assert_eq!(initial.column_count(), frame.column_count());
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = read_feed(&demo("missing.json"), &TransitionConfig::default()).unwrap_err();
        assert!(error.to_string().contains("missing.json"));
    }
}
