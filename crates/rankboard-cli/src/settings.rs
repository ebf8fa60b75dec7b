//! Transition settings from a TOML file.
//!
//! Keys are the fields of `TransitionConfig`, all optional:
//!
//! ```toml
//! duration_ms = 600
//! easing = "swing"
//! completion = "fixed-budget"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use rankboard::TransitionConfig;

pub fn load(path: Option<&Path>) -> Result<TransitionConfig> {
    let Some(path) = path else {
        return Ok(TransitionConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings: {}", path.display()))?;
    let config = parse(&content).with_context(|| format!("Invalid settings in {}", path.display()))?;
    log::info!("transition settings from {}", path.display());
    Ok(config)
}

fn parse(content: &str) -> Result<TransitionConfig> {
    let config: TransitionConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankboard::{CompletionPolicy, OverlapPolicy};

    #[test]
    fn partial_settings_keep_defaults() {
        let config = parse("duration_ms = 600\noverlap = \"queue\"\n").unwrap();
        assert_eq!(config.duration_ms, 600);
        assert_eq!(config.pause_ms(), 200);
        assert_eq!(config.overlap, OverlapPolicy::Queue);
        assert_eq!(config.completion, CompletionPolicy::Derived);
        assert_eq!(config.mutable_class, "sb-update");
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(parse("duration_ms = 0").is_err());
        assert!(parse("completion = \"whenever\"").is_err());
        assert!(parse("mutable_class = \"a b\"").is_err());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse("").unwrap(), TransitionConfig::default());
    }
}
