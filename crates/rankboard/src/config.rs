//! Transition timing and markup conventions.
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! duration_ms = 600
//! overlap = "queue"
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::surface::Easing;

/// When the cascade starts and when completion fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionPolicy {
    /// Settle when the last row action ends, complete when the last cascade
    /// fade ends.
    #[default]
    Derived,
    /// Settle after a fixed `3 * duration + 2 * pause` and complete at the
    /// settle instant, leaving the cascade running.
    FixedBudget,
}

/// What `reconcile` does while a transition is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Fail with `ReconcileError::Busy`.
    #[default]
    Reject,
    /// Start the update once the running transitions have completed.
    Queue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Length of every single fade or slide.
    pub duration_ms: u64,
    /// Pause between the three slide stages. Defaults to a third of
    /// `duration_ms`.
    pub pause_ms: Option<u64>,
    /// Sideways offset of a moving proxy. Up moves go right, down moves left.
    pub lateral_offset_px: f64,
    /// Delay between two consecutive rows of the final fade-in.
    pub stagger_ms: u64,
    /// Proxy cell replaced by the direction icon.
    pub indicator_cell: usize,
    pub easing: Easing,
    pub completion: CompletionPolicy,
    pub overlap: OverlapPolicy,
    /// Class marking mutable cells in row markup.
    pub mutable_class: String,
    /// Class put on the table while rows move.
    pub moving_class: String,
    pub up_icon: String,
    pub down_icon: String,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1200,
            pause_ms: None,
            lateral_offset_px: 20.0,
            stagger_ms: 100,
            indicator_cell: 1,
            easing: Easing::Linear,
            completion: CompletionPolicy::Derived,
            overlap: OverlapPolicy::Reject,
            mutable_class: "sb-update".to_string(),
            moving_class: "sb-moving".to_string(),
            up_icon: "fa fa-arrow-circle-up text-success".to_string(),
            down_icon: "fa fa-arrow-circle-down text-danger".to_string(),
        }
    }
}

impl TransitionConfig {
    pub fn pause_ms(&self) -> u64 {
        self.pause_ms.unwrap_or(self.duration_ms / 3)
    }

    /// Length of a full move: slide out, pause, slide vertically, pause,
    /// slide back.
    pub fn move_budget_ms(&self) -> u64 {
        self.duration_ms * 3 + self.pause_ms() * 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_ms == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.mutable_class.trim().is_empty() {
            return Err(ConfigError::EmptyClass("mutable_class"));
        }
        if self.mutable_class.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidClass {
                field: "mutable_class",
                value: self.mutable_class.clone(),
            });
        }
        if !self.lateral_offset_px.is_finite() {
            return Err(ConfigError::NonFiniteOffset);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroDuration,
    EmptyClass(&'static str),
    InvalidClass { field: &'static str, value: String },
    NonFiniteOffset,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroDuration => write!(f, "duration_ms must be greater than zero"),
            ConfigError::EmptyClass(field) => write!(f, "{} must not be empty", field),
            ConfigError::InvalidClass { field, value } => {
                write!(f, "{} must be a single class name, got '{}'", field, value)
            }
            ConfigError::NonFiniteOffset => write!(f, "lateral_offset_px must be finite"),
        }
    }
}

impl std::error::Error for ConfigError {}
