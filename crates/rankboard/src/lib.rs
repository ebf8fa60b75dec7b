//! Animated keyed reconciliation for ranking tables.
//!
//! A scoreboard shows ordered rows. When a new ranking arrives, rows that
//! changed position glide to their new slot with a direction icon, rows
//! whose scores changed fade the new values in, and rows that did not change
//! are left alone.
//!
//! ```no_run
//! use rankboard::{feed, MemorySurface, Reconciler, TransitionConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TransitionConfig::default();
//! let initial = feed::decode_update(&std::fs::read_to_string("initial.json")?, &config.mutable_class)?;
//! let next = feed::decode_update(&std::fs::read_to_string("next.json")?, &config.mutable_class)?;
//!
//! let surface = MemorySurface::from_snapshot(&initial.into_snapshot());
//! let mut reconciler = Reconciler::new(surface, config)?;
//! reconciler.reconcile_with(next, |summary| println!("{}", summary))?;
//! reconciler.run_to_end()?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod clock;
pub mod config;
pub mod feed;
pub mod markup;
pub mod platform;
pub mod ranking;
pub mod reconciler;
pub mod row;
pub mod snapshot;
pub mod surface;
pub mod timeline;

pub use classify::{classify, Classification, Plan, RowChange};
pub use config::{CompletionPolicy, OverlapPolicy, TransitionConfig};
pub use platform::memory::MemorySurface;
pub use reconciler::{
    Callbacks, Outcome, ReconcileError, ReconcileSummary, Reconciler, StaleContainer,
};
pub use row::{Cell, Row, RowError, RowKey};
pub use snapshot::{Snapshot, Update};
pub use surface::Surface;
