pub mod memory;

// Browser backend (feature-gated)
#[cfg(feature = "web")]
pub mod browser;
