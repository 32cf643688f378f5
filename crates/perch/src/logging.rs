//! Logging setup for applications embedding the overlay.
//!
//! Library code only emits `tracing` events. Binaries call [`init`] once at
//! startup to print them.

use tracing_subscriber::EnvFilter;

/// Target names for log filtering.
pub mod targets {
    /// Bubble lifecycle and repositioning.
    pub const BUBBLE: &str = "perch::bubble";
    /// Sprite mask publishing and click-through fallback.
    pub const HIT_TEST: &str = "perch::hit_test";
    /// Event pump.
    pub const DRIVER: &str = "perch::driver";
    /// Configuration loading.
    pub const CONFIG: &str = "perch::config";
    /// Top-level controller.
    pub const OVERLAY: &str = "perch::overlay";
}

/// Install a formatting subscriber.
///
/// `RUST_LOG` overrides `filter` when set. Returns `false` if a global
/// subscriber was already installed, in which case nothing changes.
pub fn init(filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init("perch=debug");
        assert!(!init("perch=trace"));
    }
}
