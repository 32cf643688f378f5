//! Logging targets for Perch core systems.
//!
//! Perch uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the application installs a subscriber (the `perch` crate provides
//! `perch::logging::init`). Filter by subsystem with the targets below:
//!
//! ```text
//! RUST_LOG=perch_core::frame_sync=trace,perch::bubble=debug
//! ```

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "perch_core";
    /// Logical/physical conversion.
    pub const GEOMETRY: &str = "perch_core::geometry";
    /// Sprite decoding and mask construction.
    pub const HIT_MASK: &str = "perch_core::hit_mask";
    /// Pointer classification and click-through gating.
    pub const CLASSIFIER: &str = "perch_core::classifier";
    /// Coalesced position scheduling.
    pub const FRAME_SYNC: &str = "perch_core::frame_sync";
    /// Signal emission.
    pub const SIGNAL: &str = "perch_core::signal";
}
