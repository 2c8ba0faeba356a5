//! Frame-accurate flicker entrainment and Glass-pattern stimuli.
//!
//! * [`timing`]: frame-rate selection, drift-corrected pulse scheduling and
//!   rolling timing statistics.
//! * [`glass`]: seeded Glass (dipole) pattern synthesis.
//! * [`display`]: the drawing/presentation seams both depend on, plus an
//!   in-memory frame buffer.
//! * [`visualization`]: eframe windows that put the above on a monitor.

pub mod bindings;
pub mod config;
pub mod display;
pub mod error;
pub mod glass;
pub mod timing;
pub mod utils;
pub mod visualization;

pub use error::{Result, StimulusError};
