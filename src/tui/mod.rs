//! Terminal front panel for the Kenbak-1 emulator.
//!
//! Provides an interactive panel with:
//! - The twelve lamps and the data/control buttons on the keyboard
//! - Register and memory views in octal
//! - Single-step, run and breakpoint controls
//! - Disassembly view

mod app;
mod ui;

pub use app::{PanelApp, run_panel};
