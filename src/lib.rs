//! # Kenbak-1 Emulator
//!
//! An emulator of the Kenbak-1 (1971), an early personal computer with a
//! single accumulator-style instruction set, 256 bytes of memory and a
//! front panel of buttons and lamps.
//!
//! Carry and overflow are not computed: the OCA/OCB/OCX registers exist and
//! can be read and written, but arithmetic never updates them.

pub mod cpu;
pub mod asm;
pub mod config;
pub mod panel;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{decode, Bus, Cpu, CpuState, Instruction, Memory, PanelSink, Register, Registers};
pub use asm::{disassemble, disassemble_memory, load_image, parse_image, ImageError, ProgramImage};
pub use config::{ConfigError, MachineConfig};
pub use panel::{Button, FrontPanel, Lamps};

#[cfg(feature = "tui")]
pub use tui::run_panel;
