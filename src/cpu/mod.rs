//! CPU emulation for the Kenbak-1 computer.
//!
//! This module implements the Kenbak-1 (1971) architecture:
//! - 256 bytes of memory, nine of them registers
//! - registers A, B, X, P (program counter), OUT, OCA, OCB, OCX, IN
//! - octal-encoded opcodes with five addressing modes

pub mod memory;
pub mod registers;
pub mod decode;
pub mod address;
pub mod execute;
pub mod sink;

pub use memory::{Bus, Memory, MemoryError};
pub use registers::{Register, Registers};
pub use decode::{decode, AddrMode, Condition, Function, Instruction};
pub use execute::{Cpu, CpuState};
pub use sink::{Notification, PanelSink, Recorder};
