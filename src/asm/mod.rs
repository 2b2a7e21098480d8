//! Program images and disassembly for the Kenbak-1.
//!
//! This module provides:
//! - A disassembler (memory → readable listing)
//! - The octal `.kbk` program image format

pub mod disasm;
pub mod image;

pub use disasm::{disassemble, disassemble_memory, format_instruction};
pub use image::{load_image, parse_image, save_image, ImageError, ProgramImage};
