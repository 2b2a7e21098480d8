//! Kenbak-1 memory subsystem.
//!
//! The Kenbak-1 had 256 bytes of memory. Eight of them (plus IN) are
//! registers; the CPU intercepts those addresses before they reach the
//! bus, so the RAM behind them is never touched by a running program.

use crate::cpu::registers::Register;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of addressable bytes.
pub const MEMORY_SIZE: usize = 256;

/// Byte-wide memory bus seen by the CPU.
pub trait Bus {
    fn read_byte(&mut self, addr: u8) -> u8;
    fn write_byte(&mut self, addr: u8, value: u8);
}

/// Plain 256-byte RAM.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    #[inline]
    pub fn read(&self, addr: u8) -> u8 {
        self.cells[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u8, value: u8) {
        self.cells[addr as usize] = value;
    }

    /// Whether `addr` is general-purpose RAM rather than a register cell.
    pub fn is_ram(addr: u8) -> bool {
        matches!(addr, 0o004..=0o177 | 0o204..=0o376)
    }

    /// Load a program into memory starting at the given address.
    pub fn load_program(&mut self, start_addr: u8, program: &[u8]) -> Result<(), MemoryError> {
        let start = start_addr as usize;
        if start + program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE - start,
            });
        }

        self.cells[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Raw view of all 256 cells.
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }
}

impl Bus for Memory {
    fn read_byte(&mut self, addr: u8) -> u8 {
        self.read(addr)
    }

    fn write_byte(&mut self, addr: u8, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count RAM cells that hold something
        let non_zero = (0..=255u8)
            .filter(|&addr| Register::at(addr).is_none() && self.read(addr) != 0)
            .count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.write(0o010, 42);
        assert_eq!(mem.read(0o010), 42);
        assert_eq!(mem.read_byte(0o010), 42);
    }

    #[test]
    fn test_ram_bands() {
        assert!(!Memory::is_ram(0o000));
        assert!(!Memory::is_ram(0o003));
        assert!(Memory::is_ram(0o004));
        assert!(Memory::is_ram(0o177));
        assert!(!Memory::is_ram(0o200));
        assert!(!Memory::is_ram(0o203));
        assert!(Memory::is_ram(0o204));
        assert!(Memory::is_ram(0o376));
        assert!(!Memory::is_ram(0o377));

        let ram = (0..=255u8).filter(|&a| Memory::is_ram(a)).count();
        assert_eq!(ram, MEMORY_SIZE - Register::ALL.len());
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::new();
        mem.load_program(0o004, &[1, 2, 3]).unwrap();

        assert_eq!(mem.read(0o004), 1);
        assert_eq!(mem.read(0o005), 2);
        assert_eq!(mem.read(0o006), 3);
    }

    #[test]
    fn test_load_program_too_large() {
        let mut mem = Memory::new();
        let err = mem.load_program(0o370, &[0; 16]).unwrap_err();
        assert_eq!(err, MemoryError::ProgramTooLarge { size: 16, available: 8 });
    }
}
