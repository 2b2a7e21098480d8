//! Kenbak-1 registers.
//!
//! The Kenbak-1 has no separate register file: its nine registers live at
//! fixed addresses of the 256-byte memory space and shadow the RAM there.
//!
//! | Register | Address | Purpose                          |
//! |----------|---------|----------------------------------|
//! | A        | 000     | accumulator                      |
//! | B        | 001     | second accumulator               |
//! | X        | 002     | index register                   |
//! | P        | 003     | program counter                  |
//! | OUT      | 200     | output lamps                     |
//! | OCA      | 201     | overflow/carry for A             |
//! | OCB      | 202     | overflow/carry for B             |
//! | OCX      | 203     | overflow/carry for X             |
//! | IN       | 377     | front panel data switches        |

use serde::{Serialize, Deserialize};
use std::fmt;

/// A register identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    A,
    B,
    X,
    /// Program counter.
    P,
    Out,
    Oca,
    Ocb,
    Ocx,
    In,
}

impl Register {
    /// Every register, in bank order.
    pub const ALL: [Register; 9] = [
        Register::A,
        Register::B,
        Register::X,
        Register::P,
        Register::Out,
        Register::Oca,
        Register::Ocb,
        Register::Ocx,
        Register::In,
    ];

    /// Fixed address of the register in the memory space.
    pub const fn address(self) -> u8 {
        match self {
            Register::A => 0o000,
            Register::B => 0o001,
            Register::X => 0o002,
            Register::P => 0o003,
            Register::Out => 0o200,
            Register::Oca => 0o201,
            Register::Ocb => 0o202,
            Register::Ocx => 0o203,
            Register::In => 0o377,
        }
    }

    /// Find the register mapped at `addr`, if any.
    pub fn at(addr: u8) -> Option<Register> {
        Self::ALL.into_iter().find(|reg| reg.address() == addr)
    }

    /// Display name as used by the disassembler.
    pub const fn name(self) -> &'static str {
        match self {
            Register::A => "A",
            Register::B => "B",
            Register::X => "X",
            Register::P => "P",
            Register::Out => "OUT",
            Register::Oca => "OCA",
            Register::Ocb => "OCB",
            Register::Ocx => "OCX",
            Register::In => "IN",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The Kenbak-1 register bank.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    cells: [u8; 9],
}

impl Registers {
    /// Create a register bank with all values zeroed.
    pub fn new() -> Self {
        Self { cells: [0; 9] }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.cells = [0; 9];
    }

    #[inline]
    pub fn get(&self, reg: Register) -> u8 {
        self.cells[reg.index()]
    }

    #[inline]
    pub fn set(&mut self, reg: Register, value: u8) {
        self.cells[reg.index()] = value;
    }

    /// Mutable access to a single register cell.
    #[inline]
    pub fn cell_mut(&mut self, reg: Register) -> &mut u8 {
        &mut self.cells[reg.index()]
    }

    /// The program counter.
    #[inline]
    pub fn pc(&self) -> u8 {
        self.get(Register::P)
    }

    /// Increment the program counter by 1 (wrapping).
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u8 {
        let old = self.pc();
        self.set(Register::P, old.wrapping_add(1));
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u8) {
        self.set(Register::P, addr);
    }
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for reg in Register::ALL {
            map.entry(&reg.name(), &format_args!("{:03o}", self.get(reg)));
        }
        map.finish()
    }
}
