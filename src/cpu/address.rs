//! Operand addressing.
//!
//! All CPU memory traffic goes through [`Cpu::read_byte`] and
//! [`Cpu::write_byte`], which route the nine register addresses to the
//! register bank before anything reaches the bus.

use crate::cpu::decode::AddrMode;
use crate::cpu::execute::Cpu;
use crate::cpu::memory::Bus;
use crate::cpu::registers::Register;

impl<B: Bus> Cpu<B> {
    /// Read a byte of the address space, registers included.
    pub fn read_byte(&mut self, addr: u8) -> u8 {
        match Register::at(addr) {
            Some(reg) => self.regs.get(reg),
            None => self.bus.read_byte(addr),
        }
    }

    /// Write a byte of the address space, registers included.
    pub fn write_byte(&mut self, addr: u8, value: u8) {
        match Register::at(addr) {
            Some(reg) => self.regs.set(reg, value),
            None => self.bus.write_byte(addr, value),
        }
    }

    /// Address of the cell an operand refers to. `None` for constants.
    pub fn effective_address(&mut self, mode: AddrMode, operand: u8) -> Option<u8> {
        let x = self.regs.get(Register::X);
        match mode {
            AddrMode::Constant => None,
            AddrMode::Memory => Some(operand),
            AddrMode::Indirect => Some(self.read_byte(operand)),
            AddrMode::Indexed => Some(operand.wrapping_add(x)),
            AddrMode::IndirectIndexed => Some(self.read_byte(operand).wrapping_add(x)),
        }
    }

    /// Value an operand resolves to.
    pub fn read_operand(&mut self, mode: AddrMode, operand: u8) -> u8 {
        match self.effective_address(mode, operand) {
            Some(addr) => self.read_byte(addr),
            None => operand,
        }
    }

    /// Store through an operand. Storing to a constant does nothing.
    pub fn write_operand(&mut self, mode: AddrMode, operand: u8, value: u8) {
        if let Some(addr) = self.effective_address(mode, operand) {
            self.write_byte(addr, value);
        }
    }

    /// Destination of a jump.
    ///
    /// Jumps read their operand differently from everything else: MEMORY
    /// names the destination itself and INDIRECT names the cell holding it.
    pub fn jump_target(&mut self, mode: AddrMode, operand: u8) -> u8 {
        match mode {
            AddrMode::Indirect => self.read_byte(operand),
            _ => operand,
        }
    }
}
