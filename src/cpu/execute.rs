//! CPU execution engine for the Kenbak-1.
//!
//! Implements the fetch-decode-execute cycle, all instruction behaviors and
//! the front panel control operations.
//!
//! Known limitations carried from the hardware description this follows:
//! timing is a fixed cost per instruction, and ADD/SUB/LNEG never update
//! the OCA/OCB/OCX overflow-carry registers.

use crate::asm::disasm::format_instruction;
use crate::cpu::decode::{self, Function, Instruction};
use crate::cpu::memory::{Bus, Memory, MemoryError};
use crate::cpu::registers::{Register, Registers};
use crate::cpu::sink::PanelSink;
use log::{debug, log_enabled, trace, Level};
use serde::{Serialize, Deserialize};

/// Budget charged for each executed instruction.
pub const DEFAULT_CYCLES_PER_INSTRUCTION: u32 = 2000;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (HALT instruction or the Stop button).
    Halted,
}

/// The Kenbak-1 CPU.
#[derive(Clone)]
pub struct Cpu<B: Bus = Memory> {
    /// CPU registers.
    pub regs: Registers,
    /// Memory behind the register overlay.
    pub bus: B,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed since reset.
    pub executed: u64,
    /// Budget left in the current burst.
    icount: i64,
    cycles_per_instruction: u32,
    /// Front panel address latch.
    address: u8,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu<Memory> {
    /// Create a new CPU with zeroed RAM.
    pub fn new() -> Self {
        Self::with_bus(Memory::new())
    }

    /// Load a program into RAM.
    pub fn load_program(&mut self, start_addr: u8, program: &[u8]) -> Result<(), MemoryError> {
        self.bus.load_program(start_addr, program)
    }
}

impl<B: Bus> Cpu<B> {
    /// Create a CPU in its reset state on top of `bus`.
    pub fn with_bus(bus: B) -> Self {
        Self {
            regs: Registers::new(),
            bus,
            state: CpuState::Running,
            executed: 0,
            icount: 0,
            cycles_per_instruction: DEFAULT_CYCLES_PER_INSTRUCTION,
            address: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to initial state. Memory and the address latch are
    /// left alone.
    pub fn reset(&mut self) {
        debug!("cpu reset");
        self.regs.reset();
        self.state = CpuState::Running;
        self.executed = 0;
        self.icount = 0;
        self.last_instr = None;
    }

    /// Set the budget charged for each instruction.
    pub fn set_cycles_per_instruction(&mut self, cycles: u32) {
        self.cycles_per_instruction = cycles;
    }

    pub fn cycles_per_instruction(&self) -> u32 {
        self.cycles_per_instruction
    }

    /// Budget left in the current burst.
    pub fn remaining_budget(&self) -> i64 {
        self.icount
    }

    /// Execute a single instruction and notify `sink`.
    ///
    /// A halted CPU executes nothing, drops whatever is left of the burst
    /// budget and returns `None`.
    pub fn step(&mut self, sink: &mut impl PanelSink) -> Option<Instruction> {
        if self.state == CpuState::Halted {
            self.icount = 0;
            return None;
        }

        let instr = self.execute_one();

        self.icount -= i64::from(self.cycles_per_instruction);
        self.executed += 1;
        self.last_instr = Some(instr);

        sink.write_out(self.regs.get(Register::Out));
        sink.write_halt(self.is_halted());

        Some(instr)
    }

    /// Run one burst with `budget` cycles.
    ///
    /// At least one step is always attempted. Returns the number of
    /// instructions executed.
    pub fn run(&mut self, budget: i64, sink: &mut impl PanelSink) -> u64 {
        let start = self.executed;
        self.icount = budget;

        loop {
            if self.step(sink).is_none() || self.icount <= 0 {
                break;
            }
        }

        self.executed - start
    }

    /// Run for at most `max_instructions` instructions in a single burst.
    pub fn run_limited(&mut self, max_instructions: u64, sink: &mut impl PanelSink) -> u64 {
        self.run_bursts(i64::MAX, max_instructions, sink)
    }

    /// Run bursts of `burst` cycles until the CPU halts or
    /// `max_instructions` have executed. The last burst is cut short so the
    /// limit is never overshot.
    pub fn run_bursts(&mut self, burst: i64, max_instructions: u64, sink: &mut impl PanelSink) -> u64 {
        let per_instruction = i64::from(self.cycles_per_instruction.max(1));
        let mut executed = 0;

        while self.is_running() && executed < max_instructions {
            let remaining = i64::try_from(max_instructions - executed).unwrap_or(i64::MAX);
            let budget = burst.min(remaining.saturating_mul(per_instruction));
            executed += self.run(budget, sink);
        }

        executed
    }

    /// Fetch the byte at P and advance P.
    fn fetch(&mut self) -> u8 {
        let pc = self.regs.advance_pc();
        self.read_byte(pc)
    }

    fn execute_one(&mut self) -> Instruction {
        let pc = self.regs.pc();
        let instr = decode::decode(self.fetch());
        let operand = if instr.has_operand() { self.fetch() } else { 0 };

        if log_enabled!(Level::Trace) {
            trace!("{:03o}: {}", pc, format_instruction(&instr, operand));
        }

        self.execute(&instr, operand);
        instr
    }

    /// Execute a decoded instruction whose operand byte has been fetched.
    fn execute(&mut self, instr: &Instruction, operand: u8) {
        match instr.function {
            // ==================== Arithmetic ====================

            // TODO: set OCA/OCB/OCX once carry and overflow are modelled
            Function::Add => {
                let value = self.read_operand(instr.addr_mode(), operand);
                let reg = self.regs.cell_mut(instr.reg());
                *reg = reg.wrapping_add(value);
            }

            Function::Sub => {
                let value = self.read_operand(instr.addr_mode(), operand);
                let reg = self.regs.cell_mut(instr.reg());
                *reg = reg.wrapping_sub(value);
            }

            // ==================== Data Transfer ====================

            Function::Load => {
                let value = self.read_operand(instr.addr_mode(), operand);
                self.regs.set(instr.reg(), value);
            }

            Function::Store => {
                let value = self.regs.get(instr.reg());
                self.write_operand(instr.addr_mode(), operand, value);
            }

            // ==================== Logical ====================

            Function::Or => {
                let value = self.read_operand(instr.addr_mode(), operand);
                *self.regs.cell_mut(instr.reg()) |= value;
            }

            Function::And => {
                let value = self.read_operand(instr.addr_mode(), operand);
                *self.regs.cell_mut(instr.reg()) &= value;
            }

            Function::Lneg => {
                let value = self.read_operand(instr.addr_mode(), operand) as i8;
                // -128 is loaded unchanged and OCA is not touched
                let negated = value.checked_neg().unwrap_or(value);
                self.regs.set(instr.reg(), negated as u8);
            }

            // ==================== Control Flow ====================

            Function::Jpd | Function::Jpi | Function::Jmd | Function::Jmi => {
                self.jump(instr, operand);
            }

            Function::Skp0 | Function::Skp1 => {
                let value = self.read_byte(operand);
                let bit_set = value & (1 << instr.bit_position()) != 0;
                if bit_set == (instr.function == Function::Skp1) {
                    // Always two bytes, whatever the next instruction's length
                    let pc = self.regs.pc();
                    self.regs.jump(pc.wrapping_add(2));
                }
            }

            Function::Halt => {
                debug!("HALT at {:03o}", self.regs.pc().wrapping_sub(1));
                self.state = CpuState::Halted;
            }

            Function::Noop => {}

            // ==================== Bit Operations ====================

            Function::Set0 | Function::Set1 => {
                let mask = 1 << instr.bit_position();
                let value = self.read_byte(operand);
                let value = if instr.function == Function::Set1 {
                    value | mask
                } else {
                    value & !mask
                };
                self.write_byte(operand, value);
            }

            // ==================== Shift Operations ====================

            Function::Sftl | Function::Sftr | Function::Rotl | Function::Rotr => {
                let reg = self.regs.cell_mut(instr.reg());
                *reg = shift_rotate(instr.function, *reg, instr.bit_position());
            }
        }
    }

    fn jump(&mut self, instr: &Instruction, operand: u8) {
        let taken = match instr.condition {
            Some(cond) => cond.holds(self.regs.get(instr.reg())),
            None => true,
        };
        if !taken {
            return;
        }

        let mut target = self.jump_target(instr.addr_mode(), operand);
        if instr.mark {
            let ret = self.regs.pc();
            self.write_byte(target, ret);
            target = target.wrapping_add(1);
        }
        self.regs.jump(target);
    }

    // ==================== Front Panel ====================

    /// OR a data switch into IN.
    pub fn set_input_bit(&mut self, bit: u8) {
        *self.regs.cell_mut(Register::In) |= 1 << (bit & 7);
    }

    /// Zero IN.
    pub fn clear_input(&mut self) {
        self.regs.set(Register::In, 0);
    }

    pub fn get_input(&self) -> u8 {
        self.regs.get(Register::In)
    }

    /// Latch IN as the front panel address.
    pub fn set_address(&mut self) {
        self.address = self.regs.get(Register::In);
    }

    /// Show the latched address on OUT.
    pub fn display_address(&mut self) {
        self.regs.set(Register::Out, self.address);
    }

    /// Store IN at the latched address and advance the latch.
    pub fn store_value(&mut self) {
        let value = self.regs.get(Register::In);
        self.write_byte(self.address, value);
        self.address = self.address.wrapping_add(1);
    }

    /// Show the byte at the latched address on OUT.
    pub fn read_value(&mut self) {
        let value = self.read_byte(self.address);
        self.regs.set(Register::Out, value);
    }

    /// Current front panel address latch.
    pub fn address_latch(&self) -> u8 {
        self.address
    }

    /// Start or stop the CPU from outside the instruction stream.
    pub fn set_halt(&mut self, halt: bool, sink: &mut impl PanelSink) {
        debug!("halt {}", if halt { "set" } else { "cleared" });
        self.state = if halt { CpuState::Halted } else { CpuState::Running };
        sink.write_halt(halt);
    }

    pub fn get_halt(&self) -> bool {
        self.is_halted()
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

/// Shift or rotate `value` by `places`.
///
/// SFTR divides by two once, as a signed value, no matter what `places` is.
pub fn shift_rotate(function: Function, value: u8, places: u8) -> u8 {
    match function {
        Function::Sftl => value.checked_shl(u32::from(places)).unwrap_or(0),
        Function::Sftr => ((value as i8) / 2) as u8,
        Function::Rotl => value.rotate_left(u32::from(places)),
        Function::Rotr => value.rotate_right(u32::from(places)),
        other => unreachable!("{:?} is not a shift or rotate", other),
    }
}

impl Default for Cpu<Memory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Bus> std::fmt::Debug for Cpu<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("executed", &self.executed)
            .field("regs", &self.regs)
            .finish()
    }
}
