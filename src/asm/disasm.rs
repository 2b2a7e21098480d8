//! Disassembler for Kenbak-1 programs.
//!
//! Syntax follows the common Kenbak-1 listing style. Addresses and
//! constants are octal; a direct operand that names a register address is
//! shown as the register name.

use crate::cpu::decode::{decode, AddrMode, Function, Instruction, UNCONDITIONAL};
use crate::cpu::registers::Register;
use crate::cpu::memory::MEMORY_SIZE;

/// Disassemble the instruction at `address`.
///
/// `fetch` reads a byte of the program. Returns the text and the number of
/// bytes the instruction occupies. Register addresses are never decoded as
/// instructions.
pub fn disassemble(address: u8, mut fetch: impl FnMut(u8) -> u8) -> (String, usize) {
    if let Some(reg) = Register::at(address) {
        return (format!("REG<{}>", reg), 1);
    }

    let instr = decode(fetch(address));
    let operand = if instr.has_operand() {
        fetch(address.wrapping_add(1))
    } else {
        0
    };

    (format_instruction(&instr, operand), instr.len())
}

/// Disassemble a whole 256-byte memory image.
pub fn disassemble_memory(image: &[u8]) -> String {
    let byte_at = |addr: u8| image.get(addr as usize).copied().unwrap_or(0);

    let mut output = String::new();
    output.push_str("; Kenbak-1 Disassembly\n");
    output.push_str("; --------------------\n\n");

    let mut addr = 0usize;
    while addr < MEMORY_SIZE {
        let (text, len) = disassemble(addr as u8, byte_at);
        let raw: Vec<String> = (0..len)
            .map(|i| format!("{:03o}", byte_at((addr + i) as u8)))
            .collect();
        output.push_str(&format!("{:03o}: {:<8} {}\n", addr, raw.join(" "), text));
        addr += len;
    }

    output
}

/// Format a decoded instruction and its operand byte as assembly text.
pub fn format_instruction(instr: &Instruction, operand: u8) -> String {
    let mnemonic = instr.function.mnemonic();
    let reg = instr.register.map_or("", Register::name);

    match instr.function {
        Function::Add | Function::Sub | Function::Load => {
            format!("{} {} {}", mnemonic, reg, format_operand(instr.mode, operand))
        }
        Function::Store => {
            format!("{} {} {}", mnemonic, format_operand(instr.mode, operand), reg)
        }
        Function::Or | Function::And | Function::Lneg => {
            format!("{} {}", mnemonic, format_operand(instr.mode, operand))
        }
        Function::Jpd | Function::Jpi | Function::Jmd | Function::Jmi => match instr.condition {
            Some(cond) => format!(
                "{} {} {} {}",
                mnemonic,
                reg,
                cond.symbol(),
                format_operand(instr.mode, operand)
            ),
            None => format!("{} {} {}", mnemonic, UNCONDITIONAL, format_operand(instr.mode, operand)),
        },
        Function::Skp0 | Function::Skp1 | Function::Set0 | Function::Set1 => format!(
            "{} b{} {}",
            mnemonic,
            instr.bit.unwrap_or(0),
            format_operand(instr.mode, operand)
        ),
        Function::Sftl | Function::Sftr | Function::Rotl | Function::Rotr => {
            format!("{} {}{}", mnemonic, reg, instr.bit.unwrap_or(0))
        }
        Function::Noop | Function::Halt => mnemonic.to_string(),
    }
}

/// Format an operand byte according to its addressing mode.
fn format_operand(mode: Option<AddrMode>, operand: u8) -> String {
    match mode {
        Some(AddrMode::Constant) => format!("#{:03o}", operand),
        Some(AddrMode::Memory) => match Register::at(operand) {
            Some(reg) => reg.name().to_string(),
            None => format!("{:03o}", operand),
        },
        Some(AddrMode::Indirect) => format!("({:03o})", operand),
        Some(AddrMode::Indexed) => format!("{:03o}, {}", operand, Register::X),
        Some(AddrMode::IndirectIndexed) => format!("({:03o}), {}", operand, Register::X),
        None => String::new(),
    }
}
