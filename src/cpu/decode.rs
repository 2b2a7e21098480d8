//! Instruction decoder for the Kenbak-1.
//!
//! Kenbak-1 opcodes are read as three octal digits. For an opcode byte
//! `hi mid low` (bits 7-6, 5-3, 2-0):
//!
//! - `low = 0`: HALT / NOOP
//! - `low = 1`: shift and rotate, on A or B
//! - `low = 2`: set or skip on a memory bit
//! - `low >= 3, mid >= 4`: jumps, optionally conditional on A, B or X
//! - `low >= 3, mid < 4, hi = 3`: OR / AND / LNEG on A
//! - otherwise: ADD / SUB / LOAD / STORE on A, B or X
//!
//! Every one of the 256 byte values decodes to something; there is no
//! invalid opcode.

use crate::cpu::registers::Register;
use serde::{Serialize, Deserialize};

/// Instruction function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Add,
    Sub,
    Load,
    Store,
    Or,
    And,
    /// Load negative.
    Lneg,
    /// Jump direct.
    Jpd,
    /// Jump indirect.
    Jpi,
    /// Jump direct and mark.
    Jmd,
    /// Jump indirect and mark.
    Jmi,
    Skp0,
    Skp1,
    Set0,
    Set1,
    Sftl,
    Sftr,
    Rotl,
    Rotr,
    Noop,
    Halt,
}

impl Function {
    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Function::Add => "add",
            Function::Sub => "sub",
            Function::Load => "load",
            Function::Store => "store",
            Function::Or => "or",
            Function::And => "and",
            Function::Lneg => "lneg",
            Function::Jpd => "jpd",
            Function::Jpi => "jpi",
            Function::Jmd => "jmd",
            Function::Jmi => "jmi",
            Function::Skp0 => "skp 0",
            Function::Skp1 => "skp 1",
            Function::Set0 => "set 0",
            Function::Set1 => "set 1",
            Function::Sftl => "sftl",
            Function::Sftr => "sftr",
            Function::Rotl => "rotl",
            Function::Rotr => "rotr",
            Function::Noop => "noop",
            Function::Halt => "halt",
        }
    }
}

/// Operand addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddrMode {
    /// The operand byte is the value.
    Constant,
    /// The operand byte is the address of the value.
    Memory,
    /// The operand byte addresses a pointer to the value.
    Indirect,
    /// Operand byte + X addresses the value.
    Indexed,
    /// The operand byte addresses a pointer; pointer + X addresses the value.
    IndirectIndexed,
}

impl AddrMode {
    /// Mode selected by the low octal digit of an ALU or bitwise opcode.
    fn from_low(low: u8) -> Option<Self> {
        match low {
            3 => Some(AddrMode::Constant),
            4 => Some(AddrMode::Memory),
            5 => Some(AddrMode::Indirect),
            6 => Some(AddrMode::Indexed),
            7 => Some(AddrMode::IndirectIndexed),
            _ => None,
        }
    }
}

/// Jump condition, tested against the signed value of the jump register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// != 0
    NonZero,
    /// = 0
    Zero,
    /// < 0
    Negative,
    /// >= 0
    Positive,
    /// > 0
    PositiveNonZero,
}

impl Condition {
    fn from_low(low: u8) -> Option<Self> {
        match low {
            3 => Some(Condition::NonZero),
            4 => Some(Condition::Zero),
            5 => Some(Condition::Negative),
            6 => Some(Condition::Positive),
            7 => Some(Condition::PositiveNonZero),
            _ => None,
        }
    }

    /// Whether the condition holds for `value`.
    pub fn holds(self, value: u8) -> bool {
        let signed = value as i8;
        match self {
            Condition::NonZero => signed != 0,
            Condition::Zero => signed == 0,
            Condition::Negative => signed < 0,
            Condition::Positive => signed >= 0,
            Condition::PositiveNonZero => signed > 0,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Condition::NonZero => "!=0",
            Condition::Zero => "=0",
            Condition::Negative => "<0",
            Condition::Positive => ">=0",
            Condition::PositiveNonZero => ">0",
        }
    }
}

/// Symbol used for a jump without a condition.
pub const UNCONDITIONAL: &str = "UNC";

/// A decoded Kenbak-1 instruction.
///
/// `function` determines which of the other fields are populated. The
/// operand byte, when `mode` is present, is fetched separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Raw opcode byte.
    pub opcode: u8,
    pub function: Function,
    /// `None` means the instruction is a single byte.
    pub mode: Option<AddrMode>,
    /// Always A, B or X.
    pub register: Option<Register>,
    /// Bit index for SET/SKP, place count for shifts and rotates.
    pub bit: Option<u8>,
    /// `None` on a jump means unconditional.
    pub condition: Option<Condition>,
    /// Jump stores a return address at its target.
    pub mark: bool,
}

impl Instruction {
    fn new(opcode: u8, function: Function) -> Self {
        Self {
            opcode,
            function,
            mode: None,
            register: None,
            bit: None,
            condition: None,
            mark: false,
        }
    }

    /// Whether an operand byte follows the opcode.
    pub fn has_operand(&self) -> bool {
        self.mode.is_some()
    }

    /// Length of the instruction in bytes.
    pub fn len(&self) -> usize {
        if self.has_operand() { 2 } else { 1 }
    }

    /// The register operand.
    ///
    /// Only called for functions that decode always gives a register.
    pub(crate) fn reg(&self) -> Register {
        self.register.unwrap_or_else(|| {
            unreachable!("{:?} (opcode {:03o}) decoded without a register", self.function, self.opcode)
        })
    }

    /// The addressing mode.
    ///
    /// Only called for functions that decode always gives a mode.
    pub(crate) fn addr_mode(&self) -> AddrMode {
        self.mode.unwrap_or_else(|| {
            unreachable!("{:?} (opcode {:03o}) decoded without a mode", self.function, self.opcode)
        })
    }

    pub(crate) fn bit_position(&self) -> u8 {
        self.bit.unwrap_or_else(|| {
            unreachable!("{:?} (opcode {:03o}) decoded without a bit position", self.function, self.opcode)
        })
    }
}

/// Register selected by the high octal digit, for ALU and jump opcodes.
fn reg_from_hi(hi: u8) -> Option<Register> {
    match hi {
        0 => Some(Register::A),
        1 => Some(Register::B),
        2 => Some(Register::X),
        _ => None,
    }
}

/// Decode an opcode byte.
pub fn decode(opcode: u8) -> Instruction {
    let low = opcode & 0o007;
    let mid = (opcode & 0o070) >> 3;
    let hi = (opcode & 0o300) >> 6;

    match low {
        0 => Instruction::new(opcode, if hi & 2 != 0 { Function::Noop } else { Function::Halt }),
        1 => decode_shift_rotate(opcode, hi, mid),
        2 => decode_set_skip(opcode, hi, mid),
        _ if mid >= 4 => decode_jump(opcode, hi, mid, low),
        _ if hi == 3 => decode_bitwise(opcode, mid, low),
        _ => decode_alu(opcode, hi, mid, low),
    }
}

fn decode_shift_rotate(opcode: u8, hi: u8, mid: u8) -> Instruction {
    let function = match hi {
        0 => Function::Sftr,
        1 => Function::Rotr,
        2 => Function::Sftl,
        _ => Function::Sftr,
    };
    let places = if mid & 3 != 0 { mid & 3 } else { 4 };

    Instruction {
        register: Some(if mid & 4 != 0 { Register::B } else { Register::A }),
        bit: Some(places),
        ..Instruction::new(opcode, function)
    }
}

fn decode_set_skip(opcode: u8, hi: u8, mid: u8) -> Instruction {
    let function = match hi {
        0 => Function::Set0,
        1 => Function::Set1,
        2 => Function::Skp0,
        _ => Function::Skp1,
    };

    Instruction {
        mode: Some(AddrMode::Memory),
        bit: Some(mid),
        ..Instruction::new(opcode, function)
    }
}

fn decode_jump(opcode: u8, hi: u8, mid: u8, low: u8) -> Instruction {
    let (function, mode) = match mid & 3 {
        0 => (Function::Jpd, AddrMode::Memory),
        1 => (Function::Jpi, AddrMode::Indirect),
        2 => (Function::Jmd, AddrMode::Memory),
        _ => (Function::Jmi, AddrMode::Indirect),
    };
    let register = reg_from_hi(hi);
    // No register means unconditional
    let condition = register.and_then(|_| Condition::from_low(low));

    Instruction {
        mode: Some(mode),
        register,
        condition,
        mark: matches!(function, Function::Jmd | Function::Jmi),
        ..Instruction::new(opcode, function)
    }
}

fn decode_bitwise(opcode: u8, mid: u8, low: u8) -> Instruction {
    let function = match mid {
        0 => Function::Or,
        1 => return Instruction::new(opcode, Function::Noop),
        2 => Function::And,
        _ => Function::Lneg,
    };

    Instruction {
        mode: AddrMode::from_low(low),
        register: Some(Register::A),
        ..Instruction::new(opcode, function)
    }
}

fn decode_alu(opcode: u8, hi: u8, mid: u8, low: u8) -> Instruction {
    let function = match mid {
        0 => Function::Add,
        1 => Function::Sub,
        2 => Function::Load,
        _ => Function::Store,
    };

    Instruction {
        mode: AddrMode::from_low(low),
        register: reg_from_hi(hi),
        ..Instruction::new(opcode, function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_halt_noop() {
        assert_eq!(decode(0o000).function, Function::Halt);
        assert_eq!(decode(0o100).function, Function::Halt);
        assert_eq!(decode(0o200).function, Function::Noop);
        assert_eq!(decode(0o300).function, Function::Noop);
        assert!(!decode(0o000).has_operand());
    }

    #[test]
    fn test_decode_alu() {
        let add = decode(0o004);
        assert_eq!(add.function, Function::Add);
        assert_eq!(add.register, Some(Register::A));
        assert_eq!(add.mode, Some(AddrMode::Memory));

        let load_x = decode(0o223);
        assert_eq!(load_x.function, Function::Load);
        assert_eq!(load_x.register, Some(Register::X));
        assert_eq!(load_x.mode, Some(AddrMode::Constant));

        let store_b = decode(0o137);
        assert_eq!(store_b.function, Function::Store);
        assert_eq!(store_b.register, Some(Register::B));
        assert_eq!(store_b.mode, Some(AddrMode::IndirectIndexed));

        assert_eq!(decode(0o015).function, Function::Sub);
        assert_eq!(decode(0o015).mode, Some(AddrMode::Indirect));
        assert_eq!(decode(0o026).mode, Some(AddrMode::Indexed));
    }

    #[test]
    fn test_decode_bitwise() {
        let or = decode(0o303);
        assert_eq!(or.function, Function::Or);
        assert_eq!(or.mode, Some(AddrMode::Constant));
        assert_eq!(or.register, Some(Register::A));

        let noop = decode(0o314);
        assert_eq!(noop.function, Function::Noop);
        assert_eq!(noop.mode, None);

        assert_eq!(decode(0o324).function, Function::And);
        assert_eq!(decode(0o334).function, Function::Lneg);
        assert_eq!(decode(0o337).mode, Some(AddrMode::IndirectIndexed));
    }

    #[test]
    fn test_decode_jumps() {
        let jpd = decode(0o043);
        assert_eq!(jpd.function, Function::Jpd);
        assert_eq!(jpd.register, Some(Register::A));
        assert_eq!(jpd.condition, Some(Condition::NonZero));
        assert_eq!(jpd.mode, Some(AddrMode::Memory));
        assert!(!jpd.mark);

        let jpi = decode(0o154);
        assert_eq!(jpi.function, Function::Jpi);
        assert_eq!(jpi.register, Some(Register::B));
        assert_eq!(jpi.condition, Some(Condition::Zero));
        assert_eq!(jpi.mode, Some(AddrMode::Indirect));

        let jmd = decode(0o265);
        assert_eq!(jmd.function, Function::Jmd);
        assert_eq!(jmd.register, Some(Register::X));
        assert_eq!(jmd.condition, Some(Condition::Negative));
        assert!(jmd.mark);

        let jmi = decode(0o374);
        assert_eq!(jmi.function, Function::Jmi);
        assert_eq!(jmi.register, None);
        assert_eq!(jmi.condition, None);
        assert_eq!(jmi.mode, Some(AddrMode::Indirect));
        assert!(jmi.mark);

        assert_eq!(decode(0o046).condition, Some(Condition::Positive));
        assert_eq!(decode(0o047).condition, Some(Condition::PositiveNonZero));
    }

    #[test]
    fn test_decode_shift_rotate() {
        let sftr = decode(0o011);
        assert_eq!(sftr.function, Function::Sftr);
        assert_eq!(sftr.register, Some(Register::A));
        assert_eq!(sftr.bit, Some(1));
        assert_eq!(sftr.mode, None);

        let rotr_b = decode(0o171);
        assert_eq!(rotr_b.function, Function::Rotr);
        assert_eq!(rotr_b.register, Some(Register::B));
        assert_eq!(rotr_b.bit, Some(3));

        // Zero place count means four places
        let sftl = decode(0o201);
        assert_eq!(sftl.function, Function::Sftl);
        assert_eq!(sftl.bit, Some(4));

        // hi = 3 aliases SFTR
        assert_eq!(decode(0o321).function, Function::Sftr);
    }

    #[test]
    fn test_decode_set_skip() {
        let set0 = decode(0o072);
        assert_eq!(set0.function, Function::Set0);
        assert_eq!(set0.bit, Some(7));
        assert_eq!(set0.mode, Some(AddrMode::Memory));

        assert_eq!(decode(0o102).function, Function::Set1);
        assert_eq!(decode(0o232).function, Function::Skp0);
        assert_eq!(decode(0o352).function, Function::Skp1);
        assert_eq!(decode(0o352).bit, Some(5));
    }

    #[test]
    fn test_rotl_is_unreachable_by_decode() {
        // hi = 3 selects SFTR, not ROTL
        assert!((0..=255u8).all(|b| decode(b).function != Function::Rotl));
    }

    proptest! {
        #[test]
        fn prop_decode_is_total(byte in any::<u8>()) {
            let instr = decode(byte);
            prop_assert_eq!(instr.opcode, byte);
            match instr.function {
                Function::Add | Function::Sub | Function::Load | Function::Store
                | Function::Or | Function::And | Function::Lneg => {
                    prop_assert!(instr.mode.is_some());
                    prop_assert!(matches!(instr.register, Some(Register::A | Register::B | Register::X)));
                }
                Function::Jpd | Function::Jpi | Function::Jmd | Function::Jmi => {
                    prop_assert!(instr.mode.is_some());
                    prop_assert_eq!(instr.register.is_some(), instr.condition.is_some());
                    prop_assert_eq!(instr.mark, matches!(instr.function, Function::Jmd | Function::Jmi));
                }
                Function::Skp0 | Function::Skp1 | Function::Set0 | Function::Set1 => {
                    prop_assert_eq!(instr.mode, Some(AddrMode::Memory));
                    prop_assert!(instr.bit.map_or(false, |b| b < 8));
                }
                Function::Sftl | Function::Sftr | Function::Rotl | Function::Rotr => {
                    prop_assert!(instr.mode.is_none());
                    prop_assert!(matches!(instr.register, Some(Register::A | Register::B)));
                    prop_assert!(instr.bit.map_or(false, |b| (1..=4).contains(&b)));
                }
                Function::Noop | Function::Halt => prop_assert!(instr.mode.is_none()),
            }
        }
    }
}
