//! The Kenbak-1 front panel.
//!
//! Fifteen buttons and twelve lamps. The eight data buttons OR bits into
//! IN; the control buttons drive the CPU's manual memory access and
//! start/stop. The eight data lamps follow OUT while a program runs.

use crate::asm::ProgramImage;
use crate::cpu::{Bus, Cpu, Instruction, Memory, PanelSink, Register};
use log::debug;
use serde::{Serialize, Deserialize};

/// Data lamps 0-7.
pub const LAMP_BITS_MASK: u16 = 0x0FF;
pub const LAMP_INPUT_MASK: u16 = 0x100;
pub const LAMP_ADDRESS_MASK: u16 = 0x200;
pub const LAMP_MEMORY_MASK: u16 = 0x400;
pub const LAMP_RUN_MASK: u16 = 0x800;

/// A front panel button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    /// Data switch 0-7.
    Bit(u8),
    Clear,
    Display,
    Set,
    Read,
    Store,
    Start,
    Stop,
}

/// The lamp word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lamps(pub u16);

impl Lamps {
    /// The eight data lamps.
    pub fn bits(self) -> u8 {
        (self.0 & LAMP_BITS_MASK) as u8
    }

    pub fn is_lit(self, mask: u16) -> bool {
        self.0 & mask != 0
    }

    fn set_bits(&mut self, value: u8) {
        self.0 = (self.0 & !LAMP_BITS_MASK) | u16::from(value);
    }

    fn set_lamp(&mut self, mask: u16, lit: bool) {
        if lit {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// Light exactly one of the INPUT/ADDRESS/MEMORY lamps.
    fn select_mode(&mut self, mask: u16) {
        for lamp in [LAMP_INPUT_MASK, LAMP_ADDRESS_MASK, LAMP_MEMORY_MASK] {
            self.set_lamp(lamp, lamp == mask);
        }
    }
}

impl PanelSink for Lamps {
    fn write_out(&mut self, value: u8) {
        self.set_bits(value);
    }

    fn write_halt(&mut self, halted: bool) {
        self.set_lamp(LAMP_RUN_MASK, !halted);
    }
}

/// A CPU wired to its front panel.
#[derive(Debug, Clone)]
pub struct FrontPanel<B: Bus = Memory> {
    pub cpu: Cpu<B>,
    pub lamps: Lamps,
}

impl FrontPanel<Memory> {
    pub fn new() -> Self {
        Self::with_cpu(Cpu::new())
    }
}

impl<B: Bus> FrontPanel<B> {
    pub fn with_cpu(cpu: Cpu<B>) -> Self {
        let mut lamps = Lamps::default();
        lamps.write_out(cpu.regs.get(Register::Out));
        lamps.write_halt(cpu.is_halted());
        Self { cpu, lamps }
    }

    /// Press a button.
    pub fn press(&mut self, button: Button) {
        debug!("button {:?}", button);

        match button {
            Button::Bit(bit) => {
                self.cpu.set_input_bit(bit);
                self.show_input();
            }
            Button::Clear => {
                self.cpu.clear_input();
                self.show_input();
            }
            Button::Display => {
                self.cpu.display_address();
                self.show_out(LAMP_ADDRESS_MASK);
            }
            Button::Set => {
                self.cpu.set_address();
                self.show_out(LAMP_ADDRESS_MASK);
            }
            Button::Read => {
                self.cpu.read_value();
                self.show_out(LAMP_MEMORY_MASK);
            }
            Button::Store => {
                self.cpu.store_value();
                self.show_out(LAMP_MEMORY_MASK);
            }
            Button::Start => self.cpu.set_halt(false, &mut self.lamps),
            Button::Stop => self.cpu.set_halt(true, &mut self.lamps),
        }
    }

    /// Enter bytes at `addr` the way an operator would: set the address,
    /// then key in and store each byte.
    pub fn key_in(&mut self, addr: u8, bytes: &[u8]) {
        self.key_byte(addr);
        self.press(Button::Set);
        for &byte in bytes {
            self.key_byte(byte);
            self.press(Button::Store);
        }
        self.press(Button::Clear);
    }

    /// Write `image` through the register overlay and point P at its
    /// lowest RAM address, or at `fallback` when it writes no RAM. An image
    /// that writes P keeps its own start address.
    pub fn load(&mut self, image: &ProgramImage, fallback: u8) {
        for &(addr, value) in &image.cells {
            self.cpu.write_byte(addr, value);
        }
        if !image.cells.iter().any(|&(addr, _)| addr == Register::P.address()) {
            let start = image.origin().unwrap_or(fallback);
            self.cpu.regs.jump(start);
        }
        self.lamps.write_out(self.cpu.regs.get(Register::Out));
        debug!("loaded {} bytes, P={:03o}", image.len(), self.cpu.regs.pc());
    }

    fn key_byte(&mut self, value: u8) {
        self.press(Button::Clear);
        for bit in (0..8).filter(|bit| value & (1 << bit) != 0) {
            self.press(Button::Bit(bit));
        }
    }

    /// Run one execution burst.
    pub fn run_burst(&mut self, budget: i64) -> u64 {
        self.cpu.run(budget, &mut self.lamps)
    }

    /// Execute a single instruction.
    pub fn step(&mut self) -> Option<Instruction> {
        self.cpu.step(&mut self.lamps)
    }

    /// Reset the CPU and refresh the lamps.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.lamps.select_mode(0);
        self.lamps.write_out(self.cpu.regs.get(Register::Out));
        self.lamps.write_halt(self.cpu.is_halted());
    }

    fn show_input(&mut self) {
        self.lamps.select_mode(LAMP_INPUT_MASK);
        self.lamps.set_bits(self.cpu.get_input());
    }

    fn show_out(&mut self, mode: u16) {
        self.lamps.select_mode(mode);
        self.lamps.set_bits(self.cpu.regs.get(Register::Out));
    }
}

impl Default for FrontPanel<Memory> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_buttons_light_input() {
        let mut panel = FrontPanel::new();

        panel.press(Button::Bit(0));
        panel.press(Button::Bit(7));

        assert_eq!(panel.cpu.get_input(), 0x81);
        assert_eq!(panel.lamps.bits(), 0x81);
        assert!(panel.lamps.is_lit(LAMP_INPUT_MASK));
        assert!(!panel.lamps.is_lit(LAMP_MEMORY_MASK));

        panel.press(Button::Clear);
        assert_eq!(panel.lamps.bits(), 0);
    }

    #[test]
    fn test_key_in_and_read_back() {
        let mut panel = FrontPanel::new();
        panel.key_in(0o004, &[0o023, 0o252]);

        assert_eq!(panel.cpu.bus.read(0o004), 0o023);
        assert_eq!(panel.cpu.bus.read(0o005), 0o252);

        panel.key_byte(0o005);
        panel.press(Button::Set);
        panel.press(Button::Read);
        assert_eq!(panel.lamps.bits(), 0o252);
        assert!(panel.lamps.is_lit(LAMP_MEMORY_MASK));

        panel.press(Button::Display);
        assert_eq!(panel.lamps.bits(), 0o005);
        assert!(panel.lamps.is_lit(LAMP_ADDRESS_MASK));
    }

    #[test]
    fn test_run_lamp_follows_halt() {
        let mut panel = FrontPanel::new();
        assert!(panel.lamps.is_lit(LAMP_RUN_MASK));

        panel.press(Button::Stop);
        assert!(!panel.lamps.is_lit(LAMP_RUN_MASK));
        assert!(panel.cpu.get_halt());

        panel.press(Button::Start);
        assert!(panel.lamps.is_lit(LAMP_RUN_MASK));
    }

    #[test]
    fn test_program_drives_lamps() {
        let mut panel = FrontPanel::new();
        // load A #125; store OUT A; halt
        panel.key_in(0o004, &[0o023, 0o125, 0o034, 0o200, 0o000]);
        // point P at the program
        panel.key_in(0o003, &[0o004]);

        let executed = panel.run_burst(1_000_000);

        assert_eq!(executed, 3);
        assert_eq!(panel.lamps.bits(), 0o125);
        assert!(!panel.lamps.is_lit(LAMP_RUN_MASK));
    }

    #[test]
    fn test_load_sets_p() {
        let mut panel = FrontPanel::new();
        panel.load(&ProgramImage::from_bytes(0o020, &[0o023, 0o001]).unwrap(), 0o004);
        assert_eq!(panel.cpu.regs.pc(), 0o020);
        assert_eq!(panel.cpu.bus.read(0o021), 0o001);

        let mut panel = FrontPanel::new();
        panel.load(&ProgramImage::new(), 0o004);
        assert_eq!(panel.cpu.regs.pc(), 0o004);

        // The image carries its own P
        let mut panel = FrontPanel::new();
        let mut image = ProgramImage::from_bytes(0o040, &[0o000]).unwrap();
        image.push(0o003, 0o040);
        image.push(0o001, 0o007);
        panel.load(&image, 0o004);
        assert_eq!(panel.cpu.regs.pc(), 0o040);
        assert_eq!(panel.cpu.regs.get(Register::B), 0o007);
    }

    #[test]
    fn test_load_starts_past_preset_registers() {
        let mut panel = FrontPanel::new();
        let image = crate::asm::parse_image("000: 005\n004: 023 001 000", 0o004).unwrap();
        panel.load(&image, 0o020);

        assert_eq!(panel.cpu.regs.get(Register::A), 0o005);
        assert_eq!(panel.cpu.regs.pc(), 0o004);

        let instr = panel.step().unwrap();
        assert_eq!(instr.function, crate::cpu::Function::Load);
        assert_eq!(panel.cpu.regs.pc(), 0o006);
        assert_eq!(panel.cpu.regs.get(Register::A), 0o001);

        // Registers only: fall back
        let mut panel = FrontPanel::new();
        panel.load(&crate::asm::parse_image("001: 007", 0).unwrap(), 0o020);
        assert_eq!(panel.cpu.regs.pc(), 0o020);
    }

    #[test]
    fn test_reset_relights_run() {
        let mut panel = FrontPanel::new();
        panel.press(Button::Stop);
        panel.press(Button::Bit(3));

        panel.reset();

        assert!(panel.lamps.is_lit(LAMP_RUN_MASK));
        assert!(!panel.lamps.is_lit(LAMP_INPUT_MASK));
        assert_eq!(panel.lamps.bits(), 0);
    }
}
