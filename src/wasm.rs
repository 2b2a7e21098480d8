//! WebAssembly bindings for the Kenbak-1 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the front panel.

use wasm_bindgen::prelude::*;
use crate::asm::disasm::{disassemble, format_instruction};
use crate::cpu::memory::MEMORY_SIZE;
use crate::{decode, parse_image, Button, FrontPanel, ProgramImage, Register};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Panel buttons in index order: data bits 0-7, then the control buttons.
const BUTTONS: [Button; 15] = [
    Button::Bit(0),
    Button::Bit(1),
    Button::Bit(2),
    Button::Bit(3),
    Button::Bit(4),
    Button::Bit(5),
    Button::Bit(6),
    Button::Bit(7),
    Button::Clear,
    Button::Display,
    Button::Set,
    Button::Read,
    Button::Store,
    Button::Start,
    Button::Stop,
];

/// WebAssembly-friendly Kenbak-1 wrapper.
#[wasm_bindgen]
pub struct WasmKenbak {
    panel: FrontPanel,
    program: ProgramImage,
}

#[wasm_bindgen]
impl WasmKenbak {
    /// Create a new machine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            panel: FrontPanel::new(),
            program: ProgramImage::new(),
        }
    }

    /// Load a program from octal image text. Returns the byte count.
    #[wasm_bindgen]
    pub fn load_octal(&mut self, source: &str) -> Result<usize, JsError> {
        let image = parse_image(source, 0o004)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        let len = image.len();
        self.program = image;
        self.reset();

        Ok(len)
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if !self.panel.cpu.is_running() {
            return Err(JsError::new("CPU is halted"));
        }

        let pc = self.panel.cpu.regs.pc();
        let cpu = &mut self.panel.cpu;
        let (text, _) = disassemble(pc, |addr| cpu.read_byte(addr));
        self.panel.step();

        Ok(text)
    }

    /// Run one burst of `budget` cycles. Returns instructions executed.
    #[wasm_bindgen]
    pub fn run(&mut self, budget: u32) -> u64 {
        self.panel.run_burst(i64::from(budget))
    }

    /// Reload the program and reset.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        let mut panel = FrontPanel::new();
        panel.load(&self.program, 0o004);
        self.panel = panel;
    }

    /// Press a button: 0-7 data bits, 8 Clear, 9 Display, 10 Set,
    /// 11 Read, 12 Store, 13 Start, 14 Stop.
    #[wasm_bindgen]
    pub fn press(&mut self, index: usize) -> Result<(), JsError> {
        let button = BUTTONS
            .get(index)
            .ok_or_else(|| JsError::new(&format!("no button {}", index)))?;
        self.panel.press(*button);
        Ok(())
    }

    /// The lamp word: bits 0-7 data, then INPUT, ADDRESS, MEMORY, RUN.
    #[wasm_bindgen]
    pub fn lamps(&self) -> u16 {
        self.panel.lamps.0
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.panel.cpu.is_running()
    }

    /// Get executed instruction count.
    #[wasm_bindgen]
    pub fn executed(&self) -> u64 {
        self.panel.cpu.executed
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u8 {
        self.panel.cpu.regs.pc()
    }

    /// Read a register by name (A, B, X, P, OUT, OCA, OCB, OCX, IN).
    #[wasm_bindgen]
    pub fn register(&self, name: &str) -> Option<u8> {
        Register::ALL
            .iter()
            .find(|reg| reg.name().eq_ignore_ascii_case(name))
            .map(|&reg| self.panel.cpu.regs.get(reg))
    }

    /// Read any address through the register overlay.
    #[wasm_bindgen]
    pub fn memory_at(&mut self, addr: u8) -> u8 {
        self.panel.cpu.read_byte(addr)
    }

    /// All 256 bytes through the register overlay.
    #[wasm_bindgen]
    pub fn memory_all(&mut self) -> js_sys::Uint8Array {
        let bytes: Vec<u8> = (0..MEMORY_SIZE)
            .map(|addr| self.panel.cpu.read_byte(addr as u8))
            .collect();
        js_sys::Uint8Array::from(&bytes[..])
    }

    /// Get registers as JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> String {
        let regs = &self.panel.cpu.regs;
        let mut fields = serde_json::Map::new();
        for reg in Register::ALL {
            fields.insert(reg.name().to_string(), regs.get(reg).into());
        }
        fields.insert("executed".to_string(), self.panel.cpu.executed.into());
        serde_json::Value::Object(fields).to_string()
    }
}

impl Default for WasmKenbak {
    fn default() -> Self {
        Self::new()
    }
}

/// Disassemble one opcode with its operand byte.
#[wasm_bindgen]
pub fn wasm_disassemble(opcode: u8, operand: u8) -> String {
    format_instruction(&decode(opcode), operand)
}
