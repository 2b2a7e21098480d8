//! Front panel application state and logic.

use crate::asm::disasm::disassemble;
use crate::config::MachineConfig;
use crate::cpu::memory::MEMORY_SIZE;
use crate::panel::{Button, FrontPanel};
use crate::ProgramImage;
use std::collections::HashSet;

/// Front panel application state.
pub struct PanelApp {
    /// The machine being driven.
    pub panel: FrontPanel,
    /// Original program for reset.
    pub program: ProgramImage,
    pub config: MachineConfig,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u8>,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Set by Start so a breakpoint under P does not stop the machine at once.
    resuming: bool,
}

impl PanelApp {
    /// Create a new front panel with a loaded program.
    pub fn new(program: ProgramImage, config: MachineConfig) -> Self {
        let mut app = Self {
            panel: FrontPanel::new(),
            program,
            config,
            breakpoints: HashSet::new(),
            should_quit: false,
            status: String::new(),
            mem_scroll: 0,
            resuming: false,
        };
        app.reset();
        app.status = "Stopped. 0-7 bits, s/d/r/Enter set/display/read/store, g start, q quit.".into();
        app
    }

    /// Press a front panel button.
    pub fn press(&mut self, button: Button) {
        self.panel.press(button);
        self.resuming = button == Button::Start;
        self.status = format!(
            "{:?}  IN={:03o} latch={:03o}",
            button,
            self.panel.cpu.get_input(),
            self.panel.cpu.address_latch()
        );
    }

    /// Step one instruction, even while stopped.
    pub fn step(&mut self) {
        let pc = self.panel.cpu.regs.pc();
        let was_halted = self.panel.cpu.is_halted();
        if was_halted {
            self.panel.cpu.set_halt(false, &mut self.panel.lamps);
        }

        if self.panel.step().is_some() {
            let (text, _) = self.disassemble_at(pc);
            self.status = format!("P={:03o}: {}", pc, text);
        }

        if was_halted && self.panel.cpu.is_running() {
            self.panel.cpu.set_halt(true, &mut self.panel.lamps);
        }
    }

    /// Run one burst if the machine is running. Called every UI tick.
    pub fn tick(&mut self) {
        if !self.panel.cpu.is_running() {
            return;
        }

        if self.breakpoints.is_empty() {
            self.panel.run_burst(self.config.burst_cycles);
        } else {
            let per_instruction = i64::from(self.panel.cpu.cycles_per_instruction().max(1));
            let mut budget = self.config.burst_cycles;
            let mut resuming = std::mem::take(&mut self.resuming);
            while budget > 0 && self.panel.cpu.is_running() {
                let pc = self.panel.cpu.regs.pc();
                if self.breakpoints.contains(&pc) && !resuming {
                    self.panel.press(Button::Stop);
                    self.status = format!("Breakpoint at P={:03o}", pc);
                    return;
                }
                resuming = false;
                self.panel.step();
                budget -= per_instruction;
            }
        }

        self.resuming = false;
        if self.panel.cpu.is_halted() {
            let last = self.panel.cpu.last_instruction().map_or("-", |i| i.function.mnemonic());
            self.status = format!(
                "Halted after {} instructions (last: {})",
                self.panel.cpu.executed, last
            );
        }
    }

    /// Toggle breakpoint at current P.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.panel.cpu.regs.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at P={:03o}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at P={:03o}", pc);
        }
    }

    /// Reload the program, reset and stop.
    pub fn reset(&mut self) {
        let mut panel = FrontPanel::new();
        panel.cpu.set_cycles_per_instruction(self.config.cycles_per_instruction);
        panel.load(&self.program, self.config.load_address);
        panel.press(Button::Stop);

        self.panel = panel;
        self.status = "Reset. Stopped.".into();
    }

    fn disassemble_at(&mut self, addr: u8) -> (String, usize) {
        let cpu = &mut self.panel.cpu;
        disassemble(addr, |a| cpu.read_byte(a))
    }

    /// Get disassembly from a little before P.
    pub fn get_disassembly(&mut self, lines: usize) -> Vec<(u8, String, bool)> {
        let pc = self.panel.cpu.regs.pc();
        let mut addr = pc.saturating_sub((lines / 4) as u8);
        let mut out = Vec::with_capacity(lines);

        for _ in 0..lines {
            let (text, len) = self.disassemble_at(addr);
            out.push((addr, text, addr == pc));
            match addr.checked_add(len as u8) {
                Some(next) => addr = next,
                None => break,
            }
        }
        out
    }
}

/// Run the interactive front panel with a program.
pub fn run_panel(program: ProgramImage, config: MachineConfig) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = PanelApp::new(program, config);

    // Main loop
    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &mut app);
        })?;

        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char(c @ '0'..='7') => app.press(Button::Bit(c as u8 - b'0')),
                        KeyCode::Backspace => app.press(Button::Clear),
                        KeyCode::Char('d') => app.press(Button::Display),
                        KeyCode::Char('s') => app.press(Button::Set),
                        KeyCode::Char('r') => app.press(Button::Read),
                        KeyCode::Enter => app.press(Button::Store),
                        KeyCode::Char('g') => app.press(Button::Start),
                        KeyCode::Char('h') => app.press(Button::Stop),
                        KeyCode::Char('n') => app.step(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(8);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll + 8 < MEMORY_SIZE {
                                app.mem_scroll += 8;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::parse_image;

    fn app(text: &str) -> PanelApp {
        PanelApp::new(parse_image(text, 0o004).unwrap(), MachineConfig::default())
    }

    #[test]
    fn test_starts_stopped_at_origin() {
        let app = app("010: 200 000");
        assert!(app.panel.cpu.is_halted());
        assert_eq!(app.panel.cpu.regs.pc(), 0o010);
    }

    #[test]
    fn test_single_step_stays_stopped() {
        let mut app = app("200 200 000");
        app.step();
        assert_eq!(app.panel.cpu.regs.pc(), 0o005);
        assert!(app.panel.cpu.is_halted());
        assert!(app.status.contains("noop"));
    }

    #[test]
    fn test_start_runs_to_halt() {
        let mut app = app("023 007 034 200 000");
        app.press(Button::Start);
        app.tick();
        assert!(app.panel.cpu.is_halted());
        assert_eq!(app.panel.lamps.bits(), 0o007);
    }

    #[test]
    fn test_breakpoint_stops() {
        let mut app = app("200 200 200 000");
        app.panel.cpu.regs.jump(0o004);
        app.breakpoints.insert(0o006);
        app.press(Button::Start);
        app.tick();
        assert!(app.panel.cpu.is_halted());
        assert_eq!(app.panel.cpu.regs.pc(), 0o006);
    }

    #[test]
    fn test_start_leaves_breakpoint_under_p() {
        let mut app = app("200 200 200 000");
        app.breakpoints.insert(0o004);
        app.breakpoints.insert(0o006);

        app.press(Button::Start);
        app.tick();
        assert_eq!(app.panel.cpu.regs.pc(), 0o006);
        assert!(app.panel.cpu.is_halted());

        // Resuming from 006 runs on to the HALT
        app.press(Button::Start);
        app.tick();
        assert_eq!(app.panel.cpu.regs.pc(), 0o010);
        assert_eq!(app.panel.cpu.executed, 4);
    }

    #[test]
    fn test_halt_status_names_last_instruction() {
        let mut app = app("200 000");
        app.press(Button::Start);
        app.tick();
        assert_eq!(app.status, "Halted after 2 instructions (last: halt)");
    }

    #[test]
    fn test_disassembly_marks_pc() {
        let mut app = app("023 007 000");
        let lines = app.get_disassembly(4);
        assert!(lines.iter().any(|(addr, text, current)| *addr == 0o004 && *current && text == "load A #007"));
    }
}
