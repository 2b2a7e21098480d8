//! Kenbak-1 Emulator - CLI Entry Point
//!
//! Commands:
//! - `kenbak-emu run <program>` - Run a `.kbk` or raw binary image
//! - `kenbak-emu panel <program>` - Interactive front panel
//! - `kenbak-emu disasm <program>` - Disassemble an image
//! - `kenbak-emu test` - Built-in self-test

use clap::{Parser, Subcommand};
use kenbak::{Cpu, FrontPanel, MachineConfig, ProgramImage};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kenbak-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the Kenbak-1 (1971) personal computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .kbk or raw binary image
        program: PathBuf,
        /// Maximum number of instructions to execute
        #[arg(short, long, default_value = "10000")]
        max_instructions: u64,
        /// Print every instruction as it executes
        #[arg(short, long)]
        trace: bool,
        /// Machine configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Octal value placed in IN before starting
        #[arg(short, long, value_parser = parse_octal_byte)]
        input: Option<u8>,
    },
    /// Interactive front panel
    #[cfg(feature = "tui")]
    Panel {
        /// Path to the .kbk or raw binary image
        program: PathBuf,
        /// Machine configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Disassemble an image to readable text
    Disasm {
        /// Path to the .kbk or raw binary image
        program: PathBuf,
    },
    /// Run the built-in self-test
    Test,
}

fn parse_octal_byte(text: &str) -> Result<u8, String> {
    u8::from_str_radix(text, 8).map_err(|_| format!("'{}' is not an octal byte (000-377)", text))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_instructions, trace, config, input }) => {
            let config = load_config(config.as_deref());
            run_program(&program, &config, max_instructions, trace, input);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Panel { program, config }) => {
            let config = load_config(config.as_deref());
            panel_program(&program, config);
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Kenbak-1 Emulator v0.1.0");
            println!("256 bytes, eight lamps, fifteen buttons");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> MachineConfig {
    match MachineConfig::load_or_default(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_program(path: &std::path::Path, origin: u8) -> ProgramImage {
    match kenbak::load_image(path, origin) {
        Ok(image) => {
            info!("loaded {} bytes from {}", image.len(), path.display());
            if image.is_empty() {
                warn!("{} contains no bytes", path.display());
            }
            image
        }
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn run_program(
    path: &std::path::Path,
    config: &MachineConfig,
    max_instructions: u64,
    trace: bool,
    input: Option<u8>,
) {
    use kenbak::asm::disassemble;
    use kenbak::cpu::{Notification, Recorder};
    use kenbak::Register;

    println!("🔧 Running: {}", path.display());

    let image = load_program(path, config.load_address);
    let mut panel = FrontPanel::new();
    panel.load(&image, config.load_address);
    let mut cpu = panel.cpu;
    cpu.set_cycles_per_instruction(config.cycles_per_instruction);
    if let Some(value) = input {
        cpu.regs.set(Register::In, value);
    }

    println!();
    println!("━━━ Execution ━━━");

    let mut lamps = Recorder::new();
    let mut executed = 0u64;
    if trace {
        while cpu.is_running() && executed < max_instructions {
            let pc = cpu.regs.pc();
            let (text, _) = disassemble(pc, |addr| cpu.read_byte(addr));

            cpu.step(&mut lamps);
            executed += 1;

            println!(
                "{:03o}: {:<16} A={:03o} B={:03o} X={:03o} OUT={:03o}",
                pc,
                text,
                cpu.regs.get(Register::A),
                cpu.regs.get(Register::B),
                cpu.regs.get(Register::X),
                cpu.regs.get(Register::Out),
            );
        }
    } else {
        executed = cpu.run_bursts(config.burst_cycles, max_instructions, &mut lamps);
    }

    // Lamp history, with repeats collapsed
    let mut shown: Vec<u8> = Vec::new();
    for event in &lamps.events {
        if let Notification::Out(value) = *event {
            if shown.last() != Some(&value) {
                shown.push(value);
            }
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Executed: {}", executed);
    println!("State: {:?}", cpu.state);
    println!("P: {:03o}", cpu.regs.pc());
    println!("{:?}", cpu.regs);
    if !shown.is_empty() {
        let lamps: Vec<String> = shown.iter().map(|v| format!("{:08b}", v)).collect();
        println!("Lamps: {}", lamps.join(" → "));
    }

    if cpu.is_running() {
        println!();
        println!(
            "⚠️  Reached max instructions limit ({}). Use --max-instructions to increase.",
            max_instructions
        );
    }
}

#[cfg(feature = "tui")]
fn panel_program(path: &std::path::Path, config: MachineConfig) {
    let image = load_program(path, config.load_address);

    println!("🚀 Launching front panel...");

    if let Err(e) = kenbak::run_panel(image, config) {
        eprintln!("❌ Front panel error: {}", e);
        std::process::exit(1);
    }
}

fn disassemble_file(path: &std::path::Path) {
    use kenbak::cpu::memory::MEMORY_SIZE;

    println!("📖 Disassembling: {}", path.display());
    println!();

    let image = load_program(path, 0o004);
    let mut memory = [0u8; MEMORY_SIZE];
    image.apply(&mut memory);

    println!("{}", kenbak::disassemble_memory(&memory));
}

fn run_self_test() {
    use kenbak::cpu::Recorder;
    use kenbak::{decode, Button, Register};

    println!("━━━ Kenbak-1 Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let mut check = |name: &str, ok: bool, detail: String| {
        print!("{}... ", name);
        if ok {
            println!("✓");
            passed += 1;
        } else {
            println!("✗ {}", detail);
            failed += 1;
        }
    };

    // Every opcode decodes to something with a consistent length
    let ok = (0..=255u8).all(|op| {
        let instr = decode(op);
        instr.len() == if instr.mode.is_some() { 2 } else { 1 }
    });
    check("Decoder covers all opcodes", ok, String::new());

    // load A #005; add A #003; store OUT A; halt
    let mut cpu = Cpu::new();
    let program = [0o023, 0o005, 0o003, 0o003, 0o034, 0o200, 0o000];
    let loaded = cpu.load_program(0o004, &program).is_ok();
    cpu.regs.jump(0o004);
    let mut lamps = Recorder::new();
    cpu.run(1_000_000, &mut lamps);
    let out = cpu.regs.get(Register::Out);
    check(
        "CPU load/add/store",
        loaded && out == 0o010 && cpu.is_halted(),
        format!("(got OUT={:03o}, expected 010)", out),
    );
    check(
        "OUT pushed to lamps",
        lamps.last_out() == Some(0o010),
        format!("(got {:?})", lamps.last_out()),
    );

    // Indexed store through X
    let mut cpu = Cpu::new();
    let program = [0o223, 0o002, 0o023, 0o111, 0o036, 0o040, 0o000];
    cpu.load_program(0o004, &program).ok();
    cpu.regs.jump(0o004);
    cpu.run(1_000_000, &mut ());
    let stored = cpu.bus.read(0o042);
    check("Indexed addressing", stored == 0o111, format!("(got {:03o}, expected 111)", stored));

    // Jump and mark: JMD stores the return address at the target
    let mut cpu = Cpu::new();
    cpu.load_program(0o004, &[0o364, 0o020]).ok();
    cpu.load_program(0o020, &[0o000, 0o000]).ok();
    cpu.regs.jump(0o004);
    cpu.run(1_000_000, &mut ());
    let mark = cpu.bus.read(0o020);
    check("Jump and mark", mark == 0o006, format!("(got {:03o}, expected 006)", mark));

    // Front panel key-in and read back
    let mut panel = FrontPanel::new();
    panel.key_in(0o100, &[0o252]);
    panel.press(Button::Read);
    check(
        "Front panel store/read",
        panel.cpu.bus.read(0o100) == 0o252,
        format!("(got {:03o}, expected 252)", panel.cpu.bus.read(0o100)),
    );

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
