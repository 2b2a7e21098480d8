//! UI rendering for the front panel.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::Register;
use crate::panel::{LAMP_ADDRESS_MASK, LAMP_INPUT_MASK, LAMP_MEMORY_MASK, LAMP_RUN_MASK};
use super::app::PanelApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &mut PanelApp) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
        ])
        .split(frame.area());

    draw_lamps(frame, rows[0], app);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(rows[1]);

    // Left side: code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

fn lamp(lit: bool, color: Color) -> Span<'static> {
    if lit {
        Span::styled(" ● ", Style::default().fg(color).add_modifier(Modifier::BOLD))
    } else {
        Span::styled(" ○ ", Style::default().fg(Color::DarkGray))
    }
}

/// Draw the twelve panel lamps, data bit 7 on the left.
fn draw_lamps(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let lamps = app.panel.lamps;

    let mut lights: Vec<Span> = (0..8)
        .rev()
        .map(|bit| lamp(lamps.bits() & (1 << bit) != 0, Color::Red))
        .collect();
    lights.push(Span::raw("   "));
    for mask in [LAMP_INPUT_MASK, LAMP_ADDRESS_MASK, LAMP_MEMORY_MASK, LAMP_RUN_MASK] {
        lights.push(lamp(lamps.is_lit(mask), Color::Yellow));
    }

    let labels = Line::from(
        " 7  6  5  4  3  2  1  0     IN ADR MEM RUN",
    )
    .style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(vec![Line::from(lights), labels])
        .block(Block::default()
            .title(" Kenbak-1 ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)));

    frame.render_widget(paragraph, area);
}

/// Draw disassembly around P.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &mut PanelApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, text, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let line = format!("{} {}{:03o}: {}", bp, prefix, addr, text);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

fn register_span(app: &PanelApp, reg: Register) -> Vec<Span<'static>> {
    vec![
        Span::raw(format!("{:>3}: ", reg.name())),
        Span::styled(
            format!("{:03o}", app.panel.cpu.regs.get(reg)),
            Style::default().fg(Color::White),
        ),
        Span::raw("   "),
    ]
}

/// Draw register state in octal.
fn draw_registers(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let cpu = &app.panel.cpu;
    let row = |regs: &[Register]| {
        Line::from(regs.iter().flat_map(|&reg| register_span(app, reg)).collect::<Vec<_>>())
    };

    let content = vec![
        row(&[Register::A, Register::B, Register::X, Register::P]),
        row(&[Register::Out, Register::Oca, Register::Ocb, Register::Ocx]),
        row(&[Register::In]),
        Line::from(vec![
            Span::raw("Executed: "),
            Span::styled(format!("{}", cpu.executed), Style::default().fg(Color::Cyan)),
            Span::raw("   Latch: "),
            Span::styled(format!("{:03o}", cpu.address_latch()), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", cpu.state),
                if cpu.is_running() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view, eight bytes per row.
fn draw_memory(frame: &mut Frame, area: Rect, app: &mut PanelApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let pc = app.panel.cpu.regs.pc() as usize;
    let start = app.mem_scroll - app.mem_scroll % 8;

    let items: Vec<ListItem> = (0..visible_rows)
        .map(|row| start + row * 8)
        .take_while(|&base| base < 256)
        .map(|base| {
            let bytes: Vec<String> = (base..base + 8)
                .map(|addr| format!("{:03o}", app.panel.cpu.read_byte(addr as u8)))
                .collect();
            let text = format!("{:03o}: {}", base, bytes.join(" "));

            let style = if (base..base + 8).contains(&pc) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if bytes.iter().any(|b| b != "000") {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("0-7: Bits  Bksp: Clear  s: Set  d: Display"),
        Line::from("r: Read  Enter: Store  g: Start  h: Stop"),
        Line::from("n: Step  b: Breakpoint  x: Reset  ↑↓  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
