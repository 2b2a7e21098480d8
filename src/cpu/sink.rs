//! Front panel notifications pushed by the CPU.

/// Receives the CPU's lamp-facing state.
///
/// After every executed instruction the CPU pushes the OUT register and the
/// halt flag, in that order. Halt changes made through
/// [`Cpu::set_halt`](crate::cpu::Cpu::set_halt) are pushed immediately.
pub trait PanelSink {
    fn write_out(&mut self, value: u8);
    fn write_halt(&mut self, halted: bool);
}

/// Discards all notifications.
impl PanelSink for () {
    fn write_out(&mut self, _value: u8) {}
    fn write_halt(&mut self, _halted: bool) {}
}

/// A single notification, as recorded by [`Recorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Out(u8),
    Halt(bool),
}

/// Keeps every notification in order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub events: Vec<Notification>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent OUT value pushed, if any.
    pub fn last_out(&self) -> Option<u8> {
        self.events.iter().rev().find_map(|event| match event {
            Notification::Out(value) => Some(*value),
            Notification::Halt(_) => None,
        })
    }
}

impl PanelSink for Recorder {
    fn write_out(&mut self, value: u8) {
        self.events.push(Notification::Out(value));
    }

    fn write_halt(&mut self, halted: bool) {
        self.events.push(Notification::Halt(halted));
    }
}
