//! Machine configuration.
//!
//! Stored as JSON. Every field is optional in the file; missing fields take
//! their defaults.

use crate::cpu::execute::DEFAULT_CYCLES_PER_INSTRUCTION;
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Kenbak-1 machine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Nominal CPU clock, in Hz.
    pub clock_hz: u32,
    /// Budget charged per executed instruction.
    pub cycles_per_instruction: u32,
    /// Budget handed to each execution burst.
    pub burst_cycles: i64,
    /// Where program images without an explicit address are loaded.
    pub load_address: u8,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            clock_hz: 1_000_000,
            cycles_per_instruction: DEFAULT_CYCLES_PER_INSTRUCTION,
            burst_cycles: 20_000,
            load_address: 0o004,
        }
    }
}

impl MachineConfig {
    /// Read a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Instructions per second at the configured clock.
    pub fn instructions_per_second(&self) -> u32 {
        self.clock_hz / self.cycles_per_instruction.max(1)
    }
}

/// Errors that can occur while reading or writing a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MachineConfig::default();
        assert_eq!(config.cycles_per_instruction, 2000);
        assert_eq!(config.load_address, 4);
        assert_eq!(config.instructions_per_second(), 500);
    }

    #[test]
    fn test_partial_json() {
        let config = MachineConfig::from_json(r#"{ "burst_cycles": 4000 }"#).unwrap();
        assert_eq!(config.burst_cycles, 4000);
        assert_eq!(config.clock_hz, 1_000_000);
    }

    #[test]
    fn test_invalid_json() {
        let err = MachineConfig::from_json(r#"{ "load_address": 400 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_load() {
        let path = std::env::temp_dir().join(format!("kenbak-config-{}.json", std::process::id()));
        let config = MachineConfig { clock_hz: 500_000, ..MachineConfig::default() };

        config.save(&path).unwrap();
        let loaded = MachineConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
