//! Octal program image format for Kenbak-1 programs.
//!
//! A `.kbk` image is plain text:
//! - Bytes are written as octal numbers, any number per line
//! - `NNN:` at the start of a line moves the load address
//! - Everything after `;` is a comment
//! - Blank lines are ignored
//!
//! ```text
//! ; Count on the lamps
//! 004: 023 001   ; load A #001
//! 006: 034 200   ; store OUT A
//! ```
//!
//! Any other file is treated as a raw binary image.

use crate::cpu::memory::{Memory, MEMORY_SIZE};
use std::io::Write;
use std::num::IntErrorKind;
use std::path::Path;
use thiserror::Error;

/// File extension of octal text images.
pub const IMAGE_EXTENSION: &str = "kbk";

/// A program image: a run of bytes and where each one goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    /// `(address, byte)` pairs in file order.
    pub cells: Vec<(u8, u8)>,
}

impl ProgramImage {
    /// Create a new empty image.
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// A contiguous image starting at `origin`.
    pub fn from_bytes(origin: u8, bytes: &[u8]) -> Result<Self, ImageError> {
        if origin as usize + bytes.len() > MEMORY_SIZE {
            return Err(ImageError::TooLarge { origin, size: bytes.len() });
        }
        let cells = bytes
            .iter()
            .enumerate()
            .map(|(i, &b)| (origin + i as u8, b))
            .collect();
        Ok(Self { cells })
    }

    /// Add a byte.
    pub fn push(&mut self, addr: u8, value: u8) {
        self.cells.push((addr, value));
    }

    /// Get the number of bytes.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Lowest RAM address written by the image. Register cells are skipped.
    pub fn origin(&self) -> Option<u8> {
        self.cells
            .iter()
            .map(|&(addr, _)| addr)
            .filter(|&addr| Memory::is_ram(addr))
            .min()
    }

    /// Write the image into a 256-byte memory array.
    pub fn apply(&self, memory: &mut [u8]) {
        for &(addr, value) in &self.cells {
            if let Some(cell) = memory.get_mut(addr as usize) {
                *cell = value;
            }
        }
    }
}

impl Default for ProgramImage {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse octal image text. Bytes without an address prefix start at `origin`.
pub fn parse_image(text: &str, origin: u8) -> Result<ProgramImage, ImageError> {
    let mut image = ProgramImage::new();
    let mut addr = origin as usize;

    for (line_num, line) in text.lines().enumerate() {
        let line_num = line_num + 1;
        let code = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut rest = code.trim();
        if rest.is_empty() {
            continue;
        }

        if let Some((prefix, tail)) = rest.split_once(':') {
            addr = parse_octal(prefix.trim(), line_num)? as usize;
            rest = tail;
        }

        for token in rest.split_whitespace() {
            if addr >= MEMORY_SIZE {
                return Err(ImageError::ParseError {
                    line: line_num,
                    message: "image runs past address 377".into(),
                });
            }
            let value = parse_octal(token, line_num)?;
            image.push(addr as u8, value);
            addr += 1;
        }
    }

    Ok(image)
}

fn parse_octal(token: &str, line: usize) -> Result<u8, ImageError> {
    let out_of_range = || ImageError::OutOfRange { line, token: token.to_string() };

    match u8::from_str_radix(token, 8) {
        Ok(value) => Ok(value),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Err(out_of_range()),
        Err(_) => Err(ImageError::ParseError {
            line,
            message: format!("'{}' is not an octal number", token),
        }),
    }
}

/// Load a program image from disk.
///
/// `.kbk` files are parsed as octal text; anything else is read as raw
/// bytes placed at `origin`.
pub fn load_image<P: AsRef<Path>>(path: P, origin: u8) -> Result<ProgramImage, ImageError> {
    let path = path.as_ref();
    let is_text = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION));

    if is_text {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ImageError::IoError(e.to_string()))?;
        parse_image(&text, origin)
    } else {
        let bytes = std::fs::read(path)
            .map_err(|e| ImageError::IoError(e.to_string()))?;
        ProgramImage::from_bytes(origin, &bytes)
    }
}

/// Render an image as octal text, one contiguous run per line group.
pub fn format_image(image: &ProgramImage) -> String {
    let mut output = String::new();
    output.push_str("; Kenbak-1 program image\n");
    output.push_str(&format!("; {} bytes\n", image.len()));

    let mut next: Option<u8> = None;
    let mut on_line = 0;
    for &(addr, value) in &image.cells {
        if next != Some(addr) || on_line == 8 {
            output.push_str(&format!("\n{:03o}:", addr));
            on_line = 0;
        }
        output.push_str(&format!(" {:03o}", value));
        on_line += 1;
        next = addr.checked_add(1);
    }
    output.push('\n');

    output
}

/// Save a program image to disk as octal text.
pub fn save_image<P: AsRef<Path>>(path: P, image: &ProgramImage) -> Result<(), ImageError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;

    file.write_all(format_image(image).as_bytes())
        .map_err(|e| ImageError::IoError(e.to_string()))
}

/// Errors that can occur while loading or saving images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("value {token} on line {line} does not fit in a byte")]
    OutOfRange { line: usize, token: String },

    #[error("{size} bytes starting at {origin:03o} do not fit in memory")]
    TooLarge { origin: u8, size: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image() {
        let text = "\
; counter
004: 023 001   ; load A #001
     034 200
100: 000
";
        let image = parse_image(text, 0o004).unwrap();

        assert_eq!(
            image.cells,
            vec![(0o004, 0o023), (0o005, 0o001), (0o006, 0o034), (0o007, 0o200), (0o100, 0o000)]
        );
        assert_eq!(image.origin(), Some(0o004));
    }

    #[test]
    fn test_origin_skips_registers() {
        let image = parse_image("000: 005\n003: 010\n200: 1\n010: 023", 0).unwrap();
        assert_eq!(image.origin(), Some(0o010));
        assert_eq!(parse_image("001: 007", 0).unwrap().origin(), None);
    }

    #[test]
    fn test_parse_uses_default_origin() {
        let image = parse_image("200 000", 0o020).unwrap();
        assert_eq!(image.cells, vec![(0o020, 0o200), (0o021, 0)]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_image("004: 023\n008", 0).unwrap_err(),
            ImageError::ParseError { line: 2, message: "'008' is not an octal number".into() }
        );
        assert_eq!(
            parse_image("400", 0).unwrap_err(),
            ImageError::OutOfRange { line: 1, token: "400".into() }
        );
        assert_eq!(
            parse_image("004: 023\n77777777777777777777777", 0).unwrap_err(),
            ImageError::OutOfRange { line: 2, token: "77777777777777777777777".into() }
        );
        assert!(matches!(
            parse_image("377: 000 000", 0).unwrap_err(),
            ImageError::ParseError { line: 1, .. }
        ));
    }

    #[test]
    fn test_from_bytes() {
        let image = ProgramImage::from_bytes(0o374, &[1, 2, 3, 4]).unwrap();
        assert_eq!(image.cells.last(), Some(&(0o377, 4)));
        assert!(ProgramImage::from_bytes(0o374, &[0; 5]).is_err());
    }

    #[test]
    fn test_apply() {
        let mut memory = [0u8; MEMORY_SIZE];
        parse_image("010: 1 2\n200: 3", 0).unwrap().apply(&mut memory);

        assert_eq!(memory[0o010], 1);
        assert_eq!(memory[0o011], 2);
        assert_eq!(memory[0o200], 3);
    }

    #[test]
    fn test_format_reparses() {
        let image = parse_image("004: 023 001 034 200\n100: 377", 0).unwrap();
        let text = format_image(&image);

        assert!(text.contains("004: 023 001 034 200"));
        assert!(text.contains("100: 377"));
        assert_eq!(parse_image(&text, 0).unwrap(), image);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("kenbak-image-{}.kbk", std::process::id()));
        let image = ProgramImage::from_bytes(0o004, &[0o023, 0o001, 0o000]).unwrap();

        save_image(&path, &image).unwrap();
        let loaded = load_image(&path, 0).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, image);
    }
}
