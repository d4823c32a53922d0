// Shared fixtures: an in-memory Io implementation and helpers that encode
// Whitespace instructions as source text.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;

use wspace::io::Io;

// ============================================================================
// IN-MEMORY I/O
// ============================================================================

#[derive(Default)]
pub struct TestIo {
    pub chars_in: VecDeque<i64>,
    pub numbers_in: VecDeque<i64>,
    pub output: String,
}

impl TestIo {
    pub fn new() -> Self {
        TestIo::default()
    }

    pub fn with_chars(chars: &[i64]) -> Self {
        TestIo {
            chars_in: chars.iter().copied().collect(),
            ..TestIo::default()
        }
    }

    pub fn with_numbers(numbers: &[i64]) -> Self {
        TestIo {
            numbers_in: numbers.iter().copied().collect(),
            ..TestIo::default()
        }
    }
}

impl Io for TestIo {
    fn write_char(&mut self, value: i64) -> io::Result<()> {
        let ch = u32::try_from(value)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "invalid character code")
            })?;
        self.output.push(ch);
        Ok(())
    }

    fn write_number(&mut self, value: i64) -> io::Result<()> {
        self.output.push_str(&value.to_string());
        self.output.push('\n');
        Ok(())
    }

    fn read_char(&mut self) -> io::Result<i64> {
        self.chars_in
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no character input"))
    }

    fn read_number(&mut self) -> io::Result<i64> {
        self.numbers_in
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no number input"))
    }
}

// ============================================================================
// SOURCE ENCODING
// ============================================================================

// Zero-argument instructions, named by their space/tab/line-feed shape.
pub const DUP: &str = " \n ";
pub const SWAP: &str = " \n\t";
pub const DISCARD: &str = " \n\n";
pub const ADD: &str = "\t   ";
pub const SUB: &str = "\t  \t";
pub const MUL: &str = "\t  \n";
pub const DIV: &str = "\t \t ";
pub const MOD: &str = "\t \t\t";
pub const STORE: &str = "\t\t ";
pub const RETRIEVE: &str = "\t\t\t";
pub const RETURN: &str = "\n\t\n";
pub const EXIT: &str = "\n\n\n";
pub const OUT_CHAR: &str = "\t\n  ";
pub const OUT_NUMBER: &str = "\t\n \t";
pub const READ_CHAR: &str = "\t\n\t ";
pub const READ_NUMBER: &str = "\t\n\t\t";

/// Encode a numeric literal: sign, MSB-first binary digits (space = 0,
/// tab = 1), line-feed terminator.
pub fn num(n: i64) -> String {
    let sign = if n < 0 { '\t' } else { ' ' };
    let mut digits = String::new();
    if n != 0 {
        for c in format!("{:b}", n.unsigned_abs()).chars() {
            digits.push(if c == '1' { '\t' } else { ' ' });
        }
    }
    format!("{}{}\n", sign, digits)
}

pub fn push(n: i64) -> String {
    format!("  {}", num(n))
}

pub fn copy(n: i64) -> String {
    format!(" \t {}", num(n))
}

pub fn slide(n: i64) -> String {
    format!(" \t\n{}", num(n))
}

// Labels are passed as literal space/tab strings.
pub fn mark(label: &str) -> String {
    format!("\n  {}\n", label)
}

pub fn call(label: &str) -> String {
    format!("\n \t{}\n", label)
}

pub fn jump(label: &str) -> String {
    format!("\n \n{}\n", label)
}

pub fn jump_if_zero(label: &str) -> String {
    format!("\n\t {}\n", label)
}

pub fn jump_if_neg(label: &str) -> String {
    format!("\n\t\t{}\n", label)
}
