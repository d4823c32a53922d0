// stream.rs - streaming interpreter that decodes instructions straight
// from the source instead of compiling to bytecode first
//
// Trades speed for memory: the source is re-read on jumps, so programs
// larger than memory and programs with trailing garbage after the exit
// instruction both work. Label positions are remembered once seen, so a
// loop does not rescan the file on every iteration; a jump to a label not
// yet seen scans forward, recording every mark it passes, until the label
// turns up.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use thiserror::Error;

use crate::interpreter::{count_arg, RuntimeError, Stack};
use crate::io::Io;
use crate::lexer::Token;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("unknown instruction: {0}")]
    UnknownInstruction(String),
    #[error("undefined label: {0:?}")]
    UndefinedLabel(String),
    #[error("duplicate label: {0:?}")]
    DuplicateLabel(String),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected line feed, expected a sign (space or tab)")]
    MissingSign,
    #[error("number literal too large for this implementation (more than 63 bits)")]
    NumberTooLarge,
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// S/T/L rendering of an instruction prefix, for error messages.
fn opcode_name(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| match t {
            Token::Space => 'S',
            Token::Tab => 'T',
            Token::LineFeed => 'L',
        })
        .collect()
}

// ============================================================================
// STREAMING INTERPRETER
// ============================================================================

pub struct StreamInterpreter<R: Read + Seek, I: Io> {
    src: R,
    pub stack: Stack,
    // Call stack holds source offsets instead of instruction indices.
    call_stack: Vec<u64>,
    // Sparse heap: realistic streamed programs may use scattered
    // addresses, and there is no translation pass to bound them.
    heap: HashMap<i64, i64>,
    // Offset just past each mark seen so far.
    labels: HashMap<String, u64>,
    pub io: I,
}

impl<R: Read + Seek, I: Io> StreamInterpreter<R, I> {
    pub fn new(src: R, io: I) -> Self {
        StreamInterpreter {
            src,
            stack: Stack::new(),
            call_stack: Vec::new(),
            heap: HashMap::new(),
            labels: HashMap::new(),
            io,
        }
    }

    /// Decode and execute instructions until the program exits or fails.
    pub fn run(&mut self) -> Result<(), StreamError> {
        use Token::{LineFeed as L, Space as S, Tab as T};

        loop {
            let a = self.must_token()?;
            let b = self.must_token()?;
            if (a, b) == (S, S) {
                // Stack Manipulation: Push
                let value = self.read_number()?;
                self.stack.push(value);
                continue;
            }
            let c = self.must_token()?;

            match (a, b, c) {
                // Stack Manipulation
                (S, L, S) => {
                    let top = self.stack.peek(0)?;
                    self.stack.push(top);
                }
                (S, T, S) => {
                    let n = self.read_number()?;
                    let value = self.stack.peek(count_arg(n)?)?;
                    self.stack.push(value);
                }
                (S, L, T) => self.stack.swap_top()?,
                (S, L, L) => {
                    self.stack.pop()?;
                }
                (S, T, L) => {
                    let n = self.read_number()?;
                    self.stack.slide(count_arg(n)?)?;
                }

                // Arithmetic
                (T, S, S) => {
                    let d = self.must_token()?;
                    let op: fn(i64, i64) -> i64 = match d {
                        S => i64::wrapping_add,
                        T => i64::wrapping_sub,
                        L => i64::wrapping_mul,
                    };
                    self.binary(op)?;
                }
                (T, S, T) => {
                    let d = self.must_token()?;
                    let op: fn(i64, i64) -> i64 = match d {
                        S => i64::wrapping_div,
                        T => i64::wrapping_rem,
                        L => {
                            return Err(StreamError::UnknownInstruction(opcode_name(&[
                                a, b, c, d,
                            ])))
                        }
                    };
                    self.divide(op)?;
                }

                // Heap Access
                (T, T, S) => {
                    self.stack.need(2)?;
                    let value = self.stack.pop()?;
                    let addr = self.stack.pop()?;
                    self.heap_store(addr, value)?;
                }
                (T, T, T) => {
                    let addr = self.stack.pop()?;
                    let value = self.heap_load(addr)?;
                    self.stack.push(value);
                }

                // Flow Control
                (L, S, S) => {
                    let label = self.read_label()?;
                    self.mark(label)?;
                }
                (L, S, T) => {
                    let label = self.read_label()?;
                    let return_to = self.src.stream_position()?;
                    self.call_stack.push(return_to);
                    self.jump(&label)?;
                }
                (L, S, L) => {
                    let label = self.read_label()?;
                    self.jump(&label)?;
                }
                (L, T, S) => {
                    let label = self.read_label()?;
                    if self.stack.pop()? == 0 {
                        self.jump(&label)?;
                    }
                }
                (L, T, T) => {
                    let label = self.read_label()?;
                    if self.stack.pop()? < 0 {
                        self.jump(&label)?;
                    }
                }
                (L, T, L) => {
                    let return_to = self
                        .call_stack
                        .pop()
                        .ok_or(RuntimeError::EmptyCallStack)?;
                    self.src.seek(SeekFrom::Start(return_to))?;
                }
                (L, L, L) => return Ok(()),

                // I/O
                (T, L, S) => {
                    let d = self.must_token()?;
                    match d {
                        S => {
                            let value = self.stack.pop()?;
                            self.io.write_char(value)?;
                        }
                        T => {
                            let value = self.stack.pop()?;
                            self.io.write_number(value)?;
                        }
                        L => {
                            return Err(StreamError::UnknownInstruction(opcode_name(&[
                                a, b, c, d,
                            ])))
                        }
                    }
                }
                (T, L, T) => {
                    let d = self.must_token()?;
                    match d {
                        S => {
                            let addr = self.stack.pop()?;
                            let value = self.io.read_char()?;
                            self.heap_store(addr, value)?;
                        }
                        T => {
                            let addr = self.stack.pop()?;
                            let value = self.io.read_number()?;
                            self.heap_store(addr, value)?;
                        }
                        L => {
                            return Err(StreamError::UnknownInstruction(opcode_name(&[
                                a, b, c, d,
                            ])))
                        }
                    }
                }

                other => {
                    return Err(StreamError::UnknownInstruction(opcode_name(&[
                        other.0, other.1, other.2,
                    ])))
                }
            }
        }
    }

    // ========================================================================
    // LABELS AND JUMPS
    // ========================================================================

    /// Record the offset just past a mark. A loop that passes the same
    /// mark again re-records the same offset, which is fine; the same
    /// label at two different offsets is a duplicate definition.
    fn mark(&mut self, label: String) -> Result<(), StreamError> {
        let pos = self.src.stream_position()?;
        match self.labels.get(&label) {
            Some(&existing) if existing != pos => Err(StreamError::DuplicateLabel(label)),
            Some(_) => Ok(()),
            None => {
                self.labels.insert(label, pos);
                Ok(())
            }
        }
    }

    fn jump(&mut self, label: &str) -> Result<(), StreamError> {
        if let Some(&pos) = self.labels.get(label) {
            self.src.seek(SeekFrom::Start(pos))?;
            return Ok(());
        }
        self.scan_for(label)
    }

    /// Skip forward over instructions without executing them, recording
    /// every mark, until the wanted label is defined. Reaching the end of
    /// the source first means the label does not exist.
    fn scan_for(&mut self, label: &str) -> Result<(), StreamError> {
        use Token::{LineFeed as L, Space as S, Tab as T};

        loop {
            let Some(a) = self.next_token()? else {
                return Err(StreamError::UndefinedLabel(label.to_string()));
            };
            let b = self.must_token()?;
            if (a, b) == (S, S) {
                self.skip_to_line_feed()?; // push argument
                continue;
            }
            let c = self.must_token()?;

            match (a, b, c) {
                // Argument-less one-byte tails
                (S, L, _) | (T, T, _) | (L, T, L) | (L, L, L) => {}
                // Copy and slide carry a number
                (S, T, _) => self.skip_to_line_feed()?,
                // Arithmetic and I/O have a fourth opcode byte
                (T, S, _) | (T, L, _) => {
                    self.must_token()?;
                }
                // Marks must still be recorded while skipping
                (L, S, S) => {
                    let seen = self.read_label()?;
                    let found = seen == label;
                    self.mark(seen)?;
                    if found {
                        return Ok(());
                    }
                }
                // Other flow control carries a label argument
                (L, S, _) | (L, T, _) => self.skip_to_line_feed()?,
                other => {
                    return Err(StreamError::UnknownInstruction(opcode_name(&[
                        other.0, other.1, other.2,
                    ])))
                }
            }
        }
    }

    // ========================================================================
    // TOKEN AND ARGUMENT DECODING
    // ========================================================================

    /// Next significant byte, reading past comment bytes. None at EOF.
    fn next_token(&mut self) -> Result<Option<Token>, StreamError> {
        let mut buf = [0u8; 1];
        loop {
            if self.src.read(&mut buf)? == 0 {
                return Ok(None);
            }
            if let Some(token) = Token::from_byte(buf[0]) {
                return Ok(Some(token));
            }
        }
    }

    fn must_token(&mut self) -> Result<Token, StreamError> {
        self.next_token()?.ok_or(StreamError::UnexpectedEof)
    }

    /// Same literal format the parser decodes: sign, then MSB-first binary
    /// digits, terminated by a line feed.
    fn read_number(&mut self) -> Result<i64, StreamError> {
        let negative = match self.must_token()? {
            Token::Space => false,
            Token::Tab => true,
            Token::LineFeed => return Err(StreamError::MissingSign),
        };

        let first = loop {
            match self.must_token()? {
                Token::Space => continue,
                other => break other,
            }
        };
        if first == Token::LineFeed {
            return Ok(0);
        }

        let mut value: u64 = 1;
        let mut bits = 1u32;
        loop {
            let bit = match self.must_token()? {
                Token::Space => 0,
                Token::Tab => 1,
                Token::LineFeed => break,
            };
            if bits == 63 {
                return Err(StreamError::NumberTooLarge);
            }
            value = (value << 1) | bit;
            bits += 1;
        }

        let value = value as i64;
        Ok(if negative { -value } else { value })
    }

    fn read_label(&mut self) -> Result<String, StreamError> {
        let mut label = String::new();
        loop {
            match self.must_token()? {
                Token::Space => label.push(' '),
                Token::Tab => label.push('\t'),
                Token::LineFeed => return Ok(label),
            }
        }
    }

    fn skip_to_line_feed(&mut self) -> Result<(), StreamError> {
        while self.must_token()? != Token::LineFeed {}
        Ok(())
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    fn binary(&mut self, op: fn(i64, i64) -> i64) -> Result<(), StreamError> {
        self.stack.need(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        self.stack.push(op(a, b));
        Ok(())
    }

    fn divide(&mut self, op: fn(i64, i64) -> i64) -> Result<(), StreamError> {
        self.stack.need(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        if b == 0 {
            return Err(RuntimeError::DivisionByZero.into());
        }
        self.stack.push(op(a, b));
        Ok(())
    }

    fn heap_store(&mut self, addr: i64, value: i64) -> Result<(), StreamError> {
        if addr < 0 {
            return Err(RuntimeError::NegativeHeapAddress(addr).into());
        }
        self.heap.insert(addr, value);
        Ok(())
    }

    fn heap_load(&self, addr: i64) -> Result<i64, StreamError> {
        if addr < 0 {
            return Err(RuntimeError::NegativeHeapAddress(addr).into());
        }
        Ok(self.heap.get(&addr).copied().unwrap_or(0))
    }
}
