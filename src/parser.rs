// parser.rs - Whitespace command parser (tokens → commands)

use std::fmt;

use thiserror::Error;

use crate::lexer::{Lexer, Token};

// ============================================================================
// COMMANDS - the parsed program, one value per source instruction
// ============================================================================

/// A parsed instruction, before label resolution. `Mark` still carries its
/// label and the jump/call variants still refer to labels by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // IMP: Stack Manipulation: [Space]
    Push(i64),
    Dup,
    Copy(i64),
    Swap,
    Discard,
    Slide(i64),
    // IMP: Arithmetic: [Tab][Space]
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // IMP: Heap Access: [Tab][Tab]
    Store,
    Retrieve,
    // IMP: Flow Control: [LF]
    Mark(String),
    Call(String),
    Jump(String),
    JumpIfZero(String),
    JumpIfNeg(String),
    Return,
    Exit,
    // IMP: I/O: [Tab][LF]
    OutChar,
    OutNumber,
    ReadChar,
    ReadNumber,
}

// ============================================================================
// PARSER STATES
// ============================================================================

/// Decoder state: the prefix of significant bytes read so far within the
/// current instruction. Named after the IMP grouping each prefix selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Start,
    ImpTab,
    StackManip,
    StackManipTab,
    StackManipLf,
    Arithmetic,
    ArithSpace,
    ArithTab,
    HeapAccess,
    FlowControl,
    FlowSpace,
    FlowTab,
    FlowLf,
    Io,
    IoSpace,
    IoTab,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            State::Start => "start",
            State::ImpTab => "tab IMP",
            State::StackManip => "stack manipulation",
            State::StackManipTab => "stack manipulation/tab",
            State::StackManipLf => "stack manipulation/LF",
            State::Arithmetic => "arithmetic",
            State::ArithSpace => "arithmetic/space",
            State::ArithTab => "arithmetic/tab",
            State::HeapAccess => "heap access",
            State::FlowControl => "flow control",
            State::FlowSpace => "flow control/space",
            State::FlowTab => "flow control/tab",
            State::FlowLf => "flow control/LF",
            State::Io => "I/O",
            State::IoSpace => "I/O/space",
            State::IoTab => "I/O/tab",
        };
        write!(f, "{}", name)
    }
}

/// What a transition does: move deeper into the prefix, or terminate the
/// instruction by emitting a command (plain, or after decoding the numeric
/// literal or label that follows the opcode).
enum Step {
    Shift(State),
    Emit(Command),
    Number(fn(i64) -> Command),
    Label(fn(String) -> Command),
}

/// The canonical transition table for the three-byte instruction prefixes.
/// Every valid instruction shape is one row here; anything else is an
/// unexpected byte for the state it occurs in.
fn transition(state: State, token: Token) -> Result<Step, ParseError> {
    use State::*;
    use Token::{LineFeed, Space, Tab};

    Ok(match (state, token) {
        (Start, Space) => Step::Shift(StackManip),
        (Start, Tab) => Step::Shift(ImpTab),
        (Start, LineFeed) => Step::Shift(FlowControl),

        (ImpTab, Space) => Step::Shift(Arithmetic),
        (ImpTab, Tab) => Step::Shift(HeapAccess),
        (ImpTab, LineFeed) => Step::Shift(Io),

        (StackManip, Space) => Step::Number(Command::Push),
        (StackManip, Tab) => Step::Shift(StackManipTab),
        (StackManip, LineFeed) => Step::Shift(StackManipLf),
        (StackManipTab, Space) => Step::Number(Command::Copy),
        (StackManipTab, LineFeed) => Step::Number(Command::Slide),
        (StackManipLf, Space) => Step::Emit(Command::Dup),
        (StackManipLf, Tab) => Step::Emit(Command::Swap),
        (StackManipLf, LineFeed) => Step::Emit(Command::Discard),

        (Arithmetic, Space) => Step::Shift(ArithSpace),
        (Arithmetic, Tab) => Step::Shift(ArithTab),
        (ArithSpace, Space) => Step::Emit(Command::Add),
        (ArithSpace, Tab) => Step::Emit(Command::Sub),
        (ArithSpace, LineFeed) => Step::Emit(Command::Mul),
        (ArithTab, Space) => Step::Emit(Command::Div),
        (ArithTab, Tab) => Step::Emit(Command::Mod),

        (HeapAccess, Space) => Step::Emit(Command::Store),
        (HeapAccess, Tab) => Step::Emit(Command::Retrieve),

        (FlowControl, Space) => Step::Shift(FlowSpace),
        (FlowControl, Tab) => Step::Shift(FlowTab),
        (FlowControl, LineFeed) => Step::Shift(FlowLf),
        (FlowSpace, Space) => Step::Label(Command::Mark),
        (FlowSpace, Tab) => Step::Label(Command::Call),
        (FlowSpace, LineFeed) => Step::Label(Command::Jump),
        (FlowTab, Space) => Step::Label(Command::JumpIfZero),
        (FlowTab, Tab) => Step::Label(Command::JumpIfNeg),
        (FlowTab, LineFeed) => Step::Emit(Command::Return),
        (FlowLf, LineFeed) => Step::Emit(Command::Exit),

        (Io, Space) => Step::Shift(IoSpace),
        (Io, Tab) => Step::Shift(IoTab),
        (IoSpace, Space) => Step::Emit(Command::OutChar),
        (IoSpace, Tab) => Step::Emit(Command::OutNumber),
        (IoTab, Space) => Step::Emit(Command::ReadChar),
        (IoTab, Tab) => Step::Emit(Command::ReadNumber),

        (state, token) => return Err(ParseError::UnexpectedToken { token, state }),
    })
}

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected {token} in state {state}")]
    UnexpectedToken { token: Token, state: State },
    #[error("unexpected end of input in state {0}")]
    UnexpectedEofInState(State),
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("unexpected line feed, expected a sign (space or tab)")]
    MissingSign,
    #[error("number literal too large for this implementation (more than 63 bits)")]
    NumberTooLarge,
}

// ============================================================================
// PARSER
// ============================================================================

pub struct Parser<'a> {
    tokens: Lexer<'a>,
    state: State,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Parser {
            tokens: Lexer::new(source),
            state: State::Start,
        }
    }

    /// Parse the whole source into its ordered command sequence. Fails on
    /// the first malformed instruction, literal, or label.
    pub fn parse(&mut self) -> Result<Vec<Command>, ParseError> {
        let mut commands = Vec::new();

        while let Some(token) = self.tokens.next() {
            match transition(self.state, token)? {
                Step::Shift(next) => self.state = next,
                Step::Emit(command) => {
                    commands.push(command);
                    self.state = State::Start;
                }
                Step::Number(make) => {
                    let value = self.parse_number()?;
                    commands.push(make(value));
                    self.state = State::Start;
                }
                Step::Label(make) => {
                    let label = self.parse_label()?;
                    commands.push(make(label));
                    self.state = State::Start;
                }
            }
        }

        if self.state != State::Start {
            return Err(ParseError::UnexpectedEofInState(self.state));
        }
        Ok(commands)
    }

    /// Decode a numeric literal: a sign byte, then binary digits read
    /// most-significant-bit first (space = 0, tab = 1), terminated by a
    /// line feed. A literal with no digits is zero. More than 63
    /// significant bits does not fit an i64 and is an error.
    fn parse_number(&mut self) -> Result<i64, ParseError> {
        let negative = match self.must_next("a sign for a number")? {
            Token::Space => false,
            Token::Tab => true,
            Token::LineFeed => return Err(ParseError::MissingSign),
        };

        // Leading zero bits contribute nothing and do not count against
        // the 63-bit limit.
        let first = loop {
            match self.must_next("a number")? {
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
            let bit = match self.must_next("a number")? {
                Token::Space => 0,
                Token::Tab => 1,
                Token::LineFeed => break,
            };
            if bits == 63 {
                return Err(ParseError::NumberTooLarge);
            }
            value = (value << 1) | bit;
            bits += 1;
        }

        let value = value as i64;
        Ok(if negative { -value } else { value })
    }

    /// Decode a label: an opaque run of space/tab bytes terminated by a
    /// line feed. The byte sequence itself is the label's identity.
    fn parse_label(&mut self) -> Result<String, ParseError> {
        let mut label = String::new();
        loop {
            match self.must_next("a label")? {
                Token::Space => label.push(' '),
                Token::Tab => label.push('\t'),
                Token::LineFeed => return Ok(label),
            }
        }
    }

    fn must_next(&mut self, reading: &'static str) -> Result<Token, ParseError> {
        self.tokens.next().ok_or(ParseError::UnexpectedEof(reading))
    }
}
