// lexer.rs - Whitespace tokenizer

use std::fmt;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// The three significant bytes of a Whitespace source file. Every other
/// byte is a comment and never reaches the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Space,    // 0x20
    Tab,      // 0x09
    LineFeed, // 0x0A
}

impl Token {
    pub fn from_byte(b: u8) -> Option<Token> {
        match b {
            b' ' => Some(Token::Space),
            b'\t' => Some(Token::Tab),
            b'\n' => Some(Token::LineFeed),
            _ => None,
        }
    }

    pub fn byte(self) -> u8 {
        match self {
            Token::Space => b' ',
            Token::Tab => b'\t',
            Token::LineFeed => b'\n',
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Space => write!(f, "space"),
            Token::Tab => write!(f, "tab"),
            Token::LineFeed => write!(f, "line feed"),
        }
    }
}

// ============================================================================
// LEXER
// ============================================================================

/// Lazily yields the significant bytes of the input, skipping everything
/// else. The sequence cannot fail; a source made entirely of comments is
/// simply empty.
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Lexer { input, position: 0 }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while self.position < self.input.len() {
            let b = self.input[self.position];
            self.position += 1;
            if let Some(token) = Token::from_byte(b) {
                return Some(token);
            }
        }
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================
