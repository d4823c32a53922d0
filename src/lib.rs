pub mod bytecode;
pub mod compiler;
pub mod interpreter;
pub mod io;
pub mod lexer;
pub mod parser;
pub mod stream;

use thiserror::Error;

/// Any failure the interpreter can produce, from reading the source file
/// through executing the last instruction.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
    #[error(transparent)]
    Compile(#[from] compiler::CompileError),
    #[error(transparent)]
    Runtime(#[from] interpreter::RuntimeError),
    #[error(transparent)]
    Stream(#[from] stream::StreamError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
