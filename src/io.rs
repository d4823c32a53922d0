// io.rs - pluggable character/number I/O for running programs

use std::io::{self, BufRead, Read, Write};

/// The console surface a running program talks through. Both the bytecode
/// VM and the streaming interpreter take an implementation of this trait,
/// so tests can substitute in-memory fixtures for the real streams.
pub trait Io {
    fn write_char(&mut self, value: i64) -> io::Result<()>;
    fn write_number(&mut self, value: i64) -> io::Result<()>;
    fn read_char(&mut self) -> io::Result<i64>;
    fn read_number(&mut self) -> io::Result<i64>;
}

/// Default bindings: stdin/stdout, characters written as their code point
/// and numbers as decimal text terminated by a newline; numbers are read
/// as a decimal line.
pub struct ConsoleIo;

impl Io for ConsoleIo {
    fn write_char(&mut self, value: i64) -> io::Result<()> {
        let ch = u32::try_from(value)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid character code: {}", value),
                )
            })?;
        let mut out = io::stdout().lock();
        write!(out, "{}", ch)?;
        // Prompts written without a trailing newline must be visible
        // before the program blocks on a read.
        out.flush()
    }

    fn write_number(&mut self, value: i64) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", value)?;
        out.flush()
    }

    fn read_char(&mut self) -> io::Result<i64> {
        let mut buf = [0u8; 1];
        io::stdin().lock().read_exact(&mut buf)?;
        Ok(i64::from(buf[0]))
    }

    fn read_number(&mut self) -> io::Result<i64> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of input while reading a number",
            ));
        }
        line.trim().parse().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("not a number: {:?}", line.trim()),
            )
        })
    }
}
