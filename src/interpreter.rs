// interpreter.rs - the Whitespace virtual machine

use thiserror::Error;

use crate::bytecode::{Instruction, Program};
use crate::io::{ConsoleIo, Io};

// ============================================================================
// OPERAND STACK
// ============================================================================

/// Operand stack of signed 64-bit values. Shared by the bytecode VM and
/// the streaming interpreter.
#[derive(Debug, Default)]
pub struct Stack {
    data: Vec<i64>,
}

impl Stack {
    pub fn new() -> Self {
        Stack { data: Vec::new() }
    }

    pub fn push(&mut self, value: i64) {
        self.data.push(value);
    }

    pub fn pop(&mut self) -> Result<i64, RuntimeError> {
        self.data.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Value n slots below the top (0 = top), without removing it.
    pub fn peek(&self, n: usize) -> Result<i64, RuntimeError> {
        self.need(n + 1)?;
        Ok(self.data[self.data.len() - 1 - n])
    }

    /// Fail with underflow unless at least n values are present. Every
    /// stack-consuming operation calls this before mutating anything, so a
    /// failed operation leaves the stack exactly as it found it.
    pub fn need(&self, n: usize) -> Result<(), RuntimeError> {
        if self.data.len() < n {
            Err(RuntimeError::StackUnderflow)
        } else {
            Ok(())
        }
    }

    pub fn swap_top(&mut self) -> Result<(), RuntimeError> {
        self.need(2)?;
        let top = self.data.len() - 1;
        self.data.swap(top, top - 1);
        Ok(())
    }

    /// Pop the top value, drop the n values below it, push it back.
    pub fn slide(&mut self, n: usize) -> Result<(), RuntimeError> {
        self.need(n + 1)?;
        let top = self.pop()?;
        self.data.truncate(self.data.len() - n);
        self.data.push(top);
        Ok(())
    }

    pub fn values(&self) -> &[i64] {
        &self.data
    }
}

/// Copy/slide counts arrive as signed literals; a negative count has no
/// meaning on the stack.
pub(crate) fn count_arg(n: i64) -> Result<usize, RuntimeError> {
    usize::try_from(n).map_err(|_| RuntimeError::NegativeCount(n))
}

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("stack underflow")]
    StackUnderflow,
    #[error("negative heap address: {0}")]
    NegativeHeapAddress(i64),
    #[error("negative copy/slide count: {0}")]
    NegativeCount(i64),
    #[error("division by zero")]
    DivisionByZero,
    #[error("return with empty call stack")]
    EmptyCallStack,
    #[error("program counter out of range: {0}")]
    PcOutOfRange(usize),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// INTERPRETER
// ============================================================================

/// Outcome of a single dispatch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Exited,
}

/// Executes a compiled program against the stack-and-heap machine.
/// One instance owns all of its state; running two programs concurrently
/// means two instances.
pub struct Interpreter<I: Io = ConsoleIo> {
    code: Program,
    pub stack: Stack,
    heap: Vec<i64>,
    call_stack: Vec<usize>,
    pc: usize,
    pub io: I,
}

impl Interpreter<ConsoleIo> {
    pub fn new(code: Program) -> Self {
        Self::with_io(code, ConsoleIo)
    }
}

impl<I: Io> Interpreter<I> {
    pub fn with_io(code: Program, io: I) -> Self {
        Interpreter {
            code,
            stack: Stack::new(),
            heap: Vec::new(),
            call_stack: Vec::new(),
            pc: 0,
            io,
        }
    }

    /// Run until the program exits or fails. The first error wins and
    /// stops dispatch; nothing is executed past it.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        while self.step()? == Status::Running {}
        Ok(())
    }

    /// Fetch the instruction at the program counter, advance the counter,
    /// dispatch. Well-formed programs terminate via an explicit exit, so
    /// running off the end of the code is an error.
    pub fn step(&mut self) -> Result<Status, RuntimeError> {
        let instr = *self
            .code
            .get(self.pc)
            .ok_or(RuntimeError::PcOutOfRange(self.pc))?;
        self.pc += 1;

        match instr {
            Instruction::Push(value) => self.stack.push(value),
            Instruction::Dup => {
                let top = self.stack.peek(0)?;
                self.stack.push(top);
            }
            Instruction::Copy(n) => {
                let value = self.stack.peek(count_arg(n)?)?;
                self.stack.push(value);
            }
            Instruction::Swap => self.stack.swap_top()?,
            Instruction::Discard => {
                self.stack.pop()?;
            }
            Instruction::Slide(n) => self.stack.slide(count_arg(n)?)?,

            Instruction::Add => self.binary(i64::wrapping_add)?,
            Instruction::Sub => self.binary(i64::wrapping_sub)?,
            Instruction::Mul => self.binary(i64::wrapping_mul)?,
            Instruction::Div => self.divide(i64::wrapping_div)?,
            Instruction::Mod => self.divide(i64::wrapping_rem)?,

            Instruction::Store => {
                self.stack.need(2)?;
                let value = self.stack.pop()?;
                let addr = self.stack.pop()?;
                self.heap_store(addr, value)?;
            }
            Instruction::Retrieve => {
                let addr = self.stack.pop()?;
                let value = self.heap_load(addr)?;
                self.stack.push(value);
            }

            Instruction::Call(target) => {
                self.call_stack.push(self.pc);
                self.pc = target;
            }
            Instruction::Jump(target) => self.pc = target,
            Instruction::JumpIfZero(target) => {
                if self.stack.pop()? == 0 {
                    self.pc = target;
                }
            }
            Instruction::JumpIfNeg(target) => {
                if self.stack.pop()? < 0 {
                    self.pc = target;
                }
            }
            Instruction::Return => {
                self.pc = self
                    .call_stack
                    .pop()
                    .ok_or(RuntimeError::EmptyCallStack)?;
            }
            Instruction::Exit => return Ok(Status::Exited),

            Instruction::OutChar => {
                let value = self.stack.pop()?;
                self.io.write_char(value)?;
            }
            Instruction::OutNumber => {
                let value = self.stack.pop()?;
                self.io.write_number(value)?;
            }
            Instruction::ReadChar => {
                let addr = self.stack.pop()?;
                let value = self.io.read_char()?;
                self.heap_store(addr, value)?;
            }
            Instruction::ReadNumber => {
                let addr = self.stack.pop()?;
                let value = self.io.read_number()?;
                self.heap_store(addr, value)?;
            }
        }
        Ok(Status::Running)
    }

    /// Pop b, pop a, push op(a, b). Arithmetic wraps on overflow.
    fn binary(&mut self, op: fn(i64, i64) -> i64) -> Result<(), RuntimeError> {
        self.stack.need(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        self.stack.push(op(a, b));
        Ok(())
    }

    fn divide(&mut self, op: fn(i64, i64) -> i64) -> Result<(), RuntimeError> {
        self.stack.need(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        if b == 0 {
            return Err(RuntimeError::DivisionByZero);
        }
        self.stack.push(op(a, b));
        Ok(())
    }

    /// Write to the heap, zero-filling any gap up to the new high-water
    /// mark. Only non-negative addresses are valid.
    fn heap_store(&mut self, addr: i64, value: i64) -> Result<(), RuntimeError> {
        let index =
            usize::try_from(addr).map_err(|_| RuntimeError::NegativeHeapAddress(addr))?;
        if index >= self.heap.len() {
            self.heap.resize(index + 1, 0);
        }
        self.heap[index] = value;
        Ok(())
    }

    /// Addresses past the high-water mark read 0, like every address that
    /// was never written.
    fn heap_load(&self, addr: i64) -> Result<i64, RuntimeError> {
        let index =
            usize::try_from(addr).map_err(|_| RuntimeError::NegativeHeapAddress(addr))?;
        Ok(self.heap.get(index).copied().unwrap_or(0))
    }
}
