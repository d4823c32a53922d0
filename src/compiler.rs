// compiler.rs - translates parsed commands into resolved bytecode

use std::collections::HashMap;

use thiserror::Error;

use crate::bytecode::{Instruction, Program, PLACEHOLDER_ADDR};
use crate::parser::Command;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("duplicate label: {0:?}")]
    DuplicateLabel(String),
    #[error("undefined label: {0:?}")]
    UndefinedLabel(String),
    #[error("label points past end of code")]
    LabelPastEnd,
}

// ============================================================================
// LABEL RESOLUTION
// ============================================================================

/// Labels may be referenced before they are defined, so resolution cannot
/// be purely single-pass: references to labels already in the table
/// resolve immediately, the rest emit `PLACEHOLDER_ADDR` and a fix-up
/// entry, and the fix-ups are patched once the whole sequence has been
/// seen.
struct Labels {
    table: HashMap<String, usize>,
    fixups: Vec<(usize, String)>,
    // Address of the most recently defined label, for the past-end check.
    max_label: Option<usize>,
}

impl Labels {
    fn new() -> Self {
        Labels {
            table: HashMap::new(),
            fixups: Vec::new(),
            max_label: None,
        }
    }

    fn define(&mut self, label: String, addr: usize) -> Result<(), CompileError> {
        if self.table.contains_key(&label) {
            return Err(CompileError::DuplicateLabel(label));
        }
        self.max_label = Some(addr);
        self.table.insert(label, addr);
        Ok(())
    }

    fn resolve(&mut self, label: String, at: usize) -> usize {
        match self.table.get(&label) {
            Some(&target) => target,
            None => {
                self.fixups.push((at, label));
                PLACEHOLDER_ADDR
            }
        }
    }

    fn patch(self, code: &mut Program) -> Result<(), CompileError> {
        if self.max_label.is_some_and(|addr| addr >= code.len()) {
            return Err(CompileError::LabelPastEnd);
        }
        for (at, label) in self.fixups {
            let Some(&target) = self.table.get(&label) else {
                return Err(CompileError::UndefinedLabel(label));
            };
            retarget(&mut code[at], target);
        }
        Ok(())
    }
}

fn retarget(instr: &mut Instruction, target: usize) {
    match instr {
        Instruction::Call(addr)
        | Instruction::Jump(addr)
        | Instruction::JumpIfZero(addr)
        | Instruction::JumpIfNeg(addr) => *addr = target,
        other => unreachable!("fix-up recorded at non-branch instruction {:?}", other),
    }
}

// ============================================================================
// COMPILER
// ============================================================================

/// Translate the command sequence into executable bytecode in a single
/// forward pass plus one backpatching sweep. `Mark` commands define labels
/// and emit no instruction; every other command maps to exactly one.
pub fn compile(commands: Vec<Command>) -> Result<Program, CompileError> {
    let mut labels = Labels::new();
    let mut code: Program = Vec::with_capacity(commands.len());

    for command in commands {
        let instr = match command {
            Command::Mark(label) => {
                labels.define(label, code.len())?;
                continue;
            }
            Command::Call(label) => {
                Instruction::Call(labels.resolve(label, code.len()))
            }
            Command::Jump(label) => {
                Instruction::Jump(labels.resolve(label, code.len()))
            }
            Command::JumpIfZero(label) => {
                Instruction::JumpIfZero(labels.resolve(label, code.len()))
            }
            Command::JumpIfNeg(label) => {
                Instruction::JumpIfNeg(labels.resolve(label, code.len()))
            }
            Command::Push(value) => Instruction::Push(value),
            Command::Dup => Instruction::Dup,
            Command::Copy(count) => Instruction::Copy(count),
            Command::Swap => Instruction::Swap,
            Command::Discard => Instruction::Discard,
            Command::Slide(count) => Instruction::Slide(count),
            Command::Add => Instruction::Add,
            Command::Sub => Instruction::Sub,
            Command::Mul => Instruction::Mul,
            Command::Div => Instruction::Div,
            Command::Mod => Instruction::Mod,
            Command::Store => Instruction::Store,
            Command::Retrieve => Instruction::Retrieve,
            Command::Return => Instruction::Return,
            Command::Exit => Instruction::Exit,
            Command::OutChar => Instruction::OutChar,
            Command::OutNumber => Instruction::OutNumber,
            Command::ReadChar => Instruction::ReadChar,
            Command::ReadNumber => Instruction::ReadNumber,
        };
        code.push(instr);
    }

    labels.patch(&mut code)?;
    Ok(code)
}
