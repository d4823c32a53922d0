// End-to-end runs of whole programs through the parse, compile, and
// execute pipeline.

mod common;

use common::*;
use wspace::compiler::{compile, CompileError};
use wspace::interpreter::{Interpreter, RuntimeError, Status};
use wspace::parser::Parser;

fn run_source(source: &str) -> (wspace::Result<()>, String) {
    let mut io_output = String::new();
    let result = (|| -> wspace::Result<()> {
        let commands = Parser::new(source.as_bytes()).parse()?;
        let code = compile(commands)?;
        let mut interp = Interpreter::with_io(code, TestIo::new());
        let result = interp.run();
        io_output = std::mem::take(&mut interp.io.output);
        result?;
        Ok(())
    })();
    (result, io_output)
}

#[test]
fn test_add_and_print() {
    let source = [push(5), push(3), ADD.into(), OUT_NUMBER.into(), EXIT.into()].concat();
    let (result, output) = run_source(&source);
    assert!(result.is_ok());
    assert_eq!(output, "8\n");
}

#[test]
fn test_underflow_after_partial_output() {
    let source = [push(10), OUT_NUMBER.into(), OUT_NUMBER.into()].concat();
    let (result, output) = run_source(&source);
    assert!(matches!(
        result,
        Err(wspace::Error::Runtime(RuntimeError::StackUnderflow))
    ));
    assert_eq!(output, "10\n");
}

#[test]
fn test_infinite_loop_is_valid() {
    // mark "L", jump "L" compiles fine and simply never halts; step a
    // bounded number of times.
    let source = [mark(" \t"), jump(" \t")].concat();
    let commands = Parser::new(source.as_bytes()).parse().unwrap();
    let code = compile(commands).unwrap();
    let mut interp = Interpreter::with_io(code, TestIo::new());
    for _ in 0..100 {
        assert_eq!(interp.step().unwrap(), Status::Running);
    }
}

#[test]
fn test_duplicate_label_stops_before_execution() {
    let source = [mark(" \t"), mark(" \t")].concat();
    let (result, output) = run_source(&source);
    assert!(matches!(
        result,
        Err(wspace::Error::Compile(CompileError::DuplicateLabel(_)))
    ));
    assert_eq!(output, "");
}

#[test]
fn test_heap_round_trip() {
    let source = [
        push(7),
        push(0),
        SWAP.into(),
        STORE.into(),
        push(0),
        RETRIEVE.into(),
        OUT_NUMBER.into(),
        EXIT.into(),
    ]
    .concat();
    let (result, output) = run_source(&source);
    assert!(result.is_ok());
    assert_eq!(output, "7\n");
}

#[test]
fn test_undefined_label_stops_before_execution() {
    let source = [jump("\t\t"), EXIT.into()].concat();
    let (result, output) = run_source(&source);
    assert!(matches!(
        result,
        Err(wspace::Error::Compile(CompileError::UndefinedLabel(_)))
    ));
    assert_eq!(output, "");
}

#[test]
fn test_countdown_loop() {
    let source = [
        push(5),
        mark(" "),
        DUP.into(),
        OUT_NUMBER.into(),
        push(1),
        SUB.into(),
        DUP.into(),
        jump_if_zero("\t"),
        jump(" "),
        mark("\t"),
        EXIT.into(),
    ]
    .concat();
    let (result, output) = run_source(&source);
    assert!(result.is_ok());
    assert_eq!(output, "5\n4\n3\n2\n1\n");
}

#[test]
fn test_subroutine() {
    // A callable that doubles the top of the stack.
    let source = [
        push(21),
        call("\t "),
        OUT_NUMBER.into(),
        EXIT.into(),
        mark("\t "),
        push(2),
        MUL.into(),
        RETURN.into(),
    ]
    .concat();
    let (result, output) = run_source(&source);
    assert!(result.is_ok());
    assert_eq!(output, "42\n");
}

#[test]
fn test_comment_laden_program() {
    let plain = [push(1), push(2), ADD.into(), OUT_NUMBER.into(), EXIT.into()].concat();
    // Interleave comment text around every significant byte.
    let mut annotated = String::new();
    for (i, ch) in plain.chars().enumerate() {
        annotated.push_str(&format!("c{}", i));
        annotated.push(ch);
    }
    annotated.push_str("trailing-comment");
    let (result, output) = run_source(&annotated);
    assert!(result.is_ok());
    assert_eq!(output, "3\n");
}

#[test]
fn test_hello_world_program() {
    let source = include_bytes!("../hello-world.ws");
    let commands = Parser::new(source).parse().unwrap();
    let code = compile(commands).unwrap();
    let mut interp = Interpreter::with_io(code, TestIo::new());
    interp.run().unwrap();
    assert_eq!(interp.io.output, "Hello, World!\n");
}
