// main.rs - command-line entry point

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser as _;

use wspace::compiler::compile;
use wspace::interpreter::Interpreter;
use wspace::io::ConsoleIo;
use wspace::parser::Parser;
use wspace::stream::StreamInterpreter;

#[derive(clap::Parser)]
#[command(version, about = "Interpreter for the Whitespace programming language")]
struct Args {
    /// Whitespace source file to run
    #[arg(default_value = "hello-world.ws")]
    file: PathBuf,

    /// Interpret the source directly instead of compiling it to bytecode
    /// first; slower, but tolerates trailing garbage after the exit
    /// instruction and programs too large to hold in memory
    #[arg(long)]
    stream: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(args: &Args) -> wspace::Result<()> {
    if args.stream {
        return run_streaming(&args.file);
    }
    let source = fs::read(&args.file)?;
    let commands = Parser::new(&source).parse()?;
    let code = compile(commands)?;
    Interpreter::new(code).run()?;
    Ok(())
}

fn run_streaming(path: &Path) -> wspace::Result<()> {
    let file = BufReader::new(File::open(path)?);
    StreamInterpreter::new(file, ConsoleIo).run()?;
    Ok(())
}
