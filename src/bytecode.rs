// bytecode.rs - resolved instruction set for the Whitespace VM

/// A fully resolved instruction: label references have been replaced by
/// absolute indices into the instruction array, and label definitions are
/// gone entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Push a literal value onto the operand stack
    Push(i64),

    /// Duplicate the top of the stack
    Dup,

    /// Copy the value n slots below the top (0 = top) and push it
    Copy(i64),

    /// Swap the top two values
    Swap,

    /// Discard the top value
    Discard,

    /// Pop the top value, drop the n values below it, push it back
    Slide(i64),

    /// Pop b, pop a, push the result
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    /// Pop a value, pop an address, write the value at that address
    Store,

    /// Pop an address, push the heap value stored there
    Retrieve,

    /// Push the return address onto the call stack and jump
    Call(usize),

    /// Unconditional jump
    Jump(usize),

    /// Pop one value, jump if it is zero
    JumpIfZero(usize),

    /// Pop one value, jump if it is negative
    JumpIfNeg(usize),

    /// Pop the call stack and resume there
    Return,

    /// Halt the program successfully
    Exit,

    /// Pop a value and write it as a character
    OutChar,

    /// Pop a value and write it as a decimal number
    OutNumber,

    /// Pop an address, read a character, store it at that address
    ReadChar,

    /// Pop an address, read a number, store it at that address
    ReadNumber,
}

/// A compiled program.
pub type Program = Vec<Instruction>;

/// Placeholder address for forward label references (backpatched by the
/// compiler once all labels are known).
pub const PLACEHOLDER_ADDR: usize = usize::MAX;
