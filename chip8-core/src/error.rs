use thiserror::Error;

/// Conditions that stop the interpreter or prevent it from being built
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum Error {
    /// `2NNN` executed with all 16 stack slots in use
    #[error("cannot enter subroutine at {addr:#05x}, stack is full")]
    StackOverflow { addr: u16 },
    /// `00EE` executed outside of any subroutine, with `halt_on_empty_return` on
    #[error("cannot return, not in subroutine")]
    StackUnderflow,
    #[error("context not provided")]
    MissingContext,
    #[error("program not provided")]
    MissingProgram,
}
