use thiserror::Error;

use crate::constants::{Address, Word};

use super::memory::MemoryError;

/// Unrecoverable machine faults. Any of them stops the execution loop.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    #[error("illegal opcode {opcode:#04x} at address {address:#04x}")]
    IllegalOpcode { opcode: Word, address: Address },

    #[error("division by zero")]
    DivByZero,

    #[error("invalid memory access ({0})")]
    InvalidMemoryAccess(#[from] MemoryError),
}
