use thiserror::Error;

use crate::constants::{Address, Word, MEMORY_SIZE};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The given address was invalid
    #[error("invalid address {0:#x}")]
    InvalidAddress(usize),

    /// A push moved the stack pointer below address 0
    #[error("stack overflow")]
    StackOverflow,

    /// A pop moved the stack pointer past the end of memory
    #[error("stack underflow")]
    StackUnderflow,

    /// A program does not fit between its load address and the end of memory
    #[error("program of {len} bytes does not fit at address {start:#04x}")]
    ProgramTooLarge { start: Address, len: usize },
}

/// Holds the memory cells of the computer.
///
/// It has 256 byte-sized cells, all zeroed on startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: [Word; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            inner: [0; MEMORY_SIZE],
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory {{ [{} bytes] }}", self.inner.len())
    }
}

impl Memory {
    /// Get the byte at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get(&self, address: usize) -> Result<Word, MemoryError> {
        self.inner
            .get(address)
            .copied()
            .ok_or(MemoryError::InvalidAddress(address))
    }

    /// Set the byte at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn set(&mut self, address: usize, value: Word) -> Result<(), MemoryError> {
        let cell = self
            .inner
            .get_mut(address)
            .ok_or(MemoryError::InvalidAddress(address))?;
        *cell = value;
        Ok(())
    }

    /// Copy a program image into memory, starting at `start`
    pub fn load(&mut self, bytes: &[Word], start: Address) -> Result<(), MemoryError> {
        let begin = usize::from(start);
        let end = begin + bytes.len();
        let target = self
            .inner
            .get_mut(begin..end)
            .ok_or(MemoryError::ProgramTooLarge {
                start,
                len: bytes.len(),
            })?;
        target.copy_from_slice(bytes);
        Ok(())
    }

    /// Iterate over a window of memory, without going past its end
    pub(crate) fn window(&self, start: usize, len: usize) -> impl Iterator<Item = Option<Word>> + '_ {
        (start..start + len).map(|address| self.inner.get(address).copied())
    }
}
