use crate::constants::{Address, Word, REGISTER_COUNT};

use super::memory::Memory;
use super::registers::{Flags, Registers};

/// State of the machine right before an instruction is fetched.
///
/// Rendered as `TRACE: PC | FL | mem[PC] mem[PC+1] mem[PC+2] | R0 .. R7`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pc: Address,
    fl: Flags,
    bytes: [Option<Word>; 3],
    registers: [Word; REGISTER_COUNT],
}

impl Trace {
    pub(crate) fn capture(registers: &Registers, memory: &Memory) -> Self {
        let mut bytes = [None; 3];
        for (slot, byte) in bytes
            .iter_mut()
            .zip(memory.window(registers.pc.into(), 3))
        {
            *slot = byte;
        }

        Self {
            pc: registers.pc,
            fl: registers.fl,
            bytes,
            registers: registers.gp,
        }
    }
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TRACE: {:02X} | {:02X} |", self.pc, self.fl.bits())?;
        for byte in &self.bytes {
            match byte {
                Some(byte) => write!(f, " {byte:02X}")?,
                None => write!(f, " --")?,
            }
        }
        write!(f, " |")?;
        for register in &self.registers {
            write!(f, " {register:02X}")?;
        }
        Ok(())
    }
}
