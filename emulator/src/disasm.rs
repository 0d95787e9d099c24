//! Program listings, decoded with the same decoder as the execution loop.

use crate::constants::{Address, Word};
use crate::runtime::{Instruction, Memory, MemoryError};

/// One decoded line of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub address: Address,
    pub bytes: Vec<Word>,

    /// `None` when the bytes do not decode to an instruction
    pub instruction: Option<Instruction>,
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes: Vec<_> = self.bytes.iter().map(|b| format!("{b:02X}")).collect();
        let bytes = bytes.join(" ");
        write!(f, "{:02X}: {bytes:<8}  ", self.address)?;
        match &self.instruction {
            Some(instruction) => write!(f, "{instruction}"),
            None => write!(f, ".byte {:#04x}", self.bytes[0]),
        }
    }
}

/// Decode a program as if it was loaded at `start`
///
/// Bytes that are not a valid instruction are listed as raw data and decoding resumes right
/// after them.
pub fn disassemble(program: &[Word], start: Address) -> Result<Vec<Line>, MemoryError> {
    let mut memory = Memory::default();
    memory.load(program, start)?;

    let end = usize::from(start) + program.len();
    let mut lines = Vec::new();
    let mut address = usize::from(start);

    while address < end {
        // Every address below `end` fits, since the program was loaded successfully
        let addr = Address::try_from(address).map_err(|_| MemoryError::InvalidAddress(address))?;
        let (width, instruction) = match Instruction::decode(&memory, addr) {
            Ok(instruction) => (usize::from(instruction.width()), Some(instruction)),
            Err(_) => (1, None),
        };

        let bytes = (address..address + width)
            .map(|a| memory.get(a))
            .collect::<Result<_, _>>()?;

        lines.push(Line {
            address: addr,
            bytes,
            instruction,
        });
        address += width;
    }

    Ok(lines)
}
