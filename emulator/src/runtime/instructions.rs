use std::cmp::Ordering;

use parse_display::Display;
use tracing::debug;

use crate::constants::{Address, Word};

use super::{
    alu::AluOp,
    clock::Clock,
    exception::Exception,
    memory::Memory,
    output::{Emission, Output},
    registers::{Flags, Reg},
    Computer, ProcessorError,
};

/// Opcode bytes of the instruction set.
///
/// The two high bits of an opcode give its number of operand bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,
    Hlt = 0x01,
    Ret = 0x11,
    Iret = 0x13,
    Push = 0x45,
    Pop = 0x46,
    Prn = 0x47,
    Pra = 0x48,
    Call = 0x50,
    Inte = 0x52,
    Jmp = 0x54,
    Jeq = 0x55,
    Jne = 0x56,
    Inc = 0x65,
    Ldi = 0x82,
    St = 0x84,
    Add = 0xA0,
    Mul = 0xA2,
    Div = 0xA3,
    Cmp = 0xA7,
}

impl Opcode {
    /// Number of operand bytes following the opcode
    #[must_use]
    pub const fn operands(self) -> u8 {
        self as u8 >> 6
    }
}

impl TryFrom<Word> for Opcode {
    type Error = Word;

    fn try_from(byte: Word) -> Result<Self, Self::Error> {
        use Opcode::*;

        let opcode = match byte {
            0x00 => Nop,
            0x01 => Hlt,
            0x11 => Ret,
            0x13 => Iret,
            0x45 => Push,
            0x46 => Pop,
            0x47 => Prn,
            0x48 => Pra,
            0x50 => Call,
            0x52 => Inte,
            0x54 => Jmp,
            0x55 => Jeq,
            0x56 => Jne,
            0x65 => Inc,
            0x82 => Ldi,
            0x84 => St,
            0xA0 => Add,
            0xA2 => Mul,
            0xA3 => Div,
            0xA7 => Cmp,
            other => return Err(other),
        };
        Ok(opcode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Instruction {
    /// No-op
    #[display("NOP")]
    Nop,

    /// Stop the computer
    #[display("HLT")]
    Hlt,

    /// Load an immediate value in a register
    #[display("LDI  {0}, {1}")]
    Ldi(Reg, Word),

    /// Print a register as a decimal number
    #[display("PRN  {0}")]
    Prn(Reg),

    /// Print a register as a character
    #[display("PRA  {0}")]
    Pra(Reg),

    /// Add the second register to the first one
    #[display("ADD  {0}, {1}")]
    Add(Reg, Reg),

    /// Multiply the first register by the second one
    #[display("MUL  {0}, {1}")]
    Mul(Reg, Reg),

    /// Divide the first register by the second one
    #[display("DIV  {0}, {1}")]
    Div(Reg, Reg),

    /// Compare two registers and set the flags
    #[display("CMP  {0}, {1}")]
    Cmp(Reg, Reg),

    /// Push a register on the stack
    #[display("PUSH {0}")]
    Push(Reg),

    /// Pop the top of the stack into a register
    #[display("POP  {0}")]
    Pop(Reg),

    /// Push the return address and jump to the address held by the register
    #[display("CALL {0}")]
    Call(Reg),

    /// Return from a `CALL`
    #[display("RET")]
    Ret,

    /// Unconditional jump
    #[display("JMP  {0}")]
    Jmp(Reg),

    /// Jump if equal
    #[display("JEQ  {0}")]
    Jeq(Reg),

    /// Jump if not equal
    #[display("JNE  {0}")]
    Jne(Reg),

    /// Store the second register at the address held by the first one
    #[display("ST   {0}, {1}")]
    St(Reg, Reg),

    /// Reserved, does nothing
    #[display("INC  {0}")]
    Inc(Reg),

    /// Reserved, does nothing
    #[display("INTE {0}")]
    Inte(Reg),

    /// Return from an interrupt handler
    #[display("IRET")]
    Iret,
}

impl Instruction {
    /// Decode the instruction stored at `address`
    ///
    /// # Errors
    ///
    /// Fails on unknown opcodes and when operands would be read past the end of memory.
    pub fn decode(memory: &Memory, address: Address) -> Result<Self, Exception> {
        use Instruction::*;

        let byte = memory.get(address.into())?;
        let opcode = Opcode::try_from(byte).map_err(|opcode| Exception::IllegalOpcode {
            opcode,
            address,
        })?;

        let operand = |offset: usize| memory.get(usize::from(address) + offset);
        let reg = |offset: usize| operand(offset).map(Reg::from_operand);

        let instruction = match opcode {
            Opcode::Nop => Nop,
            Opcode::Hlt => Hlt,
            Opcode::Ldi => Ldi(reg(1)?, operand(2)?),
            Opcode::Prn => Prn(reg(1)?),
            Opcode::Pra => Pra(reg(1)?),
            Opcode::Add => Add(reg(1)?, reg(2)?),
            Opcode::Mul => Mul(reg(1)?, reg(2)?),
            Opcode::Div => Div(reg(1)?, reg(2)?),
            Opcode::Cmp => Cmp(reg(1)?, reg(2)?),
            Opcode::Push => Push(reg(1)?),
            Opcode::Pop => Pop(reg(1)?),
            Opcode::Call => Call(reg(1)?),
            Opcode::Ret => Ret,
            Opcode::Jmp => Jmp(reg(1)?),
            Opcode::Jeq => Jeq(reg(1)?),
            Opcode::Jne => Jne(reg(1)?),
            Opcode::St => St(reg(1)?, reg(2)?),
            Opcode::Inc => Inc(reg(1)?),
            Opcode::Inte => Inte(reg(1)?),
            Opcode::Iret => Iret,
        };

        Ok(instruction)
    }

    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        use Instruction::*;

        match self {
            Nop => Opcode::Nop,
            Hlt => Opcode::Hlt,
            Ldi(_, _) => Opcode::Ldi,
            Prn(_) => Opcode::Prn,
            Pra(_) => Opcode::Pra,
            Add(_, _) => Opcode::Add,
            Mul(_, _) => Opcode::Mul,
            Div(_, _) => Opcode::Div,
            Cmp(_, _) => Opcode::Cmp,
            Push(_) => Opcode::Push,
            Pop(_) => Opcode::Pop,
            Call(_) => Opcode::Call,
            Ret => Opcode::Ret,
            Jmp(_) => Opcode::Jmp,
            Jeq(_) => Opcode::Jeq,
            Jne(_) => Opcode::Jne,
            St(_, _) => Opcode::St,
            Inc(_) => Opcode::Inc,
            Inte(_) => Opcode::Inte,
            Iret => Opcode::Iret,
        }
    }

    /// Size of the encoded instruction, in bytes
    #[must_use]
    pub const fn width(&self) -> u8 {
        1 + self.opcode().operands()
    }

    /// Execute the instruction
    #[tracing::instrument(skip(computer))]
    pub(crate) fn execute<O: Output, K: Clock>(
        &self,
        computer: &mut Computer<O, K>,
    ) -> Result<(), ProcessorError> {
        use Instruction::*;

        match *self {
            Nop | Inc(_) | Inte(_) => {}

            Hlt => {
                computer.halt();
                return Ok(());
            }

            Ldi(reg, value) => computer.registers.set_reg(reg, value),

            Prn(reg) => {
                let value = computer.registers.reg(reg);
                computer.emit(Emission::Number(value))?;
            }

            Pra(reg) => {
                let value = computer.registers.reg(reg);
                computer.emit(Emission::Char(char::from(value)))?;
            }

            Add(a, b) => computer.alu(AluOp::Add, a, b)?,
            Mul(a, b) => computer.alu(AluOp::Mul, a, b)?,
            Div(a, b) => computer.alu(AluOp::Div, a, b)?,

            Cmp(a, b) => {
                let a = computer.registers.reg(a);
                let b = computer.registers.reg(b);
                computer.registers.fl = match a.cmp(&b) {
                    Ordering::Equal => Flags::EQUAL,
                    Ordering::Greater => Flags::GREATER,
                    Ordering::Less => Flags::LESS,
                };
                debug!("cmp({}, {}) => {:?}", a, b, computer.registers.fl);
            }

            Push(reg) => computer.push_register(reg)?,

            Pop(reg) => computer.pop_register(reg)?,

            Call(reg) => {
                let ret = computer.next_pc(self.width())?;
                computer.push(ret)?;
                computer.jump(computer.registers.reg(reg));
                return Ok(());
            }

            Ret => {
                // The slot holding the return address is cleared once read
                let slot = computer.registers.sp();
                let ret = computer.pop()?;
                computer.memory.set(slot.into(), 0)?;
                debug!("Returning to {:#04x}", ret);
                computer.jump(ret);
                return Ok(());
            }

            Jmp(reg) => {
                computer.jump(computer.registers.reg(reg));
                return Ok(());
            }

            Jeq(reg) => {
                if computer.registers.fl.contains(Flags::EQUAL) {
                    computer.jump(computer.registers.reg(reg));
                    return Ok(());
                }
            }

            Jne(reg) => {
                if !computer.registers.fl.contains(Flags::EQUAL) {
                    computer.jump(computer.registers.reg(reg));
                    return Ok(());
                }
            }

            St(a, b) => {
                let address = computer.registers.reg(a);
                let value = computer.registers.reg(b);
                computer.memory.set(address.into(), value)?;
            }

            Iret => {
                computer.return_from_interrupt()?;
                return Ok(());
            }
        };

        computer.registers.pc = computer.next_pc(self.width())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn memory(bytes: &[Word]) -> Memory {
        let mut memory = Memory::default();
        memory.load(bytes, 0).unwrap();
        memory
    }

    #[test]
    fn opcode_round_trip() {
        for byte in 0..=u8::MAX {
            if let Ok(opcode) = Opcode::try_from(byte) {
                assert_eq!(opcode as u8, byte);
            }
        }
        assert_eq!(Opcode::try_from(0xFF), Err(0xFF));
    }

    #[test]
    fn operand_count_from_high_bits() {
        assert_eq!(Opcode::Hlt.operands(), 0);
        assert_eq!(Opcode::Ret.operands(), 0);
        assert_eq!(Opcode::Prn.operands(), 1);
        assert_eq!(Opcode::Jne.operands(), 1);
        assert_eq!(Opcode::Ldi.operands(), 2);
        assert_eq!(Opcode::Cmp.operands(), 2);
    }

    #[test]
    fn decode_test() {
        let memory = memory(&[0x82, 0x00, 0x08, 0x47, 0x00, 0x01]);
        let ldi = Instruction::decode(&memory, 0).unwrap();
        assert_eq!(ldi, Instruction::Ldi(Reg::from_operand(0), 8));
        assert_eq!(ldi.width(), 3);

        let prn = Instruction::decode(&memory, 3).unwrap();
        assert_eq!(prn, Instruction::Prn(Reg::from_operand(0)));
        assert_eq!(prn.width(), 2);

        assert_eq!(Instruction::decode(&memory, 5), Ok(Instruction::Hlt));
    }

    #[test]
    fn decode_masks_register_operands() {
        let memory = memory(&[0xA0, 0b1111_1001, 0b0000_1010]);
        assert_eq!(
            Instruction::decode(&memory, 0),
            Ok(Instruction::Add(Reg::from_operand(1), Reg::from_operand(2)))
        );
    }

    #[test]
    fn decode_illegal_opcode() {
        let memory = memory(&[0x00, 0xFF]);
        assert_eq!(
            Instruction::decode(&memory, 1),
            Err(Exception::IllegalOpcode {
                opcode: 0xFF,
                address: 1
            })
        );
    }

    #[test]
    fn decode_operands_past_end_of_memory() {
        let mut memory = Memory::default();
        memory.set(0xFE, 0x82).unwrap();
        assert_eq!(
            Instruction::decode(&memory, 0xFE),
            Err(Exception::InvalidMemoryAccess(
                crate::runtime::MemoryError::InvalidAddress(0x100)
            ))
        );
    }

    #[test]
    fn display_test() {
        assert_eq!(Instruction::Ldi(Reg::from_operand(0), 8).to_string(), "LDI  R0, 8");
        assert_eq!(Instruction::Push(Reg::from_operand(1)).to_string(), "PUSH R1");
        assert_eq!(Instruction::Ret.to_string(), "RET");
    }
}
