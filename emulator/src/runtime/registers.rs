use bitflags::bitflags;
use parse_display::Display;
use thiserror::Error;

use crate::constants as C;

bitflags! {
    /// Condition bits set by `CMP`. Exactly one of them is set after a comparison.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: C::Word {
        const EQUAL   = 0b0000_0001;
        const GREATER = 0b0000_0010;
        const LESS    = 0b0000_0100;
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010b}", self.bits())
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("invalid register index {0}")]
    InvalidIndex(usize),
}

/// A general purpose register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("R{0}")]
pub struct Reg(u8);

impl Reg {
    /// Interrupt mask
    pub const IM: Self = Self(5);

    /// Interrupt status
    pub const IS: Self = Self(6);

    /// Stack pointer
    pub const SP: Self = Self(7);

    /// Decode a register operand. Only the low 3 bits select the register.
    #[must_use]
    pub const fn from_operand(byte: C::Word) -> Self {
        Self(byte & 0b111)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<usize> for Reg {
    type Error = RegisterError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        u8::try_from(index)
            .ok()
            .filter(|i| usize::from(*i) < C::REGISTER_COUNT)
            .map(Self)
            .ok_or(RegisterError::InvalidIndex(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    /// General purpose registers. R5, R6 and R7 double as IM, IS and SP.
    pub gp: [C::Word; C::REGISTER_COUNT],

    /// Program counter
    pub pc: C::Address,

    /// Flags register
    pub fl: Flags,
}

impl Default for Registers {
    fn default() -> Self {
        let mut gp = [0; C::REGISTER_COUNT];
        gp[C::SP] = C::STACK_START;
        Self {
            gp,
            pc: 0,
            fl: Flags::empty(),
        }
    }
}

impl Registers {
    /// Get a register value by index
    ///
    /// # Errors
    ///
    /// Fails if the index is not in `0..=7`.
    pub fn get(&self, index: usize) -> Result<C::Word, RegisterError> {
        self.gp
            .get(index)
            .copied()
            .ok_or(RegisterError::InvalidIndex(index))
    }

    /// Set a register value by index
    ///
    /// # Errors
    ///
    /// Fails if the index is not in `0..=7`.
    pub fn set(&mut self, index: usize, value: C::Word) -> Result<(), RegisterError> {
        let cell = self
            .gp
            .get_mut(index)
            .ok_or(RegisterError::InvalidIndex(index))?;
        *cell = value;
        Ok(())
    }

    #[must_use]
    pub const fn reg(&self, reg: Reg) -> C::Word {
        self.gp[reg.index()]
    }

    pub fn set_reg(&mut self, reg: Reg, value: C::Word) {
        self.gp[reg.index()] = value;
    }

    #[must_use]
    pub const fn sp(&self) -> C::Address {
        self.gp[C::SP]
    }

    pub fn set_sp(&mut self, sp: C::Address) {
        self.gp[C::SP] = sp;
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, value) in self.gp.iter().enumerate() {
            write!(f, "R{index} = {value} | ")?;
        }
        write!(f, "PC = {:#04x} | FL = {:?}", self.pc, self.fl)
    }
}
