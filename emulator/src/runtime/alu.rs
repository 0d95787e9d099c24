//! Register to register arithmetic.
//!
//! Registers are 8 bits wide and every result wraps around modulo 256.

use parse_display::Display;

use super::exception::Exception;
use crate::constants::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "UPPERCASE")]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl AluOp {
    /// Compute `a OP b`
    ///
    /// # Errors
    ///
    /// Dividing by zero raises [`Exception::DivByZero`].
    pub fn apply(self, a: Word, b: Word) -> Result<Word, Exception> {
        match self {
            AluOp::Add => Ok(a.wrapping_add(b)),
            AluOp::Sub => Ok(a.wrapping_sub(b)),
            AluOp::Mul => Ok(a.wrapping_mul(b)),
            AluOp::Div => a.checked_div(b).ok_or(Exception::DivByZero),
        }
    }
}
