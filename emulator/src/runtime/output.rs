//! Where `PRN` and `PRA` send their values.

use std::io::Write;

use parse_display::Display;

/// A single value printed by the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Emission {
    /// Decimal value, from `PRN`
    #[display("{0}")]
    Number(u8),

    /// Character, from `PRA`
    #[display("{0}")]
    Char(char),
}

/// Sink for the program output
pub trait Output {
    fn emit(&mut self, emission: Emission) -> std::io::Result<()>;
}

/// Capture every emission, mostly useful for tests and embedders
impl Output for Vec<Emission> {
    fn emit(&mut self, emission: Emission) -> std::io::Result<()> {
        self.push(emission);
        Ok(())
    }
}

/// Write one emission per line to the inner writer
#[derive(Debug)]
pub struct Console<W> {
    inner: W,
}

impl<W: Write> Console<W> {
    #[must_use]
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl Default for Console<std::io::Stdout> {
    fn default() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Output for Console<W> {
    fn emit(&mut self, emission: Emission) -> std::io::Result<()> {
        writeln!(self.inner, "{emission}")
    }
}
