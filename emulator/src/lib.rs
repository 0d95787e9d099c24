//! Emulator for the LS-8, a small 8-bit register machine.
//!
//! The [`runtime`] module holds the machine itself. [`loader`] and [`disasm`] turn listings into
//! program bytes and back.

pub mod constants;
pub mod disasm;
pub mod loader;
pub mod runtime;

pub use self::loader::{from_image, parse_listing};
pub use self::runtime::Computer;
