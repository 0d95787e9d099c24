pub type Address = u8;
pub type Word = u8;

/// Total size of the computer memory
pub const MEMORY_SIZE: usize = 256;

/// Start of the stack pointer
pub const STACK_START: Address = 0xF4;

/// Default place to load a program
pub const PROGRAM_START: Address = 0x00;

/// Address holding the entry point of the interrupt handler
pub const INTERRUPT_VECTOR: Address = 0xF8;

/// Register holding the interrupt mask
pub const IM: usize = 5;

/// Register holding the interrupt status
pub const IS: usize = 6;

/// Register holding the stack pointer
pub const SP: usize = 7;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Registers saved on the stack when an interrupt is taken, in push order
pub const INTERRUPT_SAVED_REGISTERS: std::ops::Range<usize> = 0..6;

/// Time between two timer interrupts
pub const INTERRUPT_PERIOD: std::time::Duration = std::time::Duration::from_secs(1);
