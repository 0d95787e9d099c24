use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::constants as C;

mod alu;
mod clock;
mod exception;
mod instructions;
mod memory;
mod output;
mod registers;
mod trace;

pub use self::alu::AluOp;
pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::exception::Exception;
pub use self::instructions::{Instruction, Opcode};
pub use self::memory::{Memory, MemoryError};
pub use self::output::{Console, Emission, Output};
pub use self::registers::{Flags, Reg, RegisterError, Registers};
pub use self::trace::Trace;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("CPU exception: {0}")]
    Exception(#[from] Exception),

    #[error("could not write program output: {0}")]
    Output(#[from] std::io::Error),

    #[error("computer is not running")]
    NotRunning,
}

// Implement a MemoryError -> ProcessorError conversion to simplify code
impl From<MemoryError> for ProcessorError {
    fn from(e: MemoryError) -> Self {
        Self::Exception(Exception::InvalidMemoryAccess(e))
    }
}

type Result<T> = std::result::Result<T, ProcessorError>;

/// Execution state of a [`Computer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Freshly built, no instruction executed yet
    Ready,

    Running,

    /// Stopped by a `HLT` instruction
    Halted,

    /// Stopped by an unrecoverable fault
    Faulted(Exception),
}

pub struct Computer<O = Console<std::io::Stdout>, K = SystemClock> {
    pub registers: Registers,
    pub memory: Memory,
    pub output: O,
    pub clock: K,
    pub cycles: usize,
    state: State,
    interrupts_enabled: bool,
    last_interrupt: Duration,
}

impl<O, K> std::fmt::Debug for Computer<O, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ registers: {:?}, state: {:?}, memory: [...] }}",
            self.registers, self.state
        )
    }
}

impl<O: Output + Default, K: Clock + Default> Default for Computer<O, K> {
    fn default() -> Self {
        Self::new(O::default(), K::default())
    }
}

impl<O: Output, K: Clock> Computer<O, K> {
    #[must_use]
    pub fn new(output: O, clock: K) -> Self {
        let last_interrupt = clock.now();
        Self {
            registers: Registers::default(),
            memory: Memory::default(),
            output,
            clock,
            cycles: 0,
            state: State::Ready,
            interrupts_enabled: true,
            last_interrupt,
        }
    }

    /// Copy a program into memory, starting at `start`
    pub fn load(
        &mut self,
        bytes: &[C::Word],
        start: C::Address,
    ) -> std::result::Result<(), MemoryError> {
        debug!(len = bytes.len(), start, "Loading program");
        self.memory.load(bytes, start)
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub const fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    /// Snapshot of the machine, one line per instruction when tracing
    #[must_use]
    pub fn trace(&self) -> Trace {
        Trace::capture(&self.registers, &self.memory)
    }

    pub(crate) fn halt(&mut self) {
        debug!("Halting");
        self.state = State::Halted;
    }

    pub(crate) fn emit(&mut self, emission: Emission) -> Result<()> {
        debug!(%emission, "Emitting");
        self.output.emit(emission)?;
        Ok(())
    }

    /// Apply an arithmetic operation: `dest = dest OP src`
    #[tracing::instrument(skip(self))]
    pub fn alu(&mut self, op: AluOp, dest: Reg, src: Reg) -> std::result::Result<(), Exception> {
        let a = self.registers.reg(dest);
        let b = self.registers.reg(src);
        let res = op.apply(a, b)?;
        debug!("{} {} {} = {}", a, op, b, res);
        self.registers.set_reg(dest, res);
        Ok(())
    }

    fn jump(&mut self, address: C::Address) {
        debug!("Jumping to address {:#04x}", address);
        self.registers.pc = address;
    }

    /// Address of the instruction following one of the given width
    fn next_pc(&self, width: u8) -> std::result::Result<C::Address, MemoryError> {
        let pc = self.registers.pc;
        pc.checked_add(width)
            .ok_or(MemoryError::InvalidAddress(usize::from(pc) + usize::from(width)))
    }

    /// Move SP down one slot and return it
    fn grow_stack(&mut self) -> std::result::Result<C::Address, MemoryError> {
        let sp = self
            .registers
            .sp()
            .checked_sub(1)
            .ok_or(MemoryError::StackOverflow)?;
        self.registers.set_sp(sp);
        Ok(sp)
    }

    /// Move SP up one slot
    fn shrink_stack(&mut self) -> std::result::Result<(), MemoryError> {
        let sp = self
            .registers
            .sp()
            .checked_add(1)
            .ok_or(MemoryError::StackUnderflow)?;
        self.registers.set_sp(sp);
        Ok(())
    }

    fn push(&mut self, value: C::Word) -> std::result::Result<(), MemoryError> {
        let sp = self.grow_stack()?;
        self.store_stack(sp, value)
    }

    /// Push a register. SP moves before the register is read, so `PUSH R7` stores the new SP.
    fn push_register(&mut self, reg: Reg) -> std::result::Result<(), MemoryError> {
        let sp = self.grow_stack()?;
        self.store_stack(sp, self.registers.reg(reg))
    }

    fn store_stack(&mut self, sp: C::Address, value: C::Word) -> std::result::Result<(), MemoryError> {
        self.memory.set(sp.into(), value)?;
        debug!(sp, value, "Pushed value");
        Ok(())
    }

    fn pop(&mut self) -> std::result::Result<C::Word, MemoryError> {
        let sp = self.registers.sp();
        // First read the value
        let value = self.memory.get(sp.into())?;
        // Then move the SP
        self.shrink_stack()?;
        debug!(sp, value, "Popped value");
        Ok(value)
    }

    /// Pop into a register. The register is written before SP moves, so `POP R7` ends one past
    /// the popped value.
    fn pop_register(&mut self, reg: Reg) -> std::result::Result<(), MemoryError> {
        let sp = self.registers.sp();
        if sp == C::Address::MAX {
            return Err(MemoryError::StackUnderflow);
        }
        let value = self.memory.get(sp.into())?;
        self.registers.set_reg(reg, value);
        self.shrink_stack()?;
        debug!(sp, value, %reg, "Popped value");
        Ok(())
    }

    /// Check the timer and enter the interrupt handler if it is due
    fn check_interrupts(&mut self) -> Result<()> {
        if !self.interrupts_enabled || self.registers.gp[C::IM] & 1 == 0 {
            return Ok(());
        }

        let now = self.clock.now();
        if now.saturating_sub(self.last_interrupt) < C::INTERRUPT_PERIOD {
            return Ok(());
        }

        self.registers.gp[C::IS] = 1;
        let masked = self.registers.gp[C::IM] & self.registers.gp[C::IS];
        if masked != 0 {
            // Lowest pending interrupt wins, one per cycle
            let interrupt = masked.trailing_zeros();
            self.enter_interrupt(interrupt)?;
            self.last_interrupt = now;
        }

        Ok(())
    }

    fn enter_interrupt(&mut self, interrupt: u32) -> Result<()> {
        self.interrupts_enabled = false;
        self.registers.gp[C::IS] = 0;

        self.push(self.registers.pc)?;
        self.push(self.registers.fl.bits())?;
        for index in C::INTERRUPT_SAVED_REGISTERS {
            self.push(self.registers.gp[index])?;
        }

        let handler = self.memory.get(C::INTERRUPT_VECTOR.into())?;
        info!(interrupt, handler, "Taking interrupt");
        self.jump(handler);
        Ok(())
    }

    /// Restore the frame saved by [`Computer::enter_interrupt`] and re-enable interrupts
    fn return_from_interrupt(&mut self) -> Result<()> {
        for index in C::INTERRUPT_SAVED_REGISTERS.rev() {
            let value = self.pop()?;
            self.registers.gp[index] = value;
        }
        self.registers.fl = Flags::from_bits_retain(self.pop()?);
        let pc = self.pop()?;
        self.interrupts_enabled = true;
        debug!("Returning from interrupt to {:#04x}", pc);
        self.jump(pc);
        Ok(())
    }

    #[tracing::instrument(skip(self), err)]
    fn decode_instruction(&self) -> Result<Instruction> {
        Ok(Instruction::decode(&self.memory, self.registers.pc)?)
    }

    fn cycle(&mut self) -> Result<()> {
        self.check_interrupts()?;
        let inst = self.decode_instruction()?;
        debug!(pc = self.registers.pc, "Executing instruction \"{}\"", inst);
        inst.execute(self)?;
        self.cycles += 1;
        Ok(())
    }

    /// Run a single fetch, interrupt check and execute cycle
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn step(&mut self) -> Result<()> {
        match self.state {
            State::Ready => self.state = State::Running,
            State::Running => {}
            State::Halted | State::Faulted(_) => return Err(ProcessorError::NotRunning),
        }

        let res = self.cycle();
        if let Err(ProcessorError::Exception(exception)) = &res {
            error!(%exception, pc = self.registers.pc, "Machine fault");
            self.state = State::Faulted(*exception);
        }
        debug!("Register state {}", self.registers);
        res
    }

    /// Run until the program halts or faults
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.step()?;
            if self.state == State::Halted {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    type TestComputer = Computer<Vec<Emission>, ManualClock>;

    fn computer(program: &[C::Word]) -> TestComputer {
        let mut computer = TestComputer::default();
        computer.load(program, 0).unwrap();
        computer
    }

    fn numbers(computer: &TestComputer) -> Vec<C::Word> {
        computer
            .output
            .iter()
            .filter_map(|e| match e {
                Emission::Number(n) => Some(*n),
                Emission::Char(_) => None,
            })
            .collect()
    }

    #[test]
    fn print8_test() {
        let mut computer = computer(&[0x82, 0x00, 0x08, 0x47, 0x00, 0x01, 0x00, 0x00]);
        computer.run().unwrap();
        assert_eq!(computer.output, vec![Emission::Number(8)]);
        assert_eq!(computer.state(), State::Halted);
        assert_eq!(computer.cycles, 3);
        // HLT does not move the program counter
        assert_eq!(computer.registers.pc, 5);
    }

    #[test]
    fn ldi_every_register() {
        for index in 0..C::REGISTER_COUNT {
            for value in [0, 1, 0x7F, 0xFF] {
                let operand = u8::try_from(index).unwrap();
                let mut computer = computer(&[0x82, operand, value, 0x01]);
                computer.step().unwrap();
                assert_eq!(computer.registers.get(index), Ok(value));
                assert_eq!(computer.registers.pc, 3);
            }
        }
    }

    #[test]
    fn step_test() {
        let mut computer = computer(&[
            0x82, 0x00, 0x42, // LDI R0, 0x42
            0x82, 0x01, 0x24, // LDI R1, 0x24
            0xA0, 0x01, 0x00, // ADD R1, R0
            0x01, // HLT
        ]);

        assert_eq!(computer.state(), State::Ready);
        computer.step().unwrap();
        assert_eq!(computer.state(), State::Running);
        assert_eq!(computer.registers.gp[0], 0x42);
        assert_eq!(computer.registers.gp[1], 0);
        assert_eq!(computer.registers.pc, 3);

        computer.step().unwrap();
        assert_eq!(computer.registers.gp[1], 0x24);
        assert_eq!(computer.registers.pc, 6);

        computer.step().unwrap();
        assert_eq!(computer.registers.gp[0], 0x42);
        assert_eq!(computer.registers.gp[1], 0x66);
        assert_eq!(computer.registers.pc, 9);

        computer.step().unwrap();
        assert_eq!(computer.state(), State::Halted);
        assert!(matches!(computer.step(), Err(ProcessorError::NotRunning)));
    }

    #[test]
    fn mul_wraps_to_eight_bits() {
        let mut computer = computer(&[
            0x82, 0x00, 0x10, // LDI R0, 16
            0x82, 0x01, 0x11, // LDI R1, 17
            0xA2, 0x00, 0x01, // MUL R0, R1
            0x47, 0x00, // PRN R0
            0x01, // HLT
        ]);
        computer.run().unwrap();
        // 16 * 17 = 272 = 256 + 16
        assert_eq!(numbers(&computer), vec![16]);
    }

    #[test]
    fn div_test() {
        let mut computer = computer(&[
            0x82, 0x00, 0x64, // LDI R0, 100
            0x82, 0x01, 0x07, // LDI R1, 7
            0xA3, 0x00, 0x01, // DIV R0, R1
            0x47, 0x00, // PRN R0
            0x01, // HLT
        ]);
        computer.run().unwrap();
        assert_eq!(numbers(&computer), vec![14]);
    }

    #[test]
    fn div_by_zero_faults() {
        let mut computer = computer(&[
            0x82, 0x00, 0x08, // LDI R0, 8
            0xA3, 0x00, 0x01, // DIV R0, R1 (R1 = 0)
            0x47, 0x00, // PRN R0
            0x01, // HLT
        ]);
        let res = computer.run();
        assert!(matches!(
            res,
            Err(ProcessorError::Exception(Exception::DivByZero))
        ));
        assert_eq!(computer.state(), State::Faulted(Exception::DivByZero));
        // The destination register and the program counter are left untouched
        assert_eq!(computer.registers.gp[0], 8);
        assert_eq!(computer.registers.pc, 3);
        assert!(computer.output.is_empty());
    }

    #[test]
    fn illegal_opcode_faults() {
        let mut computer = computer(&[0x00, 0xFF]);
        let res = computer.run();
        let expected = Exception::IllegalOpcode {
            opcode: 0xFF,
            address: 1,
        };
        assert!(matches!(res, Err(ProcessorError::Exception(e)) if e == expected));
        assert_eq!(computer.state(), State::Faulted(expected));
    }

    #[test]
    fn pc_running_off_memory_faults() {
        let mut computer = TestComputer::default();
        // A NOP in the last cell has no successor
        computer.registers.pc = 0xFF;
        let res = computer.step();
        assert!(matches!(
            res,
            Err(ProcessorError::Exception(Exception::InvalidMemoryAccess(
                MemoryError::InvalidAddress(0x100)
            )))
        ));
    }

    #[test]
    fn pra_test() {
        let mut computer = computer(&[
            0x82, 0x00, 0x48, // LDI R0, 'H'
            0x48, 0x00, // PRA R0
            0x82, 0x00, 0x69, // LDI R0, 'i'
            0x48, 0x00, // PRA R0
            0x01, // HLT
        ]);
        computer.run().unwrap();
        assert_eq!(
            computer.output,
            vec![Emission::Char('H'), Emission::Char('i')]
        );
    }

    #[test]
    fn push_pop_test() {
        let mut computer = computer(&[
            0x82, 0x01, 0x05, // LDI R1, 5
            0x45, 0x01, // PUSH R1
            0x46, 0x02, // POP R2
            0x01, // HLT
        ]);
        computer.step().unwrap();
        computer.step().unwrap();
        assert_eq!(computer.registers.sp(), C::STACK_START - 1);
        assert_eq!(computer.memory.get(0xF3), Ok(5));
        assert_eq!(computer.registers.pc, 5);

        computer.run().unwrap();
        assert_eq!(computer.registers.gp[2], 5);
        assert_eq!(computer.registers.sp(), C::STACK_START);
        assert_eq!(computer.registers.pc, 7);
    }

    #[test]
    fn stack_overflow_faults() {
        let mut computer = computer(&[0x45, 0x00]);
        computer.registers.set_sp(0);
        assert!(matches!(
            computer.step(),
            Err(ProcessorError::Exception(Exception::InvalidMemoryAccess(
                MemoryError::StackOverflow
            )))
        ));
    }

    #[test]
    fn stack_underflow_faults() {
        let mut computer = computer(&[0x46, 0x00]);
        computer.registers.set_sp(0xFF);
        assert!(matches!(
            computer.step(),
            Err(ProcessorError::Exception(Exception::InvalidMemoryAccess(
                MemoryError::StackUnderflow
            )))
        ));
    }

    #[test]
    fn push_sp_stores_the_decremented_pointer() {
        let mut computer = computer(&[
            0x45, 0x07, // PUSH R7
            0x01, // HLT
        ]);
        computer.run().unwrap();
        assert_eq!(computer.registers.sp(), 0xF3);
        assert_eq!(computer.memory.get(0xF3), Ok(0xF3));
    }

    #[test]
    fn pop_sp_increments_after_the_write() {
        let mut computer = computer(&[
            0x46, 0x07, // POP R7
            0x01, // HLT
        ]);
        computer.memory.set(usize::from(C::STACK_START), 0x40).unwrap();
        computer.step().unwrap();
        assert_eq!(computer.registers.sp(), 0x41);
        assert_eq!(computer.registers.pc, 2);
    }

    #[test]
    fn pop_at_top_of_memory_leaves_register_untouched() {
        let mut computer = computer(&[0x46, 0x00]);
        computer.registers.gp[0] = 7;
        computer.registers.set_sp(0xFF);
        assert!(computer.step().is_err());
        assert_eq!(computer.registers.gp[0], 7);
        assert_eq!(computer.registers.sp(), 0xFF);
    }

    #[test]
    fn call_test() {
        let subroutine: C::Address = 0x10;
        let mut computer = computer(&[
            0x82, 0x01, subroutine, // LDI R1, subroutine
            0x50, 0x01, // CALL R1
            0x47, 0x00, // PRN R0
            0x01, // HLT
        ]);
        // subroutine:
        //     LDI R0, 42
        //     RET
        computer.load(&[0x82, 0x00, 0x2A, 0x11], subroutine).unwrap();

        // LDI R1, subroutine
        computer.step().unwrap();
        assert_eq!(computer.registers.sp(), C::STACK_START);

        // CALL R1
        computer.step().unwrap();
        assert_eq!(computer.registers.pc, subroutine);
        assert_eq!(computer.registers.sp(), C::STACK_START - 1);
        assert_eq!(computer.memory.get(0xF3), Ok(5));

        // LDI R0, 42
        computer.step().unwrap();
        assert_eq!(computer.registers.gp[0], 42);
        assert_eq!(computer.registers.pc, subroutine + 3);

        // RET
        computer.step().unwrap();
        assert_eq!(computer.registers.pc, 5);
        assert_eq!(computer.registers.sp(), C::STACK_START);
        // The return address slot is cleared
        assert_eq!(computer.memory.get(0xF3), Ok(0));

        computer.run().unwrap();
        assert_eq!(numbers(&computer), vec![42]);
    }

    #[test]
    fn cmp_sets_exactly_one_flag() {
        for (a, b, expected) in [
            (5, 5, Flags::EQUAL),
            (3, 9, Flags::LESS),
            (9, 3, Flags::GREATER),
            (0, 0xFF, Flags::LESS),
        ] {
            let mut computer = computer(&[
                0x82, 0x00, a, // LDI R0, a
                0x82, 0x01, b, // LDI R1, b
                0xA7, 0x00, 0x01, // CMP R0, R1
                0x01, // HLT
            ]);
            // Stale flags get overwritten, never combined
            computer.registers.fl = Flags::all();
            computer.run().unwrap();
            assert_eq!(computer.registers.fl, expected);
            assert_eq!(computer.registers.fl.bits().count_ones(), 1);
            assert_eq!(computer.registers.pc, 9);
        }
    }

    fn conditional_jump(opcode: C::Word, flags: Flags) -> C::Address {
        let mut computer = computer(&[
            0x82, 0x03, 0x40, // LDI R3, 0x40
            opcode, 0x03, // JEQ/JNE R3
        ]);
        computer.registers.fl = flags;
        computer.step().unwrap();
        computer.step().unwrap();
        computer.registers.pc
    }

    #[test]
    fn jeq_test() {
        assert_eq!(conditional_jump(0x55, Flags::EQUAL), 0x40);
        assert_eq!(conditional_jump(0x55, Flags::LESS), 5);
        assert_eq!(conditional_jump(0x55, Flags::GREATER), 5);
        assert_eq!(conditional_jump(0x55, Flags::empty()), 5);
    }

    #[test]
    fn jne_test() {
        assert_eq!(conditional_jump(0x56, Flags::EQUAL), 5);
        assert_eq!(conditional_jump(0x56, Flags::LESS), 0x40);
        assert_eq!(conditional_jump(0x56, Flags::GREATER), 0x40);
        assert_eq!(conditional_jump(0x56, Flags::empty()), 0x40);
    }

    #[test]
    fn jmp_test() {
        let mut computer = computer(&[
            0x82, 0x02, 0x20, // LDI R2, 0x20
            0x54, 0x02, // JMP R2
        ]);
        computer.step().unwrap();
        computer.step().unwrap();
        assert_eq!(computer.registers.pc, 0x20);
    }

    #[test]
    fn st_test() {
        let mut computer = computer(&[
            0x82, 0x00, 0x80, // LDI R0, 0x80
            0x82, 0x01, 0x99, // LDI R1, 0x99
            0x84, 0x00, 0x01, // ST R0, R1
            0x01, // HLT
        ]);
        computer.run().unwrap();
        assert_eq!(computer.memory.get(0x80), Ok(0x99));
        assert_eq!(computer.registers.pc, 9);
    }

    #[test]
    fn reserved_instructions_skip_their_operand() {
        let mut computer = computer(&[
            0x82, 0x00, 0x07, // LDI R0, 7
            0x65, 0x00, // INC R0
            0x52, 0x00, // INTE R0
            0x01, // HLT
        ]);
        computer.run().unwrap();
        assert_eq!(computer.registers.gp[0], 7);
        assert_eq!(computer.registers.pc, 7);
    }

    #[test]
    fn alu_sub_test() {
        let mut computer = TestComputer::default();
        computer.registers.gp[0] = 3;
        computer.registers.gp[1] = 5;
        computer
            .alu(AluOp::Sub, Reg::from_operand(0), Reg::from_operand(1))
            .unwrap();
        assert_eq!(computer.registers.gp[0], 0xFE);
    }

    /// Program arming the timer interrupt and spinning on a NOP loop at 0x08.
    /// The handler lives at 0x20.
    fn interrupt_computer() -> TestComputer {
        let mut computer = computer(&[
            0x82, 0x05, 0x01, // LDI IM, 1
            0x82, 0x00, 0x08, // LDI R0, 0x08
            0x00, 0x00, // padding
            0x00, // loop: NOP
            0x54, 0x00, // JMP R0
        ]);
        computer.memory.set(C::INTERRUPT_VECTOR.into(), 0x20).unwrap();
        // handler:
        //     IRET
        computer.memory.set(0x20, 0x13).unwrap();
        computer
    }

    #[test]
    fn timer_interrupt_test() {
        let mut computer = interrupt_computer();
        computer.step().unwrap(); // LDI IM, 1
        computer.step().unwrap(); // LDI R0, 0x08
        computer.registers.pc = 0x08;
        computer.registers.fl = Flags::LESS;
        computer.registers.gp[1] = 0x11;
        computer.registers.gp[4] = 0x44;

        // Not yet a full second
        computer.clock.advance(Duration::from_millis(999));
        computer.step().unwrap(); // NOP
        assert_eq!(computer.registers.pc, 0x09);
        assert_eq!(computer.registers.sp(), C::STACK_START);

        computer.clock.advance(Duration::from_millis(1));
        computer.step().unwrap(); // interrupt, then IRET at the handler

        // Frame was pushed then popped back by IRET
        assert_eq!(computer.registers.sp(), C::STACK_START);
        assert_eq!(computer.registers.pc, 0x09);
        assert_eq!(computer.registers.fl, Flags::LESS);
        assert!(computer.interrupts_enabled());
    }

    #[test]
    fn interrupt_saves_context() {
        let mut computer = interrupt_computer();
        // Replace the IRET with a HLT to observe the saved frame
        computer.memory.set(0x20, 0x01).unwrap();
        computer.step().unwrap();
        computer.step().unwrap();
        computer.registers.pc = 0x08;
        computer.registers.fl = Flags::GREATER;
        computer.registers.gp[1] = 0x11;
        computer.registers.gp[2] = 0x22;
        computer.registers.gp[3] = 0x33;
        computer.registers.gp[4] = 0x44;

        computer.clock.advance(Duration::from_secs(1));
        computer.step().unwrap();

        assert_eq!(computer.state(), State::Halted);
        assert_eq!(computer.registers.pc, 0x20);
        assert_eq!(computer.registers.sp(), C::STACK_START - 8);
        assert!(!computer.interrupts_enabled());
        assert_eq!(computer.registers.gp[C::IS], 0);

        // PC, FL, R0..R5, from the top of memory down
        let frame: Vec<_> = (0xEC..0xF4)
            .rev()
            .map(|address| computer.memory.get(address).unwrap())
            .collect();
        assert_eq!(
            frame,
            vec![0x08, Flags::GREATER.bits(), 0x08, 0x11, 0x22, 0x33, 0x44, 0x01]
        );
    }

    #[test]
    fn interrupts_need_the_mask_bit() {
        let mut computer = computer(&[0x00, 0x00, 0x00]);
        computer.memory.set(C::INTERRUPT_VECTOR.into(), 0x20).unwrap();
        computer.clock.advance(Duration::from_secs(5));
        computer.step().unwrap();
        assert_eq!(computer.registers.pc, 1);
        assert_eq!(computer.registers.sp(), C::STACK_START);
    }

    #[test]
    fn one_interrupt_until_iret() {
        let mut computer = interrupt_computer();
        // handler: NOP; NOP; IRET
        computer.memory.load(&[0x00, 0x00, 0x13], 0x20).unwrap();
        computer.step().unwrap();
        computer.step().unwrap();
        computer.registers.pc = 0x08;

        computer.clock.advance(Duration::from_secs(1));
        computer.step().unwrap(); // interrupt + NOP
        assert_eq!(computer.registers.pc, 0x21);

        // Interrupts are latched off inside the handler
        computer.clock.advance(Duration::from_secs(3));
        computer.step().unwrap(); // NOP
        assert_eq!(computer.registers.pc, 0x22);
        assert_eq!(computer.registers.sp(), C::STACK_START - 8);

        computer.step().unwrap(); // IRET
        assert_eq!(computer.registers.pc, 0x08);
        assert_eq!(computer.registers.sp(), C::STACK_START);
        assert!(computer.interrupts_enabled());
    }
}
