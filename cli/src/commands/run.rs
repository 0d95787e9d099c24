use std::process::exit;

use clap::Args;
use ls8_emulator::runtime::State;
use ls8_emulator::Computer;
use tracing::{debug, error, info};

use super::ProgramArgs;

#[derive(Args, Debug)]
pub struct RunOpt {
    #[clap(flatten)]
    program: ProgramArgs,

    /// Print the machine state on stderr before every instruction
    #[clap(short, long)]
    trace: bool,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let program = self.program.load();
        let start = self.program.address();

        let mut computer: Computer = Computer::default();
        if let Err(e) = computer.load(&program, start) {
            error!("Could not load program: {e}");
            exit(2);
        }
        computer.registers.pc = start;
        debug!(start, len = program.len(), "Program loaded");

        info!("Running program");
        if self.trace {
            while computer.state() != State::Halted {
                eprintln!("{}", computer.trace());
                computer.step()?;
            }
        } else {
            computer.run()?;
        }

        info!(cycles = computer.cycles, registers = %computer.registers, "End of program");

        Ok(())
    }
}
