use clap::Args;
use ls8_emulator::disasm::disassemble;
use tracing::debug;

use super::ProgramArgs;

#[derive(Args, Debug)]
pub struct DisasmOpt {
    #[clap(flatten)]
    program: ProgramArgs,
}

impl DisasmOpt {
    pub fn exec(&self) -> anyhow::Result<()> {
        let program = self.program.load();

        debug!("Decoding program");
        for line in disassemble(&program, self.program.address())? {
            println!("{line}");
        }

        Ok(())
    }
}
