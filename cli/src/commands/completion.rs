use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::Opt;

#[derive(Args, Debug)]
pub struct CompletionOpt {
    /// Shell to generate completions for
    #[clap(value_enum)]
    shell: Shell,
}

impl CompletionOpt {
    pub fn exec(&self) -> anyhow::Result<()> {
        let mut command = Opt::command();
        let name = command.get_name().to_string();
        generate(self.shell, &mut command, name, &mut std::io::stdout());
        Ok(())
    }
}
