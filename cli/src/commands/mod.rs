use std::process::exit;

use camino::Utf8PathBuf;
use clap::{Args, ValueHint};
use ls8_emulator::constants as C;
use ls8_emulator::loader::DEMO_PROGRAM;
use ls8_emulator::{from_image, parse_listing};
use miette::{IntoDiagnostic, NamedSource, WrapErr};
use tracing::info;

mod completion;
mod disasm;
mod run;

#[derive(clap::Subcommand)]
pub enum Subcommand {
    /// Load and run a program
    Run(self::run::RunOpt),

    /// Print the decoded instructions of a program
    Disasm(self::disasm::DisasmOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Self::Run(opt) => opt.exec(),
            Self::Disasm(opt) => opt.exec(),
            Self::Completion(opt) => opt.exec(),
        }
    }
}

/// Parse an address, either decimal or hexadecimal prefixed by `0x`
fn parse_address(input: &str) -> Result<C::Address, std::num::ParseIntError> {
    match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => C::Address::from_str_radix(hex, 16),
        None => input.parse(),
    }
}

/// Where to find the program and where to put it
#[derive(Args, Debug)]
pub struct ProgramArgs {
    /// Program listing, one binary byte per line. Runs the print8 demo when missing
    #[clap(value_hint = ValueHint::FilePath)]
    input: Option<Utf8PathBuf>,

    /// Read the input as a raw binary image instead of a listing
    #[clap(short, long)]
    binary: bool,

    /// Memory address where the program is loaded
    #[clap(short, long, default_value_t = C::PROGRAM_START, value_parser = parse_address)]
    address: C::Address,
}

impl ProgramArgs {
    /// Read the program bytes. Exits with status 2 if they can not be loaded.
    pub fn load(&self) -> Vec<C::Word> {
        match self.try_load() {
            Ok(program) => program,
            Err(report) => {
                eprintln!("{report:?}");
                exit(2);
            }
        }
    }

    fn try_load(&self) -> miette::Result<Vec<C::Word>> {
        let Some(input) = &self.input else {
            info!("No program given, running the print8 demo");
            return Ok(DEMO_PROGRAM.to_vec());
        };

        info!(path = %input, binary = self.binary, "Reading program");
        if self.binary {
            let image = std::fs::read(input)
                .into_diagnostic()
                .wrap_err_with(|| format!("could not read {input}"))?;
            return Ok(from_image(image)?);
        }

        let source = std::fs::read_to_string(input)
            .into_diagnostic()
            .wrap_err_with(|| format!("could not read {input}"))?;
        match parse_listing(&source) {
            Ok(program) => Ok(program),
            Err(e) => {
                Err(miette::Report::new(e).with_source_code(NamedSource::new(input, source)))
            }
        }
    }

    pub const fn address(&self) -> C::Address {
        self.address
    }
}
