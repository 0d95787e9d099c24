#![forbid(unsafe_code)]

use std::io::IsTerminal;
use std::process::exit;

use anstyle::AnsiColor;
use clap::builder::Styles;
use clap::{ArgAction, Parser};
use tracing::error;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

use crate::commands::Subcommand;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::Yellow.on_default().bold())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser)]
#[clap(version, about, styles = STYLES)]
struct Opt {
    /// Log more. `-v` turns on debug logs for the ls8 crates, `-vv` trace logs, `-vvvv` everything
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Always colour log lines
    #[clap(short = 'c', long, global = true, conflicts_with = "no_color")]
    color: bool,

    /// Never colour log lines. Without either flag, colour follows whether stderr is a terminal
    #[clap(short = 'C', long, global = true)]
    no_color: bool,

    /// Write log lines as JSON objects on stderr, one per event
    #[clap(short, long, global = true)]
    json: bool,

    #[clap(subcommand)]
    command: Subcommand,
}

impl Opt {
    const fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "ls8_emulator=debug,ls8_cli=debug,info",
            2 => "ls8_emulator=trace,ls8_cli=trace,info",
            3 => "ls8_emulator=trace,ls8_cli=trace,debug",
            4..=u8::MAX => "trace",
        }
    }

    fn should_use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            std::io::stderr().is_terminal()
        }
    }

    fn filter_layer(&self) -> EnvFilter {
        // RUST_LOG wins over -v
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_filter()))
    }
}

fn main() {
    let opt = Opt::parse();

    // stdout belongs to PRN/PRA, logs go to stderr
    let registry = tracing_subscriber::registry().with(opt.filter_layer());

    if opt.json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .without_time()
            .with_ansi(opt.should_use_colors())
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    }

    let res = opt.command.exec();
    if let Err(e) = res {
        error!("{:#}", e);
        exit(1);
    }
}
