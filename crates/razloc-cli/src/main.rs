#![doc = include_str!("../README.md")]

mod args;
mod utils;
mod cmd {
    pub mod localize;
    pub mod restore;
    pub mod translate;
}

use std::process::ExitCode;

use clap::Parser;
use razloc_std::error::prelude::*;

use crate::args::{CliArguments, Commands};
use crate::cmd::localize::localize_main;
use crate::cmd::restore::restore_main;
use crate::cmd::translate::translate_main;
use crate::utils::Runtimes;

/// The main entry point.
fn main() -> ExitCode {
    // Parses command line arguments
    let args = CliArguments::parse();

    // Starts logging, `RUST_LOG` takes precedence
    let _ = {
        let level = args.command.common().verbosity.level();
        let mut builder = env_logger::Builder::new();
        builder.filter_level(log::LevelFilter::Warn.min(level));
        // Also matches every `razloc_*` crate.
        builder.filter_module("razloc", level);
        builder.parse_default_env().try_init()
    };

    match run(args.command) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    let runtimes = Runtimes::new()?;
    let cancel = runtimes.cancel_on_ctrl_c();

    match command {
        Commands::Localize(args) => localize_main(args, &cancel),
        Commands::Translate(args) => translate_main(args, &runtimes, &cancel),
        Commands::Restore(args) => restore_main(args),
    }
}
