use std::process::ExitCode;

use razloc::RestoreConfig;
use razloc_std::error::prelude::*;

use crate::args::RestoreArgs;

/// Runs `razloc restore`.
pub fn restore_main(args: RestoreArgs) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("get current dir")?;
    let config = RestoreConfig::resolve(args.project, args.force, args.common.dry_run, &cwd)?;

    let report = razloc::restore(&config.project_dir, config.force, config.dry_run)?;
    log::info!(
        "restored {} files from {}",
        report.restored.len(),
        report.archive.display()
    );
    if !report.skipped.is_empty() {
        log::warn!(
            "{} files changed after the backup were kept, use --force to overwrite them",
            report.skipped.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}
