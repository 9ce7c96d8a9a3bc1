use std::process::ExitCode;

use razloc::config::{LocalizeOptions, SettingsFile};
use razloc::{CancelToken, LocalizeConfig};
use razloc_std::error::prelude::*;

use crate::args::LocalizeArgs;
use crate::utils::{exit_code, settings_dir};

/// Runs `razloc localize`.
pub fn localize_main(args: LocalizeArgs, cancel: &CancelToken) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("get current dir")?;
    let settings = SettingsFile::discover(
        args.common.config.as_deref(),
        &settings_dir(args.project.as_deref(), &cwd),
    )?;
    let options = LocalizeOptions::from(&args).or(settings.localize);
    let config = LocalizeConfig::resolve(options, &cwd)?;
    log::info!("localizing {}", config.project_file.display());

    let report = razloc::localize(&config, cancel)?;
    if let Some(archive) = &report.archive {
        log::info!("backup written to {}", archive.display());
    }
    if !report.failed.is_empty() {
        log::error!("{} files could not be localized", report.failed.len());
    }
    Ok(exit_code(report.is_success(), report.cancelled))
}
