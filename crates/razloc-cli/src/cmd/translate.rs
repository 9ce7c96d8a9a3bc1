use std::process::ExitCode;

use razloc::config::{SettingsFile, TranslateOptions};
use razloc::{CancelToken, TranslateConfig, TranslateService};
use razloc_std::error::prelude::*;

use crate::args::TranslateArgs;
use crate::utils::{Runtimes, exit_code};

/// Runs `razloc translate`.
pub fn translate_main(
    args: TranslateArgs,
    runtimes: &Runtimes,
    cancel: &CancelToken,
) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("get current dir")?;
    let settings = SettingsFile::discover(args.common.config.as_deref(), &cwd)?;
    let options = TranslateOptions::from(&args).or(settings.translate);
    let config = TranslateConfig::resolve(options, &cwd)?;

    let service = TranslateService::mymemory(config);
    let report = runtimes.block_on(service.run(cancel))?;
    for path in &report.written {
        log::info!("wrote {}", path.display());
    }
    if report.aborted {
        log::error!("translation aborted after {} failed calls", report.failures);
    }
    Ok(exit_code(report.is_success(), report.cancelled))
}
