use std::path::{Path, PathBuf};
use std::process::ExitCode;

use razloc::CancelToken;
use razloc_std::error::prelude::*;

/// The exit code of a cancelled command.
const INTERRUPTED: u8 = 130;

/// The runtimes used by the application.
pub struct Runtimes {
    /// The tokio runtime.
    pub tokio_runtime: tokio::runtime::Runtime,
}

impl Runtimes {
    pub fn new() -> Result<Self> {
        let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("start runtime")?;

        Ok(Self { tokio_runtime })
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.tokio_runtime.block_on(future)
    }

    /// Cancels the returned token on Ctrl-C.
    ///
    /// Repeated presses only log: the command still persists its progress
    /// and finalizes the backup before the process exits.
    pub fn cancel_on_ctrl_c(&self) -> CancelToken {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        self.tokio_runtime
            .spawn(forward_interrupts(token, tokio::signal::ctrl_c));
        cancel
    }
}

/// Cancels `token` on every signal `next` yields, until listening fails.
/// Returns the number of signals received.
async fn forward_interrupts<F, Fut>(token: CancelToken, mut next: F) -> usize
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    let mut received = 0;
    while next().await.is_ok() {
        received += 1;
        if received == 1 {
            log::warn!("Ctrl-C received, finishing up");
        } else {
            log::warn!("Ctrl-C received again, still saving progress and closing the backup");
        }
        token.cancel();
    }
    received
}

/// The directory a settings file is looked up in: the project directory if
/// one is given, otherwise `cwd`.
pub fn settings_dir(project: Option<&Path>, cwd: &Path) -> PathBuf {
    match project.map(|p| cwd.join(p)) {
        Some(path) if path.is_file() => path.parent().unwrap_or(cwd).to_owned(),
        Some(path) => path,
        None => cwd.to_owned(),
    }
}

/// The exit code of a finished command.
pub fn exit_code(success: bool, cancelled: bool) -> ExitCode {
    if cancelled {
        ExitCode::from(INTERRUPTED)
    } else if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
