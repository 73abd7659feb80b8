use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use thumbmaster_core::CancelToken;
use tokio::task::JoinHandle;

/// Spinner shown while a long operation runs. Ctrl-C cancels the operation
/// instead of killing the process.
pub struct Busy {
    spinner: ProgressBar,
    watcher: JoinHandle<()>,
}

impl Busy {
    pub fn start(message: impl Into<String>, cancel: &CancelToken) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.into());
        spinner.enable_steady_tick(Duration::from_millis(100));

        let token = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });

        Self { spinner, watcher }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.spinner.set_message(message.into());
    }

    pub fn finish(self) {
        self.watcher.abort();
        self.spinner.finish_and_clear();
    }
}
