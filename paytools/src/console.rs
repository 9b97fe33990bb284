use indicatif::ProgressBar;
use pay_session::notify::Notifier;

/// Prints notifications to the terminal, above the progress spinner if one is running.
pub struct ConsoleNotifier {
    progress: ProgressBar,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self { progress: ProgressBar::hidden() }
    }

    /// The spinner shown while waiting on the push channel. Hidden until it is given a draw target.
    pub fn progress(&self) -> ProgressBar {
        self.progress.clone()
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        self.progress.suspend(|| println!("✅️ {message}"));
    }

    fn error(&self, message: &str) {
        self.progress.suspend(|| eprintln!("❌️ {message}"));
    }
}
