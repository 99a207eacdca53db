use std::path::{Path, PathBuf};

/// Asks the user for files. `None` means the user dismissed the prompt.
#[cfg_attr(test, mockall::automock)]
pub trait FilePrompt {
    /// Asks where to save, suggesting `suggested`.
    fn pick_save_target(&mut self, suggested: &Path) -> Option<PathBuf>;

    /// Asks for an existing file to load.
    fn pick_open_target(&mut self) -> Option<PathBuf>;
}

/// Messages meant for the user, as opposed to the log.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn info(&mut self, message: &str);

    fn error(&mut self, message: &str);
}
