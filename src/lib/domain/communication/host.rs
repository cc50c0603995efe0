//! Host environment seam

use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::mock;

/// What the dispatcher needs to know about the machine it runs on
pub trait HostEnvironment: Send + Sync + 'static {
    /// Searches the executable lookup path for `program`.
    fn which(&self, program: &str) -> Option<PathBuf>;

    /// Whether `path` names an executable file.
    fn is_executable(&self, path: &Path) -> bool;

    /// The local hostname, used in attachment content-ids.
    fn hostname(&self) -> String;
}

#[cfg(test)]
mock! {
    pub HostEnvironment {}

    impl HostEnvironment for HostEnvironment {
        fn which(&self, program: &str) -> Option<PathBuf>;
        fn is_executable(&self, path: &Path) -> bool;
        fn hostname(&self) -> String;
    }
}
