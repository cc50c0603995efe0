//! The machine the dispatcher runs on

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::communication::host::HostEnvironment;

/// Looks things up on the local system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl HostEnvironment for SystemHost {
    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn is_executable(&self, path: &Path) -> bool {
        path.is_absolute() && which::which(path).is_ok()
    }

    fn hostname(&self) -> String {
        match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                debug!("could not read hostname: {}", e);
                "localhost".to_string()
            }
        }
    }
}
