//! OS directory resolution for config and log files.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while resolving or creating directories.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("could not determine OS configuration directory")]
    NoConfigDir,

    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Where quadmesh keeps its files.
///
/// Follows OS conventions (XDG on Linux, Known Folders on Windows, Library on
/// macOS) unless a root is given explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Holds `quadmesh.log` in debug builds.
    pub log_dir: PathBuf,
}

const APP_NAME: &str = "quadmesh";

impl PlatformDirs {
    /// Resolve platform-specific directories without creating them on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NoConfigDir`] if the OS does not expose a
    /// configuration directory.
    pub fn resolve() -> Result<Self, PlatformError> {
        let config_base = dirs::config_dir().ok_or(PlatformError::NoConfigDir)?;
        let app_dir = config_base.join(APP_NAME);
        let log_dir = dirs::cache_dir()
            .map(|cache| cache.join(APP_NAME).join("logs"))
            .unwrap_or_else(|| app_dir.join("logs"));
        Ok(Self {
            config_dir: app_dir,
            log_dir,
        })
    }

    /// Keep config and logs together under `root`, as when `--config` is given.
    pub fn resolve_with_root(root: &Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            log_dir: root.join("logs"),
        }
    }

    /// Create all directories on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Io`] if any directory cannot be created.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}
