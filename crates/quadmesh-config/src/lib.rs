//! Configuration for quadmesh tools.
//!
//! Settings persist to disk as `config.ron` and can be overridden from the
//! command line. Missing sections and fields fall back to defaults, so older
//! and newer files both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CameraConfig, Config, DebugConfig, LodConfig, PatchConfig, SurfaceConfig};
pub use error::ConfigError;
