//! Configuration for smallify
//!
//! Everything here is fixed at build time. The CLI only touches the logging
//! section; bounds, suffix and worker count keep their defaults.

use crate::error::{Result, SmallifyError};
use crate::processing::ScaleBounds;

/// Suffix inserted before the extension of every output name, and appended
/// to every output directory name
pub const APPEND_TAG: &str = "_small";

/// Worker threads executing image and directory tasks
pub const DEFAULT_WORKERS: usize = 3;

/// Main configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Output bounding box limits
    pub scale: ScaleBounds,

    /// Output naming
    pub naming: NamingConfig,

    /// Worker pool settings
    pub processing: ProcessingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct NamingConfig {
    pub suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            suffix: APPEND_TAG.to_string(),
        }
    }
}

impl NamingConfig {
    /// Output directory name for a source directory called `name`
    pub fn directory_name(&self, name: &std::ffi::OsStr) -> std::ffi::OsString {
        let mut out = name.to_os_string();
        out.push(&self.suffix);
        out
    }
}

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Upper bound on concurrently executing OS threads
    pub workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    pub target: LogTarget,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            target: LogTarget::Stdout,
        }
    }
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.scale.max_larger == 0 || self.scale.max_smaller == 0 {
            return Err(SmallifyError::config(format!(
                "Scale bounds must be greater than 0 (got {}x{})",
                self.scale.max_larger, self.scale.max_smaller
            )));
        }

        if self.processing.workers == 0 {
            return Err(SmallifyError::config("Worker count must be greater than 0"));
        }

        if self.naming.suffix.is_empty() {
            return Err(SmallifyError::config(
                "Output suffix must not be empty, outputs would overwrite their sources",
            ));
        }

        Ok(())
    }
}
