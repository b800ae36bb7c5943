//! smallify - batch image down-scaler
//!
//! Writes a resized copy of every image it is given and never touches the
//! originals. A file argument gets a sibling `<name>_small.<ext>`; a
//! directory argument gets a sibling `<name>_small/` holding the resized
//! copies of its direct entries.
//!
//! Output images fit within 640 pixels on their longer side and 480 on
//! their shorter side, keeping orientation and aspect ratio. JPEG input is
//! written as JPEG; PNG, BMP and TIFF input is written as PNG. GIF input is
//! decoded but rejected.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use smallify::{Config, Walker};
//!
//! let walker = Walker::new(&Config::default())?;
//! let report = walker.run(&["holiday.jpg", "scans"]);
//!
//! for image in &report.resized {
//!     println!("{} -> {}", image.source.display(), image.output.display());
//! }
//! # Ok::<(), smallify::SmallifyError>(())
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod parallel;
pub mod processing;

// Re-export commonly used types
pub use config::{Config, LogTarget};
pub use error::{Result, SmallifyError};
pub use parallel::{RunReport, Walker};
pub use processing::{ImageProcessor, ScaleBounds, ScaleTarget};

use tracing::{debug, info};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging from the configuration.
///
/// Installing a subscriber twice is harmless; only the first one wins.
pub fn init_with_config(config: &Config) -> Result<()> {
    config.validate()?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.as_str())
        .with_target(false);

    let installed = match config.logging.target {
        LogTarget::Stdout => builder.with_writer(std::io::stdout).try_init(),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
    };

    if installed.is_ok() {
        info!("smallify v{} initialized", VERSION);
    }

    log_capabilities();

    Ok(())
}

fn log_capabilities() {
    debug!("Image format support:");
    debug!("  JPEG: {}", image::ImageFormat::Jpeg.can_read());
    debug!("  PNG: {}", image::ImageFormat::Png.can_read());
    debug!("  BMP: {}", image::ImageFormat::Bmp.can_read());
    debug!("  TIFF: {}", image::ImageFormat::Tiff.can_read());
    debug!("  GIF: {}", image::ImageFormat::Gif.can_read());
}
