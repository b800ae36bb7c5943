//! Source format detection results, codec mapping and output naming

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, SmallifyError};

/// Formats the decoder is built to recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    Bmp,
    Tiff,
    Gif,
}

impl SourceFormat {
    /// Map a format sniffed by the `image` crate. Anything outside the
    /// supported set is reported as unsupported.
    pub fn from_sniffed(format: image::ImageFormat, file: &Path) -> Result<Self> {
        match format {
            image::ImageFormat::Jpeg => Ok(Self::Jpeg),
            image::ImageFormat::Png => Ok(Self::Png),
            image::ImageFormat::Bmp => Ok(Self::Bmp),
            image::ImageFormat::Tiff => Ok(Self::Tiff),
            image::ImageFormat::Gif => Ok(Self::Gif),
            other => Err(SmallifyError::unsupported_format(
                format!("{other:?}").to_lowercase(),
                Some(file.to_path_buf()),
            )),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoders an output image can be written with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCodec {
    Jpeg,
    Png,
}

impl OutputCodec {
    /// JPEG stays JPEG, lossless sources become PNG, GIF has no mapping
    pub fn for_source(format: SourceFormat, file: &Path) -> Result<Self> {
        match format {
            SourceFormat::Jpeg => Ok(Self::Jpeg),
            SourceFormat::Png | SourceFormat::Bmp | SourceFormat::Tiff => Ok(Self::Png),
            SourceFormat::Gif => Err(SmallifyError::unsupported_format(
                format.name(),
                Some(file.to_path_buf()),
            )),
        }
    }

    /// Get file extension for this codec
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Derive the output file name: the original stem, then `suffix`, then the
/// codec's extension. `photo.bmp` becomes `photo_small.png`.
/// Non-UTF-8 stems are carried over byte for byte.
pub fn output_file_name(original: &OsStr, suffix: &str, codec: OutputCodec) -> OsString {
    let mut name = Path::new(original)
        .file_stem()
        .unwrap_or(original)
        .to_os_string();
    name.push(suffix);
    name.push(".");
    name.push(codec.extension());
    name
}
