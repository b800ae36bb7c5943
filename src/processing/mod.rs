//! Core image processing functionality

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::io::Reader as ImageReader;
use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ErrorContext, Result, SmallifyError};

pub mod formats;
pub mod resize;

pub use formats::*;
pub use resize::*;

/// A decoded source image waiting to be resized and written
pub struct ImageJob {
    pub image: DynamicImage,
    pub format: SourceFormat,
    pub target_dir: PathBuf,
    pub file_name: std::ffi::OsString,
}

/// Turns one open image file into one resized output file
pub struct ImageProcessor {
    bounds: ScaleBounds,
    suffix: String,
    resizer: ImageResizer,
}

impl ImageProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            bounds: config.scale,
            suffix: config.naming.suffix.clone(),
            resizer: ImageResizer::new(),
        }
    }

    /// Decode `file`, then write its resized copy into `target_dir`.
    ///
    /// `source` is the resolved path `file` was opened from; it supplies the
    /// output name and error context. The handle is only ever read.
    pub fn process_file(
        &self,
        file: File,
        source: &Path,
        target_dir: &Path,
    ) -> Result<ProcessedImage> {
        let job = self.decode(file, source, target_dir)?;
        let codec = OutputCodec::for_source(job.format, source)?;
        self.write(job, source, codec)
    }

    /// Sniff the format from the content and decode the pixel buffer
    pub fn decode(&self, file: File, source: &Path, target_dir: &Path) -> Result<ImageJob> {
        let file_name = source
            .file_name()
            .ok_or_else(|| {
                SmallifyError::io(
                    source,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?
            .to_os_string();

        let reader = ImageReader::new(BufReader::new(file))
            .with_guessed_format()
            .with_path(source)?;

        // Decoding fails with an unsupported-format error when nothing was sniffed
        let sniffed = reader.format();
        let image = reader.decode().map_err(|e| SmallifyError::decode(source, e))?;
        let sniffed = sniffed
            .ok_or_else(|| SmallifyError::unsupported_format("unknown", Some(source.to_path_buf())))?;
        let format = SourceFormat::from_sniffed(sniffed, source)?;

        debug!(
            "Decoded {:?} as {} ({}x{})",
            source,
            format,
            image.width(),
            image.height()
        );

        Ok(ImageJob {
            image,
            format,
            target_dir: target_dir.to_path_buf(),
            file_name,
        })
    }

    fn write(&self, job: ImageJob, source: &Path, codec: OutputCodec) -> Result<ProcessedImage> {
        let output_name = output_file_name(&job.file_name, &self.suffix, codec);
        let output_path = job.target_dir.join(output_name);

        let target = self.bounds.fit(job.image.width(), job.image.height())?;

        let output = File::create(&output_path).with_path(&output_path)?;
        debug!("Writing {:?} with {:?} codec", output_path, codec);

        let resized = self.resizer.resize(&job.image, target);

        if let Err(e) = encode(&resized, output, codec, &output_path) {
            // Leave nothing half-written behind
            if let Err(remove_err) = fs::remove_file(&output_path) {
                warn!(
                    "Failed to remove partial output {:?}: {}",
                    output_path, remove_err
                );
            }
            return Err(e);
        }

        info!(
            "{} -> {} ({}x{} -> {}x{})",
            source.display(),
            output_path.display(),
            job.image.width(),
            job.image.height(),
            target.width,
            target.height
        );

        Ok(ProcessedImage {
            source: source.to_path_buf(),
            output: output_path,
            format: job.format,
            codec,
            original: ScaleTarget {
                width: job.image.width(),
                height: job.image.height(),
            },
            resized: target,
        })
    }
}

fn encode(image: &DynamicImage, output: File, codec: OutputCodec, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(output);

    match codec {
        OutputCodec::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new(&mut writer))
                .map_err(|e| SmallifyError::encode(path, e))?;
        }
        OutputCodec::Png => {
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_with_encoder(PngEncoder::new(&mut writer))
                .map_err(|e| SmallifyError::encode(path, e))?;
        }
    }

    writer
        .flush()
        .map_err(|e| SmallifyError::encode(path, image::ImageError::IoError(e)))
}

/// Result of resizing one image
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: SourceFormat,
    pub codec: OutputCodec,
    pub original: ScaleTarget,
    pub resized: ScaleTarget,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn processor() -> ImageProcessor {
        ImageProcessor::new(&Config::default())
    }

    fn run(dir: &TempDir, name: &str) -> Result<ProcessedImage> {
        let source = dir.path().join(name);
        let file = File::open(&source).unwrap();
        processor().process_file(file, &source, dir.path())
    }

    fn sniff(path: &Path) -> Option<ImageFormat> {
        ImageReader::open(path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format()
    }

    fn entries(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_jpeg_landscape_end_to_end() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(1200, 800, Rgb([200, 40, 40]))
            .save_with_format(dir.path().join("photo.jpg"), ImageFormat::Jpeg)
            .unwrap();

        let result = run(&dir, "photo.jpg").unwrap();

        assert_eq!(result.output, dir.path().join("photo_small.jpg"));
        assert_eq!(result.format, SourceFormat::Jpeg);
        assert_eq!(result.codec, OutputCodec::Jpeg);
        assert_eq!(result.resized, ScaleTarget { width: 640, height: 426 });
        assert_eq!(image::image_dimensions(&result.output).unwrap(), (640, 426));
        assert_eq!(sniff(&result.output), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_bmp_becomes_png() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(300, 600, Rgb([0, 128, 255]))
            .save_with_format(dir.path().join("photo.bmp"), ImageFormat::Bmp)
            .unwrap();

        let result = run(&dir, "photo.bmp").unwrap();

        assert_eq!(result.output, dir.path().join("photo_small.png"));
        assert_eq!(result.codec, OutputCodec::Png);
        assert_eq!(image::image_dimensions(&result.output).unwrap(), (320, 640));
        assert_eq!(sniff(&result.output), Some(ImageFormat::Png));
    }

    #[test]
    fn test_tiff_becomes_png() {
        let dir = TempDir::new().unwrap();
        RgbaImage::from_pixel(64, 48, Rgba([10, 20, 30, 255]))
            .save_with_format(dir.path().join("scan.tif"), ImageFormat::Tiff)
            .unwrap();

        let result = run(&dir, "scan.tif").unwrap();

        assert_eq!(result.format, SourceFormat::Tiff);
        assert_eq!(result.output, dir.path().join("scan_small.png"));
        assert_eq!(image::image_dimensions(&result.output).unwrap(), (640, 480));
    }

    #[test]
    fn test_format_is_sniffed_not_taken_from_extension() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(40, 30, Rgb([1, 2, 3]))
            .save_with_format(dir.path().join("liar.jpg"), ImageFormat::Png)
            .unwrap();

        let result = run(&dir, "liar.jpg").unwrap();

        assert_eq!(result.format, SourceFormat::Png);
        assert_eq!(result.output, dir.path().join("liar_small.png"));
    }

    #[test]
    fn test_gif_is_rejected_without_output() {
        let dir = TempDir::new().unwrap();
        RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]))
            .save_with_format(dir.path().join("anim.gif"), ImageFormat::Gif)
            .unwrap();

        let err = run(&dir, "anim.gif").unwrap_err();

        assert!(matches!(err, SmallifyError::UnsupportedFormat { .. }));
        assert_eq!(entries(&dir), vec!["anim.gif".to_string()]);
    }

    #[test]
    fn test_empty_file_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("empty.png")).unwrap();

        let err = run(&dir, "empty.png").unwrap_err();

        assert!(matches!(err, SmallifyError::Decode { .. }));
        assert_eq!(entries(&dir), vec!["empty.png".to_string()]);
    }

    #[test]
    fn test_corrupt_png_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(b"definitely not an IHDR chunk");
        fs::write(dir.path().join("broken.png"), bytes).unwrap();

        let err = run(&dir, "broken.png").unwrap_err();

        assert!(matches!(err, SmallifyError::Decode { .. }));
        assert!(!dir.path().join("broken_small.png").exists());
    }

    #[test]
    fn test_missing_target_directory_fails_creation() {
        let dir = TempDir::new().unwrap();
        RgbImage::new(10, 10)
            .save_with_format(dir.path().join("a.png"), ImageFormat::Png)
            .unwrap();

        let source = dir.path().join("a.png");
        let file = File::open(&source).unwrap();
        let err = processor()
            .process_file(file, &source, &dir.path().join("nowhere"))
            .unwrap_err();

        assert!(matches!(err, SmallifyError::Io { .. }));
    }

    #[test]
    fn test_rerun_overwrites_previous_output() {
        let dir = TempDir::new().unwrap();
        RgbImage::new(100, 100)
            .save_with_format(dir.path().join("a.png"), ImageFormat::Png)
            .unwrap();

        run(&dir, "a.png").unwrap();
        run(&dir, "a.png").unwrap();

        assert_eq!(entries(&dir), vec!["a.png".to_string(), "a_small.png".to_string()]);
    }
}
