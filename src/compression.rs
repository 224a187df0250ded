// compression.rs - The compression capability and its image-backed implementation

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};

use crate::config::{CompressionConfig, MAX_ITERATION, MAX_SIZE_BYTES};
use crate::error::CompressionError;
use crate::intake::SelectedFile;

/// Quality never drops below this during the size search.
const MIN_QUALITY: u8 = 10;

/// Options handed to a [`Compressor`] for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOptions {
    pub max_size_bytes: u64,
    pub initial_quality: f32,
    pub max_width_or_height: Option<u32>,
    pub max_iteration: u32,
    pub output: ImageFormat,
}

impl From<&CompressionConfig> for CompressionOptions {
    fn from(config: &CompressionConfig) -> Self {
        Self {
            max_size_bytes: MAX_SIZE_BYTES,
            initial_quality: config.quality(),
            max_width_or_height: config.max_width_or_height(),
            max_iteration: MAX_ITERATION,
            output: ImageFormat::Jpeg,
        }
    }
}

/// Re-encodes one file into a smaller payload.
///
/// Implementations are called for one file at a time and are never retried.
#[async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(
        &self,
        file: &SelectedFile,
        options: &CompressionOptions,
    ) -> Result<Bytes, CompressionError>;
}

/// Compressor built on the `image` crate.
///
/// Decoding and encoding run on tokio's blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCompressor;

impl ImageCompressor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Compressor for ImageCompressor {
    async fn compress(
        &self,
        file: &SelectedFile,
        options: &CompressionOptions,
    ) -> Result<Bytes, CompressionError> {
        let data = file.data().clone();
        let options = options.clone();
        tokio::task::spawn_blocking(move || compress_to_size(&data, &options)).await?
    }
}

fn compress_to_size(data: &[u8], options: &CompressionOptions) -> Result<Bytes, CompressionError> {
    let mut img = image::load_from_memory(data)?;

    if let Some(max) = options.max_width_or_height {
        if img.width() > max || img.height() > max {
            img = img.resize(max, max, image::imageops::FilterType::Lanczos3);
        }
    }
    // JPEG has no alpha channel.
    if options.output == ImageFormat::Jpeg {
        img = DynamicImage::ImageRgb8(img.to_rgb8());
    }

    let mut quality = quality_percent(options.initial_quality);
    let mut buffer = save_to_buffer(&img, options.output, quality)?;

    for iteration in 1..options.max_iteration {
        if buffer.len() as u64 <= options.max_size_bytes || quality <= MIN_QUALITY {
            break;
        }
        quality = quality.saturating_sub(quality / 5).max(MIN_QUALITY);
        log::debug!(
            "attempt {iteration}: {} bytes above ceiling, retrying at quality {quality}",
            buffer.len() as u64 - options.max_size_bytes
        );
        buffer = save_to_buffer(&img, options.output, quality)?;
    }

    Ok(Bytes::from(buffer))
}

fn quality_percent(fraction: f32) -> u8 {
    (fraction * 100.0).round().clamp(1.0, 100.0) as u8
}

fn save_to_buffer(
    img: &DynamicImage,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>, CompressionError> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
            img.write_with_encoder(encoder)?;
        }
        _ => {
            img.write_to(&mut buffer, format)?;
        }
    }

    Ok(buffer.into_inner())
}
