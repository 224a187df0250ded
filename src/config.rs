// config.rs - Compression settings and fixed workflow constants

use std::time::Duration;

use crate::error::{Error, Result};

/// Size ceiling handed to the compressor for every file.
pub const MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Upper bound on the compressor's own quality search.
pub const MAX_ITERATION: u32 = 10;

/// Quality used when the quality field is not a number.
pub const DEFAULT_QUALITY_PERCENT: u8 = 80;

/// Dimensions used when the dimension fields are not numbers.
pub const DEFAULT_DIMENSIONS: (u32, u32) = (1920, 1080);

/// Quiet time after the last dropped file before a drop gesture is taken as a batch.
pub const DROP_SETTLE: Duration = Duration::from_millis(50);

/// Delay between successive saves of a bulk download.
pub const DOWNLOAD_STAGGER: Duration = Duration::from_millis(300);

/// Immutable configuration of one compression run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionConfig {
    quality: f32,
    max_width_or_height: Option<u32>,
}

impl CompressionConfig {
    /// `quality` is a fraction in `(0.0, 1.0]`; a dimension bound must be positive.
    pub fn new(quality: f32, max_width_or_height: Option<u32>) -> Result<Self> {
        if !(quality > 0.0 && quality <= 1.0) {
            return Err(Error::InvalidConfig {
                field: "quality",
                reason: format!("{quality} is outside (0, 1]"),
            });
        }
        if max_width_or_height == Some(0) {
            return Err(Error::InvalidConfig {
                field: "max dimension",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            quality,
            max_width_or_height,
        })
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn max_width_or_height(&self) -> Option<u32> {
        self.max_width_or_height
    }
}

/// Panel inputs exactly as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSettings {
    pub quality_percent: String,
    pub limit_dimensions: bool,
    pub max_width: String,
    pub max_height: String,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            quality_percent: DEFAULT_QUALITY_PERCENT.to_string(),
            limit_dimensions: false,
            max_width: DEFAULT_DIMENSIONS.0.to_string(),
            max_height: DEFAULT_DIMENSIONS.1.to_string(),
        }
    }
}

impl RawSettings {
    /// Derives the run configuration.
    ///
    /// Text that is not a number falls back to the defaults; numbers outside
    /// the accepted range are an [`Error::InvalidConfig`].
    pub fn to_config(&self) -> Result<CompressionConfig> {
        let percent = parse_or_default("quality", &self.quality_percent, DEFAULT_QUALITY_PERCENT.into());
        if !(1..=100).contains(&percent) {
            return Err(Error::InvalidConfig {
                field: "quality",
                reason: format!("{percent}% is outside 1..=100"),
            });
        }

        let bound = if self.limit_dimensions {
            let width = parse_or_default("max width", &self.max_width, DEFAULT_DIMENSIONS.0.into());
            let height = parse_or_default("max height", &self.max_height, DEFAULT_DIMENSIONS.1.into());
            let longest = width.max(height);
            Some(u32::try_from(longest).map_err(|_| Error::InvalidConfig {
                field: "max dimension",
                reason: format!("{longest} is too large"),
            })?)
        } else {
            None
        };

        CompressionConfig::new(percent as f32 / 100.0, bound)
    }
}

fn parse_or_default(field: &str, raw: &str, default: u64) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            log::warn!("{field} {raw:?} is not a number, using {default}");
            default
        }
    }
}
