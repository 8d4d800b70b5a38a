//! target container sizing
//!
//! Works out how big the output container must be for a given byte count and
//! how many bytes have to be added or dropped to fill it exactly.

use crate::core::{ImageDescriptor, PaddingPolicy, PixelMode};
use thiserror::Error;

/// constraint on the image canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageConstraint {
    /// fixed width in pixels
    Width(u32),
    /// width / height
    Ratio(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("image width must be at least 1 pixel")]
    ZeroWidth,
    #[error("image ratio must be a positive finite number, got {0}")]
    InvalidRatio(f64),
    #[error("audio must have 1 or 2 channels, got {0}")]
    InvalidChannels(u8),
    #[error("{0} bytes do not fit in an image")]
    TooLarge(u64),
}

/// resolved image canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
    pub mode: PixelMode,
    /// capacity minus available bytes: > 0 pad, < 0 truncate
    pub surplus: i64,
}

impl ImageShape {
    pub fn byte_len(&self) -> u64 {
        self.descriptor().byte_len()
    }

    pub fn descriptor(&self) -> ImageDescriptor {
        ImageDescriptor::new(self.width, self.height, self.mode)
    }
}

/// resolved audio layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioShape {
    pub channels: u8,
    pub byte_len: u64,
    pub surplus: i64,
}

/// size an image canvas for `len` bytes
pub fn image_shape(
    len: u64,
    mode: PixelMode,
    constraint: ImageConstraint,
    policy: PaddingPolicy,
) -> Result<ImageShape, ShapeError> {
    let channels = mode.channels() as u64;

    let (width, mut height) = match constraint {
        ImageConstraint::Width(0) => return Err(ShapeError::ZeroWidth),
        ImageConstraint::Width(width) => {
            let width = width as u64;
            (width, len.div_ceil(width * channels))
        }
        ImageConstraint::Ratio(ratio) => {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(ShapeError::InvalidRatio(ratio));
            }
            let pixels = len.div_ceil(channels) as f64;
            let width = (pixels * ratio).sqrt().ceil();
            let height = (width / ratio).ceil();
            (width as u64, height as u64)
        }
    };

    let row = (width * channels) as i64;
    let mut surplus = (width * height * channels) as i64 - len as i64;
    if surplus > 0 && policy == PaddingPolicy::Truncate {
        height -= 1;
        surplus -= row;
    }

    let width = u32::try_from(width).map_err(|_| ShapeError::TooLarge(len))?;
    let height = u32::try_from(height).map_err(|_| ShapeError::TooLarge(len))?;

    Ok(ImageShape {
        width,
        height,
        mode,
        surplus,
    })
}

/// make `len` bytes divide evenly into `channels`
pub fn audio_shape(len: u64, channels: u8, policy: PaddingPolicy) -> Result<AudioShape, ShapeError> {
    if !(1..=2).contains(&channels) {
        return Err(ShapeError::InvalidChannels(channels));
    }

    let surplus = match len % channels as u64 {
        0 => 0,
        _ if policy == PaddingPolicy::Truncate => -1,
        _ => 1,
    };

    Ok(AudioShape {
        channels,
        byte_len: (len as i64 + surplus) as u64,
        surplus,
    })
}

/// copy `buffer` into a new one of exactly `target_len` bytes,
/// zero-padding or cutting from the end
pub fn fit(buffer: &[u8], target_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(target_len);
    out.extend_from_slice(&buffer[..buffer.len().min(target_len)]);
    out.resize(target_len, 0);
    out
}
