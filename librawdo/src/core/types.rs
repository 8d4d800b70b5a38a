//! common types for raw conversions

use serde::{Deserialize, Serialize};
use std::fmt;

// constants

/// sample rates an audio target may use
pub const SUPPORTED_SAMPLE_RATES: [u32; 2] = [44100, 48000];

/// bytes per sample of every produced audio file
pub const OUTPUT_SAMPLE_WIDTH: u8 = 1;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_CHANNELS: u8 = 2;
/// width / height
pub const DEFAULT_RATIO: f64 = 3.0 / 2.0;

// types

/// pixel layout of an image buffer
///
/// | Mode      | Channels | Persisted |
/// |-----------|----------|-----------|
/// | Greyscale | 1        | `L`       |
/// | Rgb       | 3        | `RGB`     |
/// | Rgba      | 4        | `RGBA`    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PixelMode {
    #[serde(rename = "L")]
    Greyscale,
    #[default]
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "RGBA")]
    Rgba,
}

impl PixelMode {
    /// bytes per pixel
    pub fn channels(self) -> u8 {
        match self {
            PixelMode::Greyscale => 1,
            PixelMode::Rgb => 3,
            PixelMode::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == PixelMode::Rgba
    }
}

impl fmt::Display for PixelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelMode::Greyscale => "L",
            PixelMode::Rgb => "RGB",
            PixelMode::Rgba => "RGBA",
        };
        f.write_str(name)
    }
}

/// which way a conversion goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ImageToAudio,
    AudioToImage,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::ImageToAudio => Direction::AudioToImage,
            Direction::AudioToImage => Direction::ImageToAudio,
        }
    }

    /// persisted as `from_image`
    pub fn from_image(self) -> bool {
        self == Direction::ImageToAudio
    }

    pub fn from_flag(from_image: bool) -> Self {
        if from_image {
            Direction::ImageToAudio
        } else {
            Direction::AudioToImage
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ImageToAudio => f.write_str("image → audio"),
            Direction::AudioToImage => f.write_str("audio → image"),
        }
    }
}

/// per-byte companding applied before shaping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Companding {
    #[default]
    Linear,
    ULaw,
    ALaw,
    InverseULaw,
    InverseALaw,
}

impl Companding {
    /// the method that undoes this one
    pub fn inverse(self) -> Self {
        match self {
            Companding::Linear => Companding::Linear,
            Companding::ULaw => Companding::InverseULaw,
            Companding::ALaw => Companding::InverseALaw,
            Companding::InverseULaw => Companding::ULaw,
            Companding::InverseALaw => Companding::ALaw,
        }
    }
}

impl fmt::Display for Companding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Companding::Linear => "linear",
            Companding::ULaw => "u-law",
            Companding::ALaw => "a-law",
            Companding::InverseULaw => "inverse u-law",
            Companding::InverseALaw => "inverse a-law",
        };
        f.write_str(name)
    }
}

/// what to do with bytes that do not fill the target container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaddingPolicy {
    /// append zero bytes
    #[default]
    Pad,
    /// drop trailing bytes
    Truncate,
}

// descriptors

/// shape of an image buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    pub mode: PixelMode,
}

impl ImageDescriptor {
    pub fn new(width: u32, height: u32, mode: PixelMode) -> Self {
        ImageDescriptor {
            width,
            height,
            mode,
        }
    }

    /// width × height × channels
    pub fn byte_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.mode.channels() as u64
    }
}

/// shape of an audio buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioDescriptor {
    pub sample_rate: u32,
    pub channels: u8,
    /// bytes per sample
    pub sample_width: u8,
    /// samples per channel
    pub frames: u64,
}

impl AudioDescriptor {
    /// descriptor for a produced 8-bit buffer of `byte_len` bytes
    pub fn from_byte_len(sample_rate: u32, channels: u8, byte_len: u64) -> Self {
        let channels = channels.max(1);
        AudioDescriptor {
            sample_rate,
            channels,
            sample_width: OUTPUT_SAMPLE_WIDTH,
            frames: byte_len / channels as u64,
        }
    }

    /// frames × channels × sample width
    pub fn byte_len(&self) -> u64 {
        self.frames * self.channels as u64 * self.sample_width as u64
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

/// either side of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDescriptor {
    Image(ImageDescriptor),
    Audio(AudioDescriptor),
}

impl MediaDescriptor {
    pub fn byte_len(&self) -> u64 {
        match self {
            MediaDescriptor::Image(image) => image.byte_len(),
            MediaDescriptor::Audio(audio) => audio.byte_len(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, MediaDescriptor::Image(_))
    }
}

impl From<ImageDescriptor> for MediaDescriptor {
    fn from(d: ImageDescriptor) -> Self {
        MediaDescriptor::Image(d)
    }
}

impl From<AudioDescriptor> for MediaDescriptor {
    fn from(d: AudioDescriptor) -> Self {
        MediaDescriptor::Audio(d)
    }
}
