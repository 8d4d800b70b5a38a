//! librawdo - byte accounting for raw audio/image reinterpretation
//!
//! The bytes of a decoded audio file become the pixels of an image and the
//! pixels of an image become audio samples. Nothing is transcoded: this crate
//! decides the shape of the container on the other side, what happens to the
//! bytes that do not fit, and remembers past conversions so a round trip gets
//! its original shape back.

pub mod companding;
pub mod core;
pub mod history;
pub mod params;
pub mod shape;

pub use crate::core::{
    AudioDescriptor, Companding, Direction, ImageDescriptor, MediaDescriptor, PaddingPolicy,
    PixelMode, DEFAULT_CHANNELS, DEFAULT_RATIO, DEFAULT_SAMPLE_RATE, OUTPUT_SAMPLE_WIDTH,
    SUPPORTED_SAMPLE_RATES,
};
pub use history::{
    ConversionRecord, HistoryBackend, HistoryError, HistoryLog, HistoryStore, JsonFileBackend,
    MemoryBackend, SourceQuery,
};
pub use params::{consolidate, ConversionParams, ResolvedParams};
pub use shape::{audio_shape, fit, image_shape, AudioShape, ImageConstraint, ImageShape, ShapeError};
