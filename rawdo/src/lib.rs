//! rawdo - audio/image converter using a raw approach
//!
//! The samples of an audio file are written out as the pixels of an image,
//! and the pixels of an image as audio samples. Sizing, companding and
//! history live in `librawdo`; this crate adds the codecs, the conversion
//! pipeline and batch sessions.

pub mod audio;
pub mod convert;
pub mod picture;
pub mod session;

pub use convert::{
    detect_and_decode, ConversionReport, ConvertError, Converter, DecodedMedia, Stage,
};
pub use session::{fingerprint, unique_output_path, BatchReport, ItemOutcome, Session, SessionItem};

/// Re-export the core crate
pub use librawdo;
