//! One conversion, start to finish
//!
//! `Loaded → ParametersConsolidated → Companded → Shaped → Encoded → Recorded`
//!
//! Each stage runs once; a failure ends the conversion with a [`ConvertError`]
//! and leaves retrying to the caller.

use crate::audio::{self, DecodedAudio};
use crate::picture::{self, DecodedImage};
use librawdo::{
    audio_shape, companding, consolidate, fit, image_shape, AudioShape, ConversionParams,
    Direction, HistoryBackend, HistoryStore, ImageShape, MediaDescriptor, PixelMode,
    ResolvedParams, ShapeError, SourceQuery,
};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown input format for {}", path.display())]
    UnrecognizedInputFormat {
        path: PathBuf,
        /// why the audio decoder refused it
        audio: String,
        /// why the image decoder refused it
        image: String,
    },
    #[error("failed to write {}: {reason}", path.display())]
    OutputEncodeFailure { path: PathBuf, reason: String },
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("{} changed on disk since it was added", path.display())]
    StaleSourceItem { path: PathBuf },
}

impl ConvertError {
    /// the stage that failed
    pub fn stage(&self) -> Stage {
        match self {
            ConvertError::Io { .. }
            | ConvertError::UnrecognizedInputFormat { .. }
            | ConvertError::StaleSourceItem { .. } => Stage::Loaded,
            ConvertError::Shape(_) => Stage::Shaped,
            ConvertError::OutputEncodeFailure { .. } => Stage::Encoded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loaded,
    ParametersConsolidated,
    Companded,
    Shaped,
    Encoded,
    Recorded,
}

/// A decoded input, whichever kind it turned out to be
#[derive(Debug, Clone)]
pub enum DecodedMedia {
    Audio(DecodedAudio),
    Image(DecodedImage),
}

impl DecodedMedia {
    pub fn descriptor(&self) -> MediaDescriptor {
        match self {
            DecodedMedia::Audio(a) => a.descriptor.into(),
            DecodedMedia::Image(i) => i.descriptor.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            DecodedMedia::Audio(a) => &a.data,
            DecodedMedia::Image(i) => &i.data,
        }
    }

    /// audio becomes an image and vice versa
    pub fn direction(&self) -> Direction {
        match self {
            DecodedMedia::Audio(_) => Direction::AudioToImage,
            DecodedMedia::Image(_) => Direction::ImageToAudio,
        }
    }
}

/// Decode `path` as audio, or failing that as an image.
///
/// Audio goes first, except for files that open with an image signature: the
/// mp3 and aac probes resync on any `0xFFF` run, which compressed pixel data
/// is full of.
pub fn detect_and_decode(path: &Path) -> Result<DecodedMedia, ConvertError> {
    if !path.is_file() {
        return Err(ConvertError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }

    let image_first = has_image_signature(path);
    if image_first {
        debug!("{} has an image signature", path.display());
        if let Ok(decoded) = picture::read_image_file(path) {
            return Ok(DecodedMedia::Image(decoded));
        }
    }

    let audio_err = match audio::read_audio_file(path) {
        Ok(decoded) => return Ok(DecodedMedia::Audio(decoded)),
        Err(e) => e,
    };
    debug!("{} is not audio: {:#}", path.display(), audio_err);

    match picture::read_image_file(path) {
        Ok(decoded) => Ok(DecodedMedia::Image(decoded)),
        Err(image_err) => Err(ConvertError::UnrecognizedInputFormat {
            path: path.to_path_buf(),
            audio: format!("{:#}", audio_err),
            image: format!("{:#}", image_err),
        }),
    }
}

fn has_image_signature(path: &Path) -> bool {
    let mut head = [0u8; 32];
    let read = File::open(path)
        .and_then(|mut file| file.read(&mut head))
        .unwrap_or(0);
    image::guess_format(&head[..read]).is_ok()
}

/// What a finished conversion did
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub direction: Direction,
    pub source: MediaDescriptor,
    pub target: MediaDescriptor,
    pub params: ResolvedParams,
    /// bytes added (> 0) or dropped (< 0) to fill the target
    pub surplus: i64,
    /// an RGBA image had to be written as RGB
    pub rgb_fallback: bool,
    /// the history record was saved
    pub recorded: bool,
}

/// Runs conversions against one history store
pub struct Converter<B: HistoryBackend> {
    history: HistoryStore<B>,
}

impl<B: HistoryBackend> Converter<B> {
    pub fn new(history: HistoryStore<B>) -> Self {
        Converter { history }
    }

    pub fn history(&self) -> &HistoryStore<B> {
        &self.history
    }

    /// Convert the file at `input` into `output`
    pub fn convert(
        &mut self,
        input: &Path,
        output: &Path,
        params: &ConversionParams,
    ) -> Result<ConversionReport, ConvertError> {
        let media = detect_and_decode(input)?;
        self.convert_media(&media, output, params)
    }

    /// Convert already decoded media into `output`
    pub fn convert_media(
        &mut self,
        media: &DecodedMedia,
        output: &Path,
        params: &ConversionParams,
    ) -> Result<ConversionReport, ConvertError> {
        let source = media.descriptor();
        let direction = media.direction();
        let len = media.data().len() as u64;
        debug!(stage = ?Stage::Loaded, %direction, len, "loaded");

        let matched = if params.ignore_history {
            None
        } else {
            self.history
                .lookup(len, &SourceQuery::from_descriptor(&source), direction)
        };
        let resolved = consolidate(params, direction, matched.as_ref());
        debug!(stage = ?Stage::ParametersConsolidated, ?resolved, "parameters");

        let companded = companding::apply(media.data(), resolved.companding);
        debug!(stage = ?Stage::Companded, method = %resolved.companding, "companded");

        let shaped = Shaped::resolve(direction, len, &resolved)?;
        let buffer = fit(&companded, shaped.byte_len() as usize);
        debug!(stage = ?Stage::Shaped, surplus = shaped.surplus(), "shaped");

        let (target, rgb_fallback) = encode(output, &buffer, &shaped, &resolved)?;
        debug!(stage = ?Stage::Encoded, output = %output.display(), "encoded");

        let recorded = match self
            .history
            .record(&source, &target, direction, resolved.companding)
        {
            Ok(_) => true,
            Err(e) => {
                warn!("conversion not recorded in history: {}", e);
                false
            }
        };
        debug!(stage = ?Stage::Recorded, recorded, "recorded");

        info!(
            "{} bytes {} ({}), surplus {}",
            len,
            direction,
            resolved.companding,
            shaped.surplus()
        );

        Ok(ConversionReport {
            direction,
            source,
            target,
            params: resolved,
            surplus: shaped.surplus(),
            rgb_fallback,
            recorded,
        })
    }
}

/// Output container sized for the input
enum Shaped {
    Audio(AudioShape),
    Image(ImageShape),
}

impl Shaped {
    fn resolve(direction: Direction, len: u64, params: &ResolvedParams) -> Result<Self, ShapeError> {
        Ok(match direction {
            Direction::ImageToAudio => {
                Shaped::Audio(audio_shape(len, params.channels, params.policy)?)
            }
            Direction::AudioToImage => Shaped::Image(image_shape(
                len,
                params.mode,
                params.shape,
                params.policy,
            )?),
        })
    }

    fn byte_len(&self) -> u64 {
        match self {
            Shaped::Audio(a) => a.byte_len,
            Shaped::Image(i) => i.byte_len(),
        }
    }

    fn surplus(&self) -> i64 {
        match self {
            Shaped::Audio(a) => a.surplus,
            Shaped::Image(i) => i.surplus,
        }
    }
}

fn encode(
    output: &Path,
    buffer: &[u8],
    shaped: &Shaped,
    params: &ResolvedParams,
) -> Result<(MediaDescriptor, bool), ConvertError> {
    let failure = |e: anyhow::Error| ConvertError::OutputEncodeFailure {
        path: output.to_path_buf(),
        reason: format!("{:#}", e),
    };

    match shaped {
        Shaped::Audio(shape) => {
            let target = audio::write_audio_file(output, buffer, params.sample_rate, shape.channels)
                .map_err(failure)?;
            Ok((target.into(), false))
        }
        Shaped::Image(shape) => {
            match picture::write_image_file(output, buffer, shape.width, shape.height, shape.mode)
            {
                Ok(target) => Ok((target.into(), false)),
                Err(e) if shape.mode.has_alpha() => {
                    warn!("{:#}; retrying without alpha", e);
                    let rgb = picture::drop_alpha(buffer);
                    let target = picture::write_image_file(
                        output,
                        &rgb,
                        shape.width,
                        shape.height,
                        PixelMode::Rgb,
                    )
                    .map_err(failure)?;
                    Ok((target.into(), true))
                }
                Err(e) => Err(failure(e)),
            }
        }
    }
}
