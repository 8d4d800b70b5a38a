//! Conversion parameters
//!
//! User input leaves most parameters unset. [`consolidate`] fills each one from,
//! in order: the explicit value, the matching history record, the default.

use crate::core::{
    Companding, Direction, PaddingPolicy, PixelMode, DEFAULT_CHANNELS, DEFAULT_RATIO,
    DEFAULT_SAMPLE_RATE, SUPPORTED_SAMPLE_RATES,
};
use crate::history::ConversionRecord;
use crate::shape::ImageConstraint;
use tracing::debug;

/// parameters as the user gave them
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionParams {
    /// audio target sample rate
    pub sample_rate: Option<u32>,
    /// audio target channels
    pub channels: Option<u8>,
    /// image target width or ratio
    pub shape: Option<ImageConstraint>,
    /// image target pixel mode
    pub mode: Option<PixelMode>,
    pub policy: Option<PaddingPolicy>,
    pub companding: Option<Companding>,
    /// never infer from history
    pub ignore_history: bool,
}

impl ConversionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_channels(mut self, channels: u8) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.shape = Some(ImageConstraint::Width(width));
        self
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.shape = Some(ImageConstraint::Ratio(ratio));
        self
    }

    pub fn with_mode(mut self, mode: PixelMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_policy(mut self, policy: PaddingPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_companding(mut self, companding: Companding) -> Self {
        self.companding = Some(companding);
        self
    }

    pub fn ignoring_history(mut self, ignore: bool) -> Self {
        self.ignore_history = ignore;
        self
    }

    /// parameters for converting the output of this run back again
    ///
    /// Shape and format are cleared so they are inferred anew; an explicit
    /// companding choice is inverted.
    pub fn derive_next(&self) -> Self {
        ConversionParams {
            companding: self.companding.map(Companding::inverse),
            ignore_history: self.ignore_history,
            ..Default::default()
        }
    }
}

/// every parameter decided
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedParams {
    pub sample_rate: u32,
    pub channels: u8,
    pub shape: ImageConstraint,
    pub mode: PixelMode,
    pub policy: PaddingPolicy,
    pub companding: Companding,
    /// at least one value came from a history record
    pub from_history: bool,
}

impl Default for ResolvedParams {
    fn default() -> Self {
        ResolvedParams {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            shape: ImageConstraint::Ratio(DEFAULT_RATIO),
            mode: PixelMode::Rgb,
            policy: PaddingPolicy::Pad,
            companding: Companding::Linear,
            from_history: false,
        }
    }
}

/// fill unset parameters for a conversion going `direction`
///
/// `matched` is the history record found for the source, if any. Its target
/// side becomes this run's target, its companding is inverted, and if it padded
/// its output this run truncates. Audio values this tool cannot produce (more
/// than two channels, an unsupported rate) fall through to the defaults.
pub fn consolidate(
    params: &ConversionParams,
    direction: Direction,
    matched: Option<&ConversionRecord>,
) -> ResolvedParams {
    let defaults = ResolvedParams::default();
    let hints = matched
        .filter(|_| !params.ignore_history)
        .map(|record| Hints::from_record(record, direction))
        .unwrap_or_default();

    let mut used = false;
    ResolvedParams {
        sample_rate: pick(params.sample_rate, hints.sample_rate, defaults.sample_rate, &mut used),
        channels: pick(params.channels, hints.channels, defaults.channels, &mut used),
        shape: pick(params.shape, hints.shape, defaults.shape, &mut used),
        mode: pick(params.mode, hints.mode, defaults.mode, &mut used),
        policy: pick(params.policy, hints.policy, defaults.policy, &mut used),
        companding: pick(params.companding, hints.companding, defaults.companding, &mut used),
        from_history: used,
    }
}

/// values a history record offers for this run
#[derive(Debug, Default)]
struct Hints {
    sample_rate: Option<u32>,
    channels: Option<u8>,
    shape: Option<ImageConstraint>,
    mode: Option<PixelMode>,
    policy: Option<PaddingPolicy>,
    companding: Option<Companding>,
}

impl Hints {
    fn from_record(record: &ConversionRecord, direction: Direction) -> Self {
        let mut hints = Hints {
            policy: Some(if record.grew() {
                PaddingPolicy::Truncate
            } else {
                PaddingPolicy::Pad
            }),
            companding: Some(record.conversion_method.inverse()),
            ..Default::default()
        };

        match direction {
            Direction::ImageToAudio => {
                hints.sample_rate = Some(record.a_bitrate)
                    .filter(|rate| SUPPORTED_SAMPLE_RATES.contains(rate));
                hints.channels = Some(record.a_channels).filter(|c| (1..=2).contains(c));
                if hints.sample_rate.is_none() || hints.channels.is_none() {
                    debug!(
                        rate = record.a_bitrate,
                        channels = record.a_channels,
                        "recorded audio format not reproducible, using defaults"
                    );
                }
            }
            Direction::AudioToImage => {
                hints.shape = Some(ImageConstraint::Width(record.i_width));
                hints.mode = Some(record.i_mode);
            }
        }
        hints
    }
}

/// explicit value, else the history hint, else `default`
fn pick<T>(explicit: Option<T>, hinted: Option<T>, default: T, used: &mut bool) -> T {
    match (explicit, hinted) {
        (Some(value), _) => value,
        (None, Some(value)) => {
            *used = true;
            value
        }
        (None, None) => default,
    }
}
