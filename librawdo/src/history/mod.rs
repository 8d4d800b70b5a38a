//! Conversion history
//!
//! An append-only log of past conversions, bucketed by the byte length each
//! conversion produced. A later conversion in the other direction that starts
//! from the same number of bytes can look up what the other side looked like
//! and reuse its shape.
//!
//! Matching is a heuristic: two unrelated files with the same byte length and
//! one equal field (say, the same pixel mode) are indistinguishable.

mod backend;

pub use backend::{
    HistoryBackend, JsonFileBackend, MemoryBackend, APP_DIR, BACKUP_EXTENSION, HISTORY_FILE,
};

use crate::core::{
    AudioDescriptor, Companding, Direction, ImageDescriptor, MediaDescriptor, PixelMode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("cannot access history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("history file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("no per-user data directory on this platform")]
    NoDataDir,
    #[error("a conversion record needs one image side and one audio side")]
    MismatchedSides,
}

/// one past conversion, flattened to both sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub from_image: bool,
    pub conversion_method: Companding,
    pub i_width: u32,
    pub i_mode: PixelMode,
    /// image side, in bytes
    pub i_size: u64,
    pub a_bitrate: u32,
    pub a_channels: u8,
    /// audio side, in bytes
    pub a_size: u64,
    /// seconds since the Unix epoch
    pub timestamp: f64,
}

impl ConversionRecord {
    pub fn new(
        image: &ImageDescriptor,
        audio: &AudioDescriptor,
        direction: Direction,
        companding: Companding,
        timestamp: f64,
    ) -> Self {
        ConversionRecord {
            from_image: direction.from_image(),
            conversion_method: companding,
            i_width: image.width,
            i_mode: image.mode,
            i_size: image.byte_len(),
            a_bitrate: audio.sample_rate,
            a_channels: audio.channels,
            a_size: audio.byte_len(),
            timestamp,
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::from_flag(self.from_image)
    }

    /// bytes this conversion produced
    pub fn output_size(&self) -> u64 {
        if self.from_image {
            self.a_size
        } else {
            self.i_size
        }
    }

    /// bytes this conversion consumed
    pub fn input_size(&self) -> u64 {
        if self.from_image {
            self.i_size
        } else {
            self.a_size
        }
    }

    /// did this conversion pad its output?
    pub fn grew(&self) -> bool {
        self.output_size() > self.input_size()
    }
}

/// partial source description; `None` fields match anything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceQuery {
    pub i_width: Option<u32>,
    pub i_mode: Option<PixelMode>,
    pub a_bitrate: Option<u32>,
    pub a_channels: Option<u8>,
}

impl SourceQuery {
    pub fn from_descriptor(descriptor: &MediaDescriptor) -> Self {
        match descriptor {
            MediaDescriptor::Image(image) => SourceQuery {
                i_width: Some(image.width),
                i_mode: Some(image.mode),
                ..Default::default()
            },
            MediaDescriptor::Audio(audio) => SourceQuery {
                a_bitrate: Some(audio.sample_rate),
                a_channels: Some(audio.channels),
                ..Default::default()
            },
        }
    }

    /// every present field equals the record's
    pub fn matches(&self, record: &ConversionRecord) -> bool {
        self.i_width.map_or(true, |w| w == record.i_width)
            && self.i_mode.map_or(true, |m| m == record.i_mode)
            && self.a_bitrate.map_or(true, |b| b == record.a_bitrate)
            && self.a_channels.map_or(true, |c| c == record.a_channels)
    }
}

/// output byte length -> records, in append order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    buckets: BTreeMap<u64, Vec<ConversionRecord>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(&self, byte_len: u64) -> &[ConversionRecord] {
        self.buckets.get(&byte_len).map_or(&[], Vec::as_slice)
    }

    /// append under the record's output size
    pub fn push(&mut self, record: ConversionRecord) {
        self.buckets
            .entry(record.output_size())
            .or_default()
            .push(record);
    }

    /// number of records
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// most recent record in bucket `byte_len` that went the other way
    /// and matches `query`
    pub fn lookup(
        &self,
        byte_len: u64,
        query: &SourceQuery,
        direction: Direction,
    ) -> Option<&ConversionRecord> {
        self.bucket(byte_len)
            .iter()
            .filter(|r| r.direction() == direction.opposite() && query.matches(r))
            .max_by(|a, b| a.timestamp.total_cmp(&b.timestamp))
    }
}

/// the history log behind a persistence backend
#[derive(Debug)]
pub struct HistoryStore<B: HistoryBackend> {
    backend: B,
}

impl<B: HistoryBackend> HistoryStore<B> {
    pub fn new(backend: B) -> Self {
        HistoryStore { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// full log; an unreadable log counts as empty
    pub fn load(&self) -> HistoryLog {
        match self.backend.load() {
            Ok(log) => log,
            Err(e) => {
                warn!("ignoring history: {}", e);
                HistoryLog::default()
            }
        }
    }

    pub fn lookup(
        &self,
        byte_len: u64,
        query: &SourceQuery,
        direction: Direction,
    ) -> Option<ConversionRecord> {
        let found = self.load().lookup(byte_len, query, direction).cloned();
        debug!(byte_len, ?query, %direction, found = found.is_some(), "history lookup");
        found
    }

    /// append a record for a finished conversion, stamped now
    pub fn record(
        &mut self,
        source: &MediaDescriptor,
        target: &MediaDescriptor,
        direction: Direction,
        companding: Companding,
    ) -> Result<ConversionRecord, HistoryError> {
        let (image, audio) = match (source, target) {
            (MediaDescriptor::Image(i), MediaDescriptor::Audio(a))
            | (MediaDescriptor::Audio(a), MediaDescriptor::Image(i)) => (i, a),
            _ => return Err(HistoryError::MismatchedSides),
        };
        if source.is_image() != direction.from_image() {
            return Err(HistoryError::MismatchedSides);
        }

        let record = ConversionRecord::new(image, audio, direction, companding, now_secs());
        self.append(record.clone())?;
        Ok(record)
    }

    /// load, push, save
    pub fn append(&mut self, record: ConversionRecord) -> Result<(), HistoryError> {
        let mut log = self.load();
        debug!(key = record.output_size(), "appending history record");
        log.push(record);
        self.backend.save(&log)
    }
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
