//! Batches of conversions
//!
//! Each item keeps its own parameters. In reciprocal mode a converted item is
//! replaced by its output, so running the session again converts it back.

use crate::convert::{ConversionReport, ConvertError, Converter};
use librawdo::{ConversionParams, HistoryBackend};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A tracked input
#[derive(Debug, Clone)]
pub struct SessionItem {
    source: PathBuf,
    fingerprint: blake3::Hash,
    output: PathBuf,
    params: ConversionParams,
}

impl SessionItem {
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// requested output; the written file may carry a ` (n)` suffix
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn params(&self) -> &ConversionParams {
        &self.params
    }

    pub fn fingerprint(&self) -> blake3::Hash {
        self.fingerprint
    }
}

/// What happened to one item
#[derive(Debug)]
pub enum ItemOutcome {
    Converted {
        output: PathBuf,
        report: ConversionReport,
    },
    Skipped(ConvertError),
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// item index and outcome, in processing order
    pub outcomes: Vec<(usize, ItemOutcome)>,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ItemOutcome::Converted { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.converted()
    }
}

#[derive(Debug, Default)]
pub struct Session {
    items: Vec<SessionItem>,
    reciprocal: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reciprocal(mut self, reciprocal: bool) -> Self {
        self.reciprocal = reciprocal;
        self
    }

    pub fn set_reciprocal(&mut self, reciprocal: bool) {
        self.reciprocal = reciprocal;
    }

    pub fn items(&self) -> &[SessionItem] {
        &self.items
    }

    /// Track `source`, remembering its current content
    pub fn add(
        &mut self,
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        params: ConversionParams,
    ) -> Result<usize, ConvertError> {
        let source = source.into();
        let fingerprint = fingerprint(&source)?;
        self.items.push(SessionItem {
            source,
            fingerprint,
            output: output.into(),
            params,
        });
        Ok(self.items.len() - 1)
    }

    /// Replace one item's parameters
    pub fn set_params(&mut self, index: usize, params: ConversionParams) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.params = params;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<SessionItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Convert every item in order. A failing item is reported and skipped.
    pub fn run<B: HistoryBackend>(&mut self, converter: &mut Converter<B>) -> BatchReport {
        let mut report = BatchReport::default();
        let reciprocal = self.reciprocal;

        for (index, item) in self.items.iter_mut().enumerate() {
            let outcome = match convert_item(item, converter) {
                Ok((output, result)) => {
                    if reciprocal {
                        chain(item, &output);
                    }
                    ItemOutcome::Converted {
                        output,
                        report: result,
                    }
                }
                Err(e) => {
                    warn!("skipping {}: {}", item.source.display(), e);
                    ItemOutcome::Skipped(e)
                }
            };
            report.outcomes.push((index, outcome));
        }

        report
    }
}

fn convert_item<B: HistoryBackend>(
    item: &SessionItem,
    converter: &mut Converter<B>,
) -> Result<(PathBuf, ConversionReport), ConvertError> {
    if fingerprint(&item.source)? != item.fingerprint {
        return Err(ConvertError::StaleSourceItem {
            path: item.source.clone(),
        });
    }

    let output = unique_output_path(&item.output);
    let report = converter.convert(&item.source, &output, &item.params)?;
    Ok((output, report))
}

/// Point `item` at what it just produced, aiming back at its old source
fn chain(item: &mut SessionItem, produced: &Path) {
    let fingerprint = match fingerprint(produced) {
        Ok(f) => f,
        Err(e) => {
            warn!("cannot chain {}: {}", produced.display(), e);
            return;
        }
    };

    debug!(
        "{} now continues from {}",
        item.source.display(),
        produced.display()
    );
    let previous = std::mem::replace(&mut item.source, produced.to_path_buf());
    item.fingerprint = fingerprint;
    item.output = previous;
    item.params = item.params.derive_next();
}

/// BLAKE3 of a file's content
pub fn fingerprint(path: &Path) -> Result<blake3::Hash, ConvertError> {
    let data = fs::read(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(blake3::hash(&data))
}

/// `path` if it is free, else the first free `stem (n).ext` counting from 1
pub fn unique_output_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1u64..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{} ({}).{}", stem, n, ext),
                None => format!("{} ({})", stem, n),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
