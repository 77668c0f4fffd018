//! Line sources feeding the device workers.
//!
//! A source is opened once per device and yields a lazy, finite sequence of lines.
//! End of sequence is signalled by the iterator returning `None`; failure to open is
//! a distinct [`SourceError`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::device::DeviceKind;

/// Lines of one device, pulled by its worker.
pub type Lines = Box<dyn Iterator<Item = io::Result<String>> + Send>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("no source configured for {0}")]
    NotConfigured(DeviceKind),

    #[error("unable to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Provider of per-device line streams.
pub trait LineSource: Send + Sync {
    fn open(&self, device: DeviceKind) -> Result<Lines, SourceError>;
}

/// Reads each device from a text file inside one directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
    overrides: HashMap<DeviceKind, PathBuf>,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overrides: HashMap::new(),
        }
    }

    /// Use `path` for `device` instead of the default file name.
    pub fn with_path(mut self, device: DeviceKind, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(device, path.into());
        self
    }

    pub fn path_for(&self, device: DeviceKind) -> PathBuf {
        self.overrides
            .get(&device)
            .cloned()
            .unwrap_or_else(|| self.dir.join(device.default_source_file()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl LineSource for FileSource {
    fn open(&self, device: DeviceKind) -> Result<Lines, SourceError> {
        let path = self.path_for(device);
        let file = File::open(&path).map_err(|source| SourceError::Open {
            path: path.clone(),
            source,
        })?;

        log::debug!("Opened {} source at {:?}", device, path);
        Ok(Box::new(decoded_lines(BufReader::new(file))))
    }
}

/// Split on `\n` and decode each line lossily, so bytes that are not UTF-8 reach the
/// parser as a malformed line instead of ending the stream.
fn decoded_lines<R: BufRead + Send + 'static>(
    reader: R,
) -> impl Iterator<Item = io::Result<String>> + Send {
    reader.split(b'\n').map(|line| {
        line.map(|bytes| match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    })
}

/// Preloaded lines per device. Each `open` replays the stored lines.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    lines: HashMap<DeviceKind, Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines<I, S>(mut self, device: DeviceKind, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines
            .insert(device, lines.into_iter().map(Into::into).collect());
        self
    }

    /// Sample data used by `devmon --demo`.
    pub fn demo() -> Self {
        Self::new()
            .with_lines(
                DeviceKind::Temperature,
                ["21", "22", "24", "23", "27", "31", "104", "25"],
            )
            .with_lines(
                DeviceKind::Humidity,
                ["40", "42", "45", "47", "50", "48", "46"],
            )
    }
}

impl LineSource for MemorySource {
    fn open(&self, device: DeviceKind) -> Result<Lines, SourceError> {
        let lines = self
            .lines
            .get(&device)
            .cloned()
            .ok_or(SourceError::NotConfigured(device))?;

        Ok(Box::new(lines.into_iter().map(Ok)))
    }
}
