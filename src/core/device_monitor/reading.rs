//! Parsing of one measurement line into a [`Reading`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One accepted measurement. Ordering is arrival order; there is no timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub value: i64,
    /// Source text as received, without the line terminator.
    pub raw: String,
}

impl Reading {
    pub fn new(value: i64, raw: impl Into<String>) -> Self {
        Self {
            value,
            raw: raw.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("not an integer: '{line}'")]
    Invalid { line: String },
}

/// What a worker does with a line that is not an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Drop the line, count it, keep reading.
    #[default]
    Skip,
    /// Stop the worker.
    Abort,
    /// Store the line as value 0 (legacy best-effort conversion).
    Zero,
}

impl std::str::FromStr for ParsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(ParsePolicy::Skip),
            "abort" => Ok(ParsePolicy::Abort),
            "zero" => Ok(ParsePolicy::Zero),
            other => Err(format!("unknown parse policy '{}'", other)),
        }
    }
}

/// Parse a single line into a reading.
///
/// The trailing terminator (`\n` or `\r\n`) and surrounding whitespace are ignored.
pub fn parse_reading(line: &str) -> Result<Reading, ParseError> {
    let text = line.trim_end_matches(['\n', '\r']).trim();

    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    text.parse::<i64>()
        .map(|value| Reading::new(value, text))
        .map_err(|_| ParseError::Invalid {
            line: text.to_string(),
        })
}
