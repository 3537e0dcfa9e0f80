//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Relative location codec
//!
//! Catalogs store source locations as deltas from the previously written
//! location, across the whole catalog:
//! - a record naming a file resets the cursor to that file at line 0 and
//!   then applies its delta
//! - a record without a file applies its delta to the current line
//!
//! The cursor is global: it continues across message and context
//! boundaries in catalog order.  Messages no longer found in the source
//! have no locations and do not move the cursor.

use std::fmt;

use thiserror::Error;

use crate::catalog_lib::message::Occurrence;

/// One stored location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRecord {
    /// File name, present when the file differs from the previous record
    pub file: Option<String>,
    pub delta: i64,
}

impl LocationRecord {
    /// The `line` attribute form of the delta, always signed
    pub fn line_attr(&self) -> String {
        format!("{:+}", self.delta)
    }
}

impl fmt::Display for LocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{:+}", file, self.delta),
            None => write!(f, "{:+}", self.delta),
        }
    }
}

/// Records that cannot be decoded at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeltaError {
    #[error("line delta {0:+} with no file opened")]
    NoFile(i64),
    #[error("invalid line value {0:?}")]
    BadLine(String),
    #[error("line delta {delta:+} from line {from} is out of range")]
    Overflow { from: i64, delta: i64 },
}

/// Decoded values that are suspicious but usable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaAnomaly {
    /// The chain produced a line number below 1
    NonPositiveLine { file: String, line: i64 },
    /// The chain moved backwards in a file declared monotonic
    Backward { file: String, from: i64, to: i64 },
}

impl fmt::Display for DeltaAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaAnomaly::NonPositiveLine { file, line } => {
                write!(f, "{}: line chain reaches {}", file, line)
            }
            DeltaAnomaly::Backward { file, from, to } => {
                write!(f, "{}: line chain moves back from {} to {}", file, from, to)
            }
        }
    }
}

/// Decoder strictness
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Flag deltas that move backwards within a file
    pub monotonic: bool,
}

/// Parse a `line` attribute: `+12`, `-3` or `12`
pub fn parse_line_attr(value: &str) -> Result<i64, DeltaError> {
    let value = value.trim();
    let digits = value.strip_prefix('+').unwrap_or(value);
    let unsigned = digits.strip_prefix('-').unwrap_or(digits);
    let negated_plus = digits.len() != value.len() && unsigned.len() != digits.len();
    if unsigned.is_empty() || negated_plus || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DeltaError::BadLine(value.to_string()));
    }
    digits
        .parse::<i64>()
        .map_err(|_| DeltaError::BadLine(value.to_string()))
}

/// Cursor of the encoder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderState {
    current_file: Option<String>,
    current_line: i64,
}

impl EncoderState {
    /// Encode one occurrence, returning the advanced cursor
    pub fn encode(self, occurrence: &Occurrence) -> (EncoderState, LocationRecord) {
        let same_file = self.current_file.as_deref() == Some(occurrence.file.as_str());
        let (file, baseline) = if same_file {
            (None, self.current_line)
        } else {
            (Some(occurrence.file.clone()), 0)
        };
        let record = LocationRecord {
            file,
            delta: occurrence.line - baseline,
        };
        let next = EncoderState {
            current_file: if same_file {
                self.current_file
            } else {
                Some(occurrence.file.clone())
            },
            current_line: occurrence.line,
        };
        (next, record)
    }
}

/// Result of decoding one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub occurrence: Occurrence,
    pub anomaly: Option<DeltaAnomaly>,
}

/// Cursor of the decoder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderState {
    current_file: Option<String>,
    current_line: i64,
}

impl DecoderState {
    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn current_line(&self) -> i64 {
        self.current_line
    }

    /// Decode one record, returning the advanced cursor
    pub fn decode(
        self,
        record: &LocationRecord,
        options: DecodeOptions,
    ) -> Result<(DecoderState, Decoded), DeltaError> {
        let (file, baseline, reset) = match (&record.file, self.current_file) {
            (Some(file), current) => {
                let reset = current.as_deref() != Some(file.as_str());
                (file.clone(), 0, reset)
            }
            (None, Some(current)) => (current, self.current_line, false),
            (None, None) => return Err(DeltaError::NoFile(record.delta)),
        };
        let line = baseline
            .checked_add(record.delta)
            .ok_or(DeltaError::Overflow {
                from: baseline,
                delta: record.delta,
            })?;

        let anomaly = if line < 1 {
            Some(DeltaAnomaly::NonPositiveLine {
                file: file.clone(),
                line,
            })
        } else if options.monotonic && !reset && line < self.current_line {
            Some(DeltaAnomaly::Backward {
                file: file.clone(),
                from: self.current_line,
                to: line,
            })
        } else {
            None
        };

        let decoded = Decoded {
            occurrence: Occurrence::new(file.clone(), line),
            anomaly,
        };
        let next = DecoderState {
            current_file: Some(file),
            current_line: line,
        };
        Ok((next, decoded))
    }
}

/// Encode a whole sequence from a fresh cursor
pub fn encode_all(occurrences: &[Occurrence]) -> Vec<LocationRecord> {
    let mut state = EncoderState::default();
    let mut records = Vec::with_capacity(occurrences.len());
    for occurrence in occurrences {
        let (next, record) = state.encode(occurrence);
        state = next;
        records.push(record);
    }
    records
}

/// Decode a whole sequence from a fresh cursor
pub fn decode_all(
    records: &[LocationRecord],
    options: DecodeOptions,
) -> Result<(Vec<Occurrence>, Vec<DeltaAnomaly>), DeltaError> {
    let mut state = DecoderState::default();
    let mut occurrences = Vec::with_capacity(records.len());
    let mut anomalies = Vec::new();
    for record in records {
        let (next, decoded) = state.decode(record, options)?;
        state = next;
        occurrences.push(decoded.occurrence);
        anomalies.extend(decoded.anomaly);
    }
    Ok((occurrences, anomalies))
}
