//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Scanner output reader
//!
//! The source scanner writes what it found as a POT-style list, one entry
//! per extracted message, in file-traversal order:
//! - `#: file:line` - one or more source references (several per line allowed)
//! - `#.` - comment for translators, written next to the call site
//! - `msgctxt "Context|comment"` - context, optionally followed by `|` and
//!   the disambiguating comment
//! - `msgid "text"` - source text
//! - `msgid_plural "texts"` - marks a numerus message
//! - `msgstr ""` - ignored
//!
//! Every reference is one occurrence.  Occurrences of the same key are
//! merged into a single candidate, in scan order.

use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, BufReader, Read};

use sha2::{Digest, Sha256};

use crate::catalog_lib::error::ScanInputError;
use crate::catalog_lib::key::{normalize, MessageKey};
use crate::catalog_lib::message::Occurrence;

/// One scanned occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub key: MessageKey,
    pub extra_comment: Option<String>,
    pub numerus: bool,
    pub occurrence: Occurrence,
}

/// A scanned message with all of its occurrences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedMessage {
    pub key: MessageKey,
    pub extra_comment: Option<String>,
    pub numerus: bool,
    pub occurrences: Vec<Occurrence>,
}

/// Non-fatal ambiguity found while merging scan records or catalogs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationWarning {
    /// One call site was reported under two comments; the first one is kept
    ConflictingComment {
        kept: MessageKey,
        dropped: MessageKey,
        occurrence: Occurrence,
    },
    /// Call sites disagree on the comment for translators
    ConflictingExtraComment {
        key: MessageKey,
        kept: Option<String>,
        dropped: Option<String>,
    },
    /// Call sites disagree on whether the message is plural
    ConflictingNumerus { key: MessageKey },
    /// The same site was reported twice for one message
    DuplicateOccurrence {
        key: MessageKey,
        occurrence: Occurrence,
    },
    /// The previous catalog held the key twice; the entries were merged
    DuplicateInCatalog { key: MessageKey },
    /// The scan and the catalog disagree on plural forms
    NumerusMismatch { key: MessageKey },
}

impl fmt::Display for ReconciliationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationWarning::ConflictingComment {
                kept,
                dropped,
                occurrence,
            } => write!(
                f,
                "{}: {} also reported as {}, keeping the first",
                occurrence, kept, dropped
            ),
            ReconciliationWarning::ConflictingExtraComment { key, kept, dropped } => write!(
                f,
                "{}: conflicting translator comments {:?} and {:?}, keeping the first",
                key,
                kept.as_deref().unwrap_or(""),
                dropped.as_deref().unwrap_or("")
            ),
            ReconciliationWarning::ConflictingNumerus { key } => {
                write!(f, "{}: used both as plural and singular", key)
            }
            ReconciliationWarning::DuplicateOccurrence { key, occurrence } => {
                write!(f, "{}: {} reported twice", key, occurrence)
            }
            ReconciliationWarning::DuplicateInCatalog { key } => {
                write!(f, "{}: duplicate entry in previous catalog merged", key)
            }
            ReconciliationWarning::NumerusMismatch { key } => {
                write!(f, "{}: plural form changed, translation kept", key)
            }
        }
    }
}

/// Ordered scan candidates ready for reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSet {
    pub messages: Vec<ScannedMessage>,
    /// Digest of the records this set was built from
    pub fingerprint: String,
    pub warnings: Vec<ReconciliationWarning>,
}

impl ScanSet {
    /// Merge occurrence records into candidates
    pub fn from_records(records: &[ScanRecord]) -> Self {
        let mut messages: Vec<ScannedMessage> = Vec::new();
        let mut by_key: HashMap<MessageKey, usize> = HashMap::new();
        // (context, source, occurrence) -> key first reported there
        let mut by_site: HashMap<(&str, &str, &Occurrence), &MessageKey> = HashMap::new();
        let mut warnings = Vec::new();

        for record in records {
            let site = (
                record.key.context.as_str(),
                record.key.source.as_str(),
                &record.occurrence,
            );
            let mut redirected = false;
            let key = match by_site.get(&site) {
                Some(first) if **first != record.key => {
                    redirected = true;
                    warnings.push(ReconciliationWarning::ConflictingComment {
                        kept: (*first).clone(),
                        dropped: record.key.clone(),
                        occurrence: record.occurrence.clone(),
                    });
                    *first
                }
                Some(first) => *first,
                None => {
                    by_site.insert(site, &record.key);
                    &record.key
                }
            };

            let idx = match by_key.get(key) {
                Some(&idx) => idx,
                None => {
                    messages.push(ScannedMessage {
                        key: key.clone(),
                        extra_comment: record.extra_comment.clone(),
                        numerus: record.numerus,
                        occurrences: Vec::new(),
                    });
                    by_key.insert(key.clone(), messages.len() - 1);
                    messages.len() - 1
                }
            };
            let message = &mut messages[idx];

            if record.extra_comment.is_some() && record.extra_comment != message.extra_comment {
                if message.extra_comment.is_none() {
                    message.extra_comment = record.extra_comment.clone();
                } else {
                    warnings.push(ReconciliationWarning::ConflictingExtraComment {
                        key: key.clone(),
                        kept: message.extra_comment.clone(),
                        dropped: record.extra_comment.clone(),
                    });
                }
            }
            if record.numerus != message.numerus {
                warnings.push(ReconciliationWarning::ConflictingNumerus { key: key.clone() });
            }
            if message.occurrences.contains(&record.occurrence) {
                if redirected {
                    continue;
                }
                warnings.push(ReconciliationWarning::DuplicateOccurrence {
                    key: key.clone(),
                    occurrence: record.occurrence.clone(),
                });
            } else {
                message.occurrences.push(record.occurrence.clone());
            }
        }

        ScanSet {
            messages,
            fingerprint: fingerprint(records),
            warnings,
        }
    }

    /// Read and merge scanner output
    pub fn parse(s: &str) -> Result<Self, ScanInputError> {
        let records = parse_records(s.as_bytes())?;
        Ok(Self::from_records(&records))
    }

    pub fn parse_from<R: Read>(reader: R) -> Result<Self, ScanInputError> {
        let records = parse_records(reader)?;
        Ok(Self::from_records(&records))
    }
}

/// Stable digest of a scan, used to recognize a repeated run
pub fn fingerprint(records: &[ScanRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(record.key.context.as_bytes());
        hasher.update([0u8]);
        hasher.update(record.key.source.as_bytes());
        hasher.update([0u8]);
        match record.key.comment.as_deref() {
            Some(comment) => {
                hasher.update([1u8]);
                hasher.update(comment.as_bytes());
            }
            None => hasher.update([2u8]),
        }
        hasher.update([0u8]);
        hasher.update(record.extra_comment.as_deref().unwrap_or("").as_bytes());
        hasher.update([0, u8::from(record.numerus)]);
        hasher.update(record.occurrence.file.as_bytes());
        hasher.update([0u8]);
        hasher.update(record.occurrence.line.to_le_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// One entry of the scan file
#[derive(Debug, Default)]
struct ScanEntry {
    extracted_comments: Vec<String>,
    references: Vec<String>,
    msgctxt: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    /// Line where the entry's msgid appeared
    line: usize,
}

/// Parse scanner output into occurrence records, in file order
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<ScanRecord>, ScanInputError> {
    let mut parser = ScanParser::new(reader);
    let mut records = Vec::new();

    while let Some(entry) = parser.parse_entry()? {
        let msgid = match entry.msgid {
            Some(msgid) => msgid,
            None => continue,
        };
        // header entry
        if msgid.is_empty() && entry.msgctxt.is_none() {
            continue;
        }

        let (context, comment) = match entry.msgctxt.as_deref() {
            Some(ctxt) => match ctxt.split_once('|') {
                Some((context, comment)) => (context, Some(comment)),
                None => (ctxt, None),
            },
            None => ("", None),
        };
        let key = normalize(context, &msgid, comment);
        let extra_comment = if entry.extracted_comments.is_empty() {
            None
        } else {
            Some(entry.extracted_comments.join("\n"))
        };

        if entry.references.is_empty() {
            return Err(ScanInputError::MissingReference(entry.line, msgid));
        }
        for reference in &entry.references {
            records.push(ScanRecord {
                key: key.clone(),
                extra_comment: extra_comment.clone(),
                numerus: entry.msgid_plural.is_some(),
                occurrence: parse_reference(entry.line, reference)?,
            });
        }
    }

    Ok(records)
}

/// Parse `file:line`
fn parse_reference(line_number: usize, reference: &str) -> Result<Occurrence, ScanInputError> {
    let bad = || ScanInputError::BadReference(line_number, reference.to_string());
    let (file, line) = reference.rsplit_once(':').ok_or_else(bad)?;
    let line: i64 = line.parse().map_err(|_| bad())?;
    if file.is_empty() || line < 1 {
        return Err(bad());
    }
    Ok(Occurrence::new(file, line))
}

/// Parser for scan files
struct ScanParser<R> {
    reader: BufReader<R>,
    line_number: usize,
    current_line: String,
    peeked: Option<String>,
}

impl<R: Read> ScanParser<R> {
    fn new(reader: R) -> Self {
        ScanParser {
            reader: BufReader::new(reader),
            line_number: 0,
            current_line: String::new(),
            peeked: None,
        }
    }

    fn io_error(&self, e: std::io::Error) -> ScanInputError {
        ScanInputError::Parse(self.line_number, e.to_string())
    }

    /// Read the next line, handling the peeked line
    fn next_line(&mut self) -> Result<Option<String>, ScanInputError> {
        if let Some(line) = self.peeked.take() {
            return Ok(Some(line));
        }

        self.current_line.clear();
        let bytes = self
            .reader
            .read_line(&mut self.current_line)
            .map_err(|e| self.io_error(e))?;
        if bytes == 0 {
            return Ok(None);
        }

        self.line_number += 1;
        Ok(Some(self.current_line.trim_end().to_string()))
    }

    fn peek_line(&mut self) -> Result<Option<&str>, ScanInputError> {
        if self.peeked.is_none() {
            self.peeked = self.next_line()?;
        }
        Ok(self.peeked.as_deref())
    }

    fn unread_line(&mut self, line: String) {
        self.peeked = Some(line);
    }

    /// Parse a single entry
    fn parse_entry(&mut self) -> Result<Option<ScanEntry>, ScanInputError> {
        let mut entry = ScanEntry::default();

        // Skip empty lines and collect comments
        loop {
            let line = match self.next_line()? {
                Some(line) => line,
                None => {
                    return if entry.references.is_empty() && entry.extracted_comments.is_empty() {
                        Ok(None)
                    } else {
                        Err(ScanInputError::Parse(
                            self.line_number,
                            "comments without a message".to_string(),
                        ))
                    };
                }
            };

            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('#') {
                self.parse_comment(&mut entry, rest)?;
            } else if line.starts_with("msgctxt") || line.starts_with("msgid") {
                self.unread_line(line);
                break;
            } else {
                return Err(ScanInputError::Parse(
                    self.line_number,
                    format!("unexpected {:?}", line),
                ));
            }
        }

        // Parse the message content
        let mut last = Field::None;
        while let Some(line) = self.peek_line()? {
            if line.is_empty() || line.starts_with('#') {
                break;
            }
            if line.starts_with("msgctxt") && entry.msgid.is_some() {
                break;
            }

            let line = match self.next_line()? {
                Some(line) => line,
                None => break,
            };

            if let Some(rest) = line.strip_prefix("msgctxt") {
                entry.msgctxt = Some(self.parse_string_value(rest)?);
                last = Field::Context;
            } else if let Some(rest) = line.strip_prefix("msgid_plural") {
                entry.msgid_plural = Some(self.parse_string_value(rest)?);
                last = Field::Plural;
            } else if let Some(rest) = line.strip_prefix("msgid") {
                if entry.msgid.is_some() {
                    self.unread_line(line);
                    break;
                }
                entry.line = self.line_number;
                entry.msgid = Some(self.parse_string_value(rest)?);
                last = Field::Id;
            } else if line.starts_with("msgstr") {
                // translations are not part of scanner output
                last = Field::Str;
            } else if line.starts_with('"') {
                let value = self.parse_quoted_string(&line)?;
                let target = match last {
                    Field::Context => entry.msgctxt.as_mut(),
                    Field::Id => entry.msgid.as_mut(),
                    Field::Plural => entry.msgid_plural.as_mut(),
                    Field::Str => None,
                    Field::None => {
                        return Err(ScanInputError::Parse(
                            self.line_number,
                            "continuation string without keyword".to_string(),
                        ))
                    }
                };
                if let Some(target) = target {
                    target.push_str(&value);
                }
            } else {
                return Err(ScanInputError::Parse(
                    self.line_number,
                    format!("unexpected {:?}", line),
                ));
            }
        }

        if entry.msgid.is_none() {
            return Err(ScanInputError::Parse(
                self.line_number,
                "entry without msgid".to_string(),
            ));
        }
        Ok(Some(entry))
    }

    /// Parse a comment line
    fn parse_comment(&mut self, entry: &mut ScanEntry, rest: &str) -> Result<(), ScanInputError> {
        if let Some(content) = rest.strip_prefix('.') {
            entry.extracted_comments.push(content.trim().to_string());
        } else if let Some(content) = rest.strip_prefix(':') {
            entry
                .references
                .extend(content.split_whitespace().map(|s| s.to_string()));
        } else if rest.starts_with('~') {
            return Err(ScanInputError::ObsoleteEntry(self.line_number));
        }
        // flags, previous msgids and translator comments carry nothing here
        Ok(())
    }

    /// Parse a string value after a keyword (e.g., after "msgid ")
    fn parse_string_value(&mut self, rest: &str) -> Result<String, ScanInputError> {
        let rest = rest.trim();
        if !rest.starts_with('"') {
            return Err(ScanInputError::Parse(
                self.line_number,
                "expected quoted string".to_string(),
            ));
        }
        self.parse_quoted_string(rest)
    }

    /// Parse a quoted string (including escape sequences)
    fn parse_quoted_string(&self, s: &str) -> Result<String, ScanInputError> {
        let s = s.trim();
        let s = s.strip_prefix('"').ok_or_else(|| {
            ScanInputError::Parse(self.line_number, "expected quoted string".to_string())
        })?;
        let mut result = String::new();
        let mut chars = s.chars();

        loop {
            match chars.next() {
                None => return Err(ScanInputError::UnterminatedString(self.line_number)),
                Some('"') => break,
                Some('\\') => match chars.next() {
                    None => return Err(ScanInputError::UnterminatedString(self.line_number)),
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    Some('a') => result.push('\u{7}'),
                    Some('\\') => result.push('\\'),
                    Some('"') => result.push('"'),
                    Some(c) => return Err(ScanInputError::InvalidEscape(self.line_number, c)),
                },
                Some(c) => result.push(c),
            }
        }

        if !chars.as_str().trim().is_empty() {
            return Err(ScanInputError::Parse(
                self.line_number,
                "text after closing quote".to_string(),
            ));
        }
        Ok(result)
    }
}

/// Keyword a continuation string belongs to
#[derive(Clone, Copy)]
enum Field {
    None,
    Context,
    Id,
    Plural,
    Str,
}
