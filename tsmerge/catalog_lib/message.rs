//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Translatable message
//!
//! A `Message` is the unit of translation: its identity key, the
//! translation slot, the translator status and the source locations where
//! the latest scan found it.

use std::fmt;

use crate::catalog_lib::key::MessageKey;

/// Translation progress of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Found in the scan, absent from the previous catalog
    New,
    /// Matched, translation not yet approved
    Unfinished,
    /// Matched, translation approved
    Finished,
    /// In the previous catalog but missing from the latest scan
    Obsolete,
    /// Obsolete and still missing after a further scan
    Vanished,
}

impl Status {
    /// True for messages the latest scan did not find
    pub fn is_gone(self) -> bool {
        matches!(self, Status::Obsolete | Status::Vanished)
    }

    pub fn is_live(self) -> bool {
        !self.is_gone()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::New => "new",
            Status::Unfinished => "unfinished",
            Status::Finished => "finished",
            Status::Obsolete => "obsolete",
            Status::Vanished => "vanished",
        };
        f.write_str(name)
    }
}

/// A source location where a message was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Occurrence {
    pub file: String,
    pub line: i64,
}

impl Occurrence {
    pub fn new<S: Into<String>>(file: S, line: i64) -> Self {
        Occurrence {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Translation slot
///
/// Plural messages keep one string per numerus form.  The number of forms
/// is whatever the translator supplied; no plural rules are evaluated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Single(String),
    Numerus(Vec<String>),
}

impl Translation {
    /// An untranslated slot of the right shape
    pub fn empty(numerus: bool) -> Self {
        if numerus {
            Translation::Numerus(vec![String::new()])
        } else {
            Translation::Single(String::new())
        }
    }

    pub fn is_numerus(&self) -> bool {
        matches!(self, Translation::Numerus(_))
    }

    /// True when no text at all has been entered
    pub fn is_empty(&self) -> bool {
        match self {
            Translation::Single(text) => text.is_empty(),
            Translation::Numerus(forms) => forms.iter().all(|s| s.is_empty()),
        }
    }

    /// True when every form carries text
    pub fn is_complete(&self) -> bool {
        match self {
            Translation::Single(text) => !text.is_empty(),
            Translation::Numerus(forms) => !forms.is_empty() && forms.iter().all(|s| !s.is_empty()),
        }
    }

    /// First (or only) form, used for runtime lookups
    pub fn text(&self) -> &str {
        match self {
            Translation::Single(text) => text,
            Translation::Numerus(forms) => forms.first().map(|s| s.as_str()).unwrap_or(""),
        }
    }
}

impl Default for Translation {
    fn default() -> Self {
        Translation::Single(String::new())
    }
}

/// Named value carried through verbatim (`extra-*` elements)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extra {
    pub name: String,
    pub value: String,
}

/// A translatable message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub key: MessageKey,
    /// Source text this message had before its last edit
    pub old_source: Option<String>,
    /// Comment this message had before its last edit
    pub old_comment: Option<String>,
    /// Comment for translators written next to the call site
    pub extra_comment: Option<String>,
    /// Note left by a translator
    pub translator_comment: Option<String>,
    pub translation: Translation,
    pub status: Status,
    pub occurrences: Vec<Occurrence>,
    /// Consecutive scans this message has spent vanished
    pub vanished_passes: u32,
    /// Status the message had when it was last found, kept while it is gone
    pub status_before_gone: Option<Status>,
    pub extras: Vec<Extra>,
}

impl Message {
    /// A freshly scanned message with nothing translated yet
    pub fn new(key: MessageKey, numerus: bool) -> Self {
        Message {
            key,
            old_source: None,
            old_comment: None,
            extra_comment: None,
            translator_comment: None,
            translation: Translation::empty(numerus),
            status: Status::New,
            occurrences: Vec::new(),
            vanished_passes: 0,
            status_before_gone: None,
            extras: Vec::new(),
        }
    }

    pub fn with_translation(mut self, translation: Translation, status: Status) -> Self {
        self.translation = translation;
        self.status = status;
        self
    }

    pub fn with_occurrences(mut self, occurrences: Vec<Occurrence>) -> Self {
        self.occurrences = occurrences;
        self
    }

    pub fn is_numerus(&self) -> bool {
        self.translation.is_numerus()
    }
}
