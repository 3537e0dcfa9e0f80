//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::path::PathBuf;

use crate::catalog_lib::catalog::Catalog;
use crate::catalog_lib::validate::Diagnostic;

/// What went wrong while loading a catalog
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("malformed structure")]
    MalformedStructure,
    #[error("duplicate key")]
    DuplicateKey,
    #[error("bad location")]
    BadDelta,
}

/// Malformed on-disk catalog
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub detail: String,
}

impl ParseError {
    pub fn new<S: Into<String>>(kind: ParseErrorKind, detail: S) -> Self {
        ParseError {
            kind,
            detail: detail.into(),
        }
    }

    pub fn malformed<S: Into<String>>(detail: S) -> Self {
        Self::new(ParseErrorKind::MalformedStructure, detail)
    }
}

/// Malformed scanner output
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanInputError {
    #[error("line {0}: {1}")]
    Parse(usize, String),
    #[error("line {0}: invalid escape \\{1}")]
    InvalidEscape(usize, char),
    #[error("line {0}: unterminated string")]
    UnterminatedString(usize),
    #[error("line {0}: message {1:?} has no source reference")]
    MissingReference(usize, String),
    #[error("line {0}: bad source reference {1:?}")]
    BadReference(usize, String),
    #[error("line {0}: obsolete entries are not scanner output")]
    ObsoleteEntry(usize),
}

/// Post-merge invariant violation; the write is refused
#[derive(thiserror::Error, Debug)]
#[error("catalog failed validation with {} error(s)", error_count(.diagnostics))]
pub struct ValidationError {
    pub diagnostics: Vec<Diagnostic>,
    /// The rejected catalog, kept for inspection
    pub catalog: Box<Catalog>,
}

fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{path}: {source}")]
    Parse { path: PathBuf, source: ParseError },
    #[error("{path}: {source}")]
    ScanInput { path: PathBuf, source: ScanInputError },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Io { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
