//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Catalog consistency checks

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::catalog_lib::catalog::Catalog;
use crate::catalog_lib::key::MessageKey;
use crate::catalog_lib::location::DeltaAnomaly;
use crate::catalog_lib::message::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Key appears more than once in a context
    DuplicateKey,
    /// Finished message with an empty or partial translation
    EmptyFinished,
    /// Message filed under a context other than its own
    ContextMismatch { context: String },
    /// Live message without any source location
    NoOccurrences,
    /// Location chain anomaly recorded at load time
    LocationAnomaly(DeltaAnomaly),
    /// Location with a line number below 1
    BadLine { file: String, line: i64 },
    /// Source text used both with and without a disambiguating comment
    MixedDisambiguation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub key: MessageKey,
}

impl Diagnostic {
    fn error(kind: DiagnosticKind, key: &MessageKey) -> Self {
        Diagnostic {
            severity: Severity::Error,
            kind,
            key: key.clone(),
        }
    }

    fn warning(kind: DiagnosticKind, key: &MessageKey) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            kind,
            key: key.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: ", self.severity, self.key)?;
        match &self.kind {
            DiagnosticKind::DuplicateKey => f.write_str("duplicate message"),
            DiagnosticKind::EmptyFinished => {
                f.write_str("marked finished without a complete translation")
            }
            DiagnosticKind::ContextMismatch { context } => {
                write!(f, "filed under context {:?}", context)
            }
            DiagnosticKind::NoOccurrences => f.write_str("no source location"),
            DiagnosticKind::LocationAnomaly(anomaly) => write!(f, "{}", anomaly),
            DiagnosticKind::BadLine { file, line } => {
                write!(f, "location {}:{} is before the first line", file, line)
            }
            DiagnosticKind::MixedDisambiguation => {
                f.write_str("same text also used without a comment")
            }
        }
    }
}

/// Check a catalog, returning every diagnostic in catalog order
pub fn validate(catalog: &Catalog) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for context in &catalog.contexts {
        let mut seen: HashSet<&MessageKey> = HashSet::new();
        // source text -> (used without comment, used with comment)
        let mut usage: HashMap<&str, (bool, bool)> = HashMap::new();
        for message in &context.messages {
            let key = &message.key;
            if !seen.insert(key) {
                diagnostics.push(Diagnostic::error(DiagnosticKind::DuplicateKey, key));
            }
            if key.context != context.name {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ContextMismatch {
                        context: context.name.clone(),
                    },
                    key,
                ));
            }
            if message.status == Status::Finished && !message.translation.is_complete() {
                diagnostics.push(Diagnostic::error(DiagnosticKind::EmptyFinished, key));
            }
            if message.status.is_live() && message.occurrences.is_empty() {
                diagnostics.push(Diagnostic::warning(DiagnosticKind::NoOccurrences, key));
            }
            for occurrence in message.occurrences.iter().filter(|o| o.line < 1) {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::BadLine {
                        file: occurrence.file.clone(),
                        line: occurrence.line,
                    },
                    key,
                ));
            }
            if message.status.is_live() {
                let entry = usage.entry(key.source.as_str()).or_default();
                if key.comment.is_none() {
                    entry.0 = true;
                } else {
                    entry.1 = true;
                }
            }
        }

        for message in context.messages.iter().filter(|m| m.status.is_live()) {
            let key = &message.key;
            if !key.comment.is_none() && usage.get(key.source.as_str()) == Some(&(true, true)) {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::MixedDisambiguation,
                    key,
                ));
            }
        }
    }

    for anomaly in &catalog.anomalies {
        diagnostics.push(Diagnostic::warning(
            DiagnosticKind::LocationAnomaly(anomaly.anomaly.clone()),
            &anomaly.key,
        ));
    }

    diagnostics
}
