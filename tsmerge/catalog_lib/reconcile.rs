//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Catalog reconciliation
//!
//! Merges a fresh scan into an existing catalog:
//! - messages found again keep their translation and status; their
//!   locations are replaced by the scanned ones
//! - messages found for the first time are added as `new`
//! - messages no longer found become `obsolete`, then `vanished` on the
//!   next scan that still lacks them
//!
//! Live messages follow scan order; messages that are gone follow them at
//! the end of their context, in their previous order.

use std::collections::HashMap;
use std::fmt;

use crate::catalog_lib::catalog::Catalog;
use crate::catalog_lib::key::MessageKey;
use crate::catalog_lib::message::{Message, Status};
use crate::catalog_lib::scan::{ReconciliationWarning, ScanSet};

/// When to delete messages that are gone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrunePolicy {
    /// Keep every message forever
    #[default]
    Keep,
    /// Delete messages that stayed vanished for this many scans
    AfterVanishedPasses(u32),
    /// Delete every obsolete and vanished message
    Immediately,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    pub prune: PrunePolicy,
}

/// What a reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Distinct messages in the scan
    pub scanned: usize,
    /// Scanned messages already in the catalog
    pub matched: usize,
    /// Scanned messages added to the catalog
    pub new: usize,
    /// Obsolete or vanished messages found again
    pub revived: usize,
    /// Messages that became obsolete
    pub obsoleted: usize,
    /// Messages that became or stayed vanished
    pub vanished: usize,
    /// Messages deleted by the prune policy
    pub pruned: usize,
}

impl fmt::Display for ReconcileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} source text(s) ({} new and {} already existing, {} revived); \
             {} obsoleted, {} vanished, {} removed",
            self.scanned,
            self.new,
            self.matched,
            self.revived,
            self.obsoleted,
            self.vanished,
            self.pruned
        )
    }
}

/// Result of a reconciliation pass
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub catalog: Catalog,
    pub warnings: Vec<ReconciliationWarning>,
    pub stats: ReconcileStats,
    /// The catalog was already produced from this very scan
    pub rerun: bool,
}

/// Slot of a message from the previous catalog; emptied once matched
type Slots = Vec<Option<Message>>;

/// Index the previous catalog by key, merging duplicate keys
fn index_catalog(
    old: Catalog,
    warnings: &mut Vec<ReconciliationWarning>,
) -> (Slots, HashMap<MessageKey, usize>, HashMap<String, Option<String>>) {
    let mut slots: Slots = Vec::new();
    let mut index: HashMap<MessageKey, usize> = HashMap::new();
    let mut comments = HashMap::new();

    for context in old.contexts {
        if let Some(comment) = context.comment {
            comments.insert(context.name.clone(), Some(comment));
        }
        for message in context.messages {
            match index.get(&message.key) {
                Some(&slot) => {
                    warnings.push(ReconciliationWarning::DuplicateInCatalog {
                        key: message.key.clone(),
                    });
                    if let Some(first) = slots[slot].as_mut() {
                        if first.translation.is_empty() && !message.translation.is_empty() {
                            first.translation = message.translation;
                            first.status = message.status;
                        }
                    }
                }
                None => {
                    index.insert(message.key.clone(), slots.len());
                    slots.push(Some(message));
                }
            }
        }
    }

    (slots, index, comments)
}

/// Status of a message the scan found again after it was gone
///
/// Only a message that was finished before it went away, and still has a
/// complete translation, comes back finished.
fn revived_status(message: &Message) -> Status {
    match message.status_before_gone {
        Some(Status::Finished) if message.translation.is_complete() => Status::Finished,
        _ => Status::Unfinished,
    }
}

/// Merge a scan into a catalog
pub fn reconcile(old: Catalog, scan: &ScanSet, options: &ReconcileOptions) -> Reconciled {
    let mut warnings = scan.warnings.clone();
    let mut stats = ReconcileStats {
        scanned: scan.messages.len(),
        ..ReconcileStats::default()
    };
    let rerun = old.scan_fingerprint.as_deref() == Some(scan.fingerprint.as_str());
    if rerun {
        log::debug!("catalog was produced from this scan, keeping obsolete states");
    }

    let mut catalog = Catalog {
        contexts: Vec::new(),
        scan_fingerprint: Some(scan.fingerprint.clone()),
        anomalies: Vec::new(),
        version: old.version.clone(),
        language: old.language.clone(),
        source_language: old.source_language.clone(),
        extras: old.extras.clone(),
    };
    let (mut slots, index, comments) = index_catalog(old, &mut warnings);

    for candidate in &scan.messages {
        let previous = index
            .get(&candidate.key)
            .and_then(|&slot| slots[slot].take());

        let message = match previous {
            Some(mut message) => {
                if message.status.is_gone() {
                    let status = revived_status(&message);
                    log::debug!("{}: {} -> {}", message.key, message.status, status);
                    message.status = status;
                    message.vanished_passes = 0;
                    message.status_before_gone = None;
                    stats.revived += 1;
                } else {
                    stats.matched += 1;
                }
                if message.is_numerus() != candidate.numerus {
                    warnings.push(ReconciliationWarning::NumerusMismatch {
                        key: candidate.key.clone(),
                    });
                }
                message.occurrences = candidate.occurrences.clone();
                message.extra_comment = candidate.extra_comment.clone();
                message
            }
            None => {
                log::trace!("{}: new", candidate.key);
                stats.new += 1;
                let mut message = Message::new(candidate.key.clone(), candidate.numerus)
                    .with_occurrences(candidate.occurrences.clone());
                message.extra_comment = candidate.extra_comment.clone();
                message
            }
        };
        catalog.push(message);
    }

    for mut message in slots.into_iter().flatten() {
        if !(rerun && message.status.is_gone()) {
            let status = match message.status {
                Status::Obsolete => {
                    message.vanished_passes = 1;
                    stats.vanished += 1;
                    Status::Vanished
                }
                Status::Vanished => {
                    message.vanished_passes = message.vanished_passes.saturating_add(1);
                    stats.vanished += 1;
                    Status::Vanished
                }
                live => {
                    message.status_before_gone = Some(live);
                    stats.obsoleted += 1;
                    Status::Obsolete
                }
            };
            log::debug!("{}: {} -> {}", message.key, message.status, status);
            message.status = status;
        }
        message.occurrences.clear();
        catalog.push(message);
    }

    stats.pruned = prune(&mut catalog, options.prune);

    for context in &mut catalog.contexts {
        if let Some(comment) = comments.get(&context.name) {
            context.comment = comment.clone();
        }
    }

    for warning in &warnings {
        log::warn!("{}", warning);
    }
    log::info!("{}", stats);

    Reconciled {
        catalog,
        warnings,
        stats,
        rerun,
    }
}

/// Apply the prune policy, returning the number of deleted messages
fn prune(catalog: &mut Catalog, policy: PrunePolicy) -> usize {
    let doomed = |message: &Message| match policy {
        PrunePolicy::Keep => false,
        PrunePolicy::Immediately => message.status.is_gone(),
        PrunePolicy::AfterVanishedPasses(passes) => {
            message.status == Status::Vanished && message.vanished_passes >= passes
        }
    };

    let mut pruned = 0;
    for context in &mut catalog.contexts {
        let before = context.messages.len();
        context.messages.retain(|m| {
            let drop = doomed(m);
            if drop {
                log::debug!("{}: removed", m.key);
            }
            !drop
        });
        pruned += before - context.messages.len();
    }
    catalog.contexts.retain(|c| !c.messages.is_empty());
    pruned
}
