//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! In-memory translation catalog
//!
//! A `Catalog` is one target language: an ordered list of contexts, each
//! holding an ordered list of messages.  Order is significant, since the
//! location codec encodes lines relative to the previous message.

use thiserror::Error;

use crate::catalog_lib::key::{normalize, MessageKey};
use crate::catalog_lib::location::DeltaAnomaly;
use crate::catalog_lib::message::{Extra, Message, Occurrence, Status, Translation};

/// Named group of messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub name: String,
    /// Context-level comment, kept as-is
    pub comment: Option<String>,
    pub messages: Vec<Message>,
}

impl Context {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Context {
            name: name.into(),
            comment: None,
            messages: Vec::new(),
        }
    }

    pub fn find(&self, key: &MessageKey) -> Option<&Message> {
        self.messages.iter().find(|m| &m.key == key)
    }

    pub fn find_mut(&mut self, key: &MessageKey) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.key == key)
    }
}

/// A delta anomaly found while loading, with the message it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationAnomaly {
    pub key: MessageKey,
    pub anomaly: DeltaAnomaly,
}

/// Error type for translator edits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("unknown message {0}")]
    UnknownKey(MessageKey),
    #[error("{key}: status {status} cannot be set by an edit")]
    InvalidStatus { key: MessageKey, status: Status },
    #[error("{0}: a finished message needs a complete translation")]
    IncompleteTranslation(MessageKey),
}

/// One language's translation catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Format version written in the TS element
    pub version: String,
    /// Target language tag
    pub language: Option<String>,
    pub source_language: Option<String>,
    pub contexts: Vec<Context>,
    /// Fingerprint of the scan that produced this catalog
    pub scan_fingerprint: Option<String>,
    /// Catalog-level `extra-*` values
    pub extras: Vec<Extra>,
    /// Location anomalies seen when this catalog was loaded
    pub anomalies: Vec<LocationAnomaly>,
}

impl Catalog {
    pub fn new(language: Option<String>) -> Self {
        Catalog {
            version: String::from("2.1"),
            language,
            source_language: None,
            contexts: Vec::new(),
            scan_fingerprint: None,
            extras: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Get a context by name, appending it if missing
    pub fn context_entry(&mut self, name: &str) -> &mut Context {
        let idx = match self.contexts.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.contexts.push(Context::new(name));
                self.contexts.len() - 1
            }
        };
        &mut self.contexts[idx]
    }

    /// Append a message to its context
    pub fn push(&mut self, message: Message) {
        let context = message.key.context.clone();
        self.context_entry(&context).messages.push(message);
    }

    pub fn find(&self, key: &MessageKey) -> Option<&Message> {
        self.context(&key.context).and_then(|c| c.find(key))
    }

    pub fn find_mut(&mut self, key: &MessageKey) -> Option<&mut Message> {
        self.contexts
            .iter_mut()
            .find(|c| c.name == key.context)
            .and_then(|c| c.find_mut(key))
    }

    /// All messages in catalog order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.contexts.iter().flat_map(|c| c.messages.iter())
    }

    /// Locations of live messages in catalog order, as the codec sees them
    pub fn live_occurrences(&self) -> impl Iterator<Item = &Occurrence> {
        self.messages()
            .filter(|m| m.status.is_live())
            .flat_map(|m| m.occurrences.iter())
    }

    /// Look up a finished translation
    pub fn lookup(&self, context: &str, source: &str, comment: Option<&str>) -> Option<&str> {
        let key = normalize(context, source, comment);
        self.find(&key)
            .filter(|m| m.status == Status::Finished)
            .map(|m| m.translation.text())
    }

    /// Record a translator's edit
    ///
    /// This is the only mutation available outside reconciliation.
    pub fn apply_translation_edit(
        &mut self,
        key: &MessageKey,
        translation: Translation,
        status: Status,
    ) -> Result<(), EditError> {
        if !matches!(status, Status::Finished | Status::Unfinished) {
            return Err(EditError::InvalidStatus {
                key: key.clone(),
                status,
            });
        }
        if status == Status::Finished && !translation.is_complete() {
            return Err(EditError::IncompleteTranslation(key.clone()));
        }

        let message = self
            .find_mut(key)
            .ok_or_else(|| EditError::UnknownKey(key.clone()))?;
        if message.status.is_gone() {
            return Err(EditError::InvalidStatus {
                key: key.clone(),
                status: message.status,
            });
        }
        message.translation = translation;
        message.status = status;
        Ok(())
    }

    /// Number of messages in each status: new, unfinished, finished, obsolete, vanished
    pub fn status_counts(&self) -> [usize; 5] {
        let mut counts = [0; 5];
        for message in self.messages() {
            let idx = match message.status {
                Status::New => 0,
                Status::Unfinished => 1,
                Status::Finished => 2,
                Status::Obsolete => 3,
                Status::Vanished => 4,
            };
            counts[idx] += 1;
        }
        counts
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        let mut catalog = Catalog::new(Some("nl".into()));
        catalog.push(
            Message::new(normalize("QTerminal", "Edit %1", None), false)
                .with_translation(Translation::Single("Bewerk %1".into()), Status::Finished)
                .with_occurrences(vec![Occurrence::new("qterminal.cpp", 88)]),
        );
        catalog.push(
            Message::new(normalize("QTerminal", "Close", None), false)
                .with_occurrences(vec![Occurrence::new("qterminal.cpp", 95)]),
        );
        catalog.push(
            Message::new(normalize("QObject", "b", Some("short form for bold")), false)
                .with_translation(Translation::Single("b".into()), Status::Obsolete),
        );
        catalog
    }

    #[test]
    fn test_lookup_only_finished() {
        let catalog = sample();
        assert_eq!(catalog.lookup("QTerminal", "Edit %1", None), Some("Bewerk %1"));
        assert_eq!(catalog.lookup("QTerminal", "Close", None), None);
        assert_eq!(catalog.lookup("QObject", "b", Some("short form for bold")), None);
        assert_eq!(catalog.lookup("QObject", "b", None), None);
    }

    #[test]
    fn test_push_keeps_context_order() {
        let catalog = sample();
        let names: Vec<_> = catalog.contexts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["QTerminal", "QObject"]);
        assert_eq!(catalog.contexts[0].messages.len(), 2);
    }

    #[test]
    fn test_live_occurrences_skip_obsolete() {
        let mut catalog = sample();
        catalog.contexts[1].messages[0].occurrences = vec![Occurrence::new("old.cpp", 3)];
        let lines: Vec<_> = catalog.live_occurrences().map(|o| o.line).collect();
        assert_eq!(lines, vec![88, 95]);
    }

    #[test]
    fn test_edit() {
        let mut catalog = sample();
        let key = normalize("QTerminal", "Close", None);
        catalog
            .apply_translation_edit(&key, Translation::Single("Sluiten".into()), Status::Finished)
            .unwrap();
        assert_eq!(catalog.lookup("QTerminal", "Close", None), Some("Sluiten"));
    }

    #[test]
    fn test_edit_errors() {
        let mut catalog = sample();
        let unknown = normalize("QTerminal", "Open", None);
        assert_eq!(
            catalog.apply_translation_edit(&unknown, Translation::Single("x".into()), Status::Finished),
            Err(EditError::UnknownKey(unknown.clone()))
        );

        let key = normalize("QTerminal", "Close", None);
        assert!(matches!(
            catalog.apply_translation_edit(&key, Translation::Single("x".into()), Status::Obsolete),
            Err(EditError::InvalidStatus { .. })
        ));
        assert_eq!(
            catalog.apply_translation_edit(&key, Translation::Single(String::new()), Status::Finished),
            Err(EditError::IncompleteTranslation(key.clone()))
        );

        let gone = normalize("QObject", "b", Some("short form for bold"));
        assert!(matches!(
            catalog.apply_translation_edit(&gone, Translation::Single("v".into()), Status::Finished),
            Err(EditError::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_status_counts() {
        assert_eq!(sample().status_counts(), [1, 0, 1, 1, 0]);
    }
}
