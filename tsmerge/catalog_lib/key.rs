//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Message identity
//!
//! A message is identified by its context, its source text and an optional
//! disambiguating comment.  Two occurrences collapse into one message only
//! when all three match exactly; there is no fuzzy matching.

use std::fmt;

/// Disambiguation tag of a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Disambiguation {
    /// No comment was given
    #[default]
    None,
    /// Comment text distinguishing identical source strings
    Comment(String),
}

impl Disambiguation {
    /// Build from an optional comment; an empty comment carries no tag
    pub fn from_option(comment: Option<&str>) -> Self {
        match comment {
            Some(text) if !text.is_empty() => Disambiguation::Comment(text.to_string()),
            _ => Disambiguation::None,
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Disambiguation::None => None,
            Disambiguation::Comment(text) => Some(text.as_str()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Disambiguation::None)
    }
}

/// Identity of a translatable message
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey {
    pub context: String,
    pub source: String,
    pub comment: Disambiguation,
}

impl MessageKey {
    pub fn new<C, S>(context: C, source: S, comment: Disambiguation) -> Self
    where
        C: Into<String>,
        S: Into<String>,
    {
        MessageKey {
            context: context.into(),
            source: source.into(),
            comment,
        }
    }
}

/// Build the identity key of an occurrence
pub fn normalize(context: &str, source: &str, comment: Option<&str>) -> MessageKey {
    MessageKey::new(context, source, Disambiguation::from_option(comment))
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{:?}", self.context, self.source)?;
        if let Disambiguation::Comment(comment) = &self.comment {
            write!(f, " ({})", comment)?;
        }
        Ok(())
    }
}
