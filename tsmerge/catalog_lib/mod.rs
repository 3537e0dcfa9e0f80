//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Translation catalog library
//!
//! This module provides the message key model, the catalog data model,
//! the relative location codec, the .ts reader/writer, the scanner input
//! reader, the reconciliation engine and the catalog validator.

pub mod catalog;
pub mod error;
pub mod key;
pub mod location;
pub mod message;
pub mod reconcile;
pub mod scan;
pub mod store;
pub mod ts_file;
pub mod validate;
