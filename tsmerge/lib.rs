//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! posixutils-tsmerge library
//!
//! This library provides translation catalog maintenance:
//! - loading and writing Qt Linguist (.ts) catalogs with relative locations
//! - reading scanner output (POT-style extraction lists)
//! - reconciling a fresh scan against an existing catalog
//! - validating catalog invariants

pub mod catalog_lib;

pub use catalog_lib::error::{Error, Result};
