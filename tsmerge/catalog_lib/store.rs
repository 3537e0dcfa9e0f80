//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Reading and writing catalogs on disk
//!
//! Writes go to a temporary file in the target directory, which is renamed
//! over the target once complete.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::catalog_lib::catalog::Catalog;
use crate::catalog_lib::error::{Error, Result, ValidationError};
use crate::catalog_lib::location::DecodeOptions;
use crate::catalog_lib::reconcile::{reconcile, ReconcileOptions, Reconciled};
use crate::catalog_lib::scan::ScanSet;
use crate::catalog_lib::ts_file;
use crate::catalog_lib::validate::validate;

/// Load a catalog file
pub fn read_catalog(path: &Path) -> Result<Catalog> {
    read_catalog_with(path, DecodeOptions::default())
}

/// Load a catalog file, with explicit location decoding options
pub fn read_catalog_with(path: &Path, options: DecodeOptions) -> Result<Catalog> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    ts_file::load_with(&bytes, options).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and merge a scanner output file
pub fn read_scan(path: &Path) -> Result<ScanSet> {
    let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
    ScanSet::parse_from(io::BufReader::new(file)).map_err(|source| Error::ScanInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a catalog, replacing `path` only once the whole file is written
pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    let written = {
        let mut out = io::BufWriter::new(tmp.as_file_mut());
        ts_file::write_to(&mut out, catalog).and_then(|_| out.flush())
    };
    written
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// Reconcile the catalog at `old` with the scan at `scan`, writing to `out`
///
/// A missing `old` catalog is only accepted when `language` is given; a
/// fresh catalog for that language is started instead. `decode` controls
/// how strictly the locations of `old` are checked.
pub fn run_reconcile(
    old: &Path,
    scan: &Path,
    out: &Path,
    language: Option<&str>,
    decode: DecodeOptions,
    options: &ReconcileOptions,
) -> Result<Reconciled> {
    let mut catalog = match read_catalog_with(old, decode) {
        Ok(catalog) => catalog,
        Err(Error::Io { source, .. })
            if source.kind() == io::ErrorKind::NotFound && language.is_some() =>
        {
            log::info!("{}: not found, starting a new catalog", old.display());
            Catalog::new(None)
        }
        Err(e) => return Err(e),
    };
    if let Some(language) = language {
        catalog.language = Some(language.to_string());
    }

    for diagnostic in validate(&catalog) {
        log::warn!("{}: {}", old.display(), diagnostic);
    }

    let scan = read_scan(scan)?;
    let result = reconcile(catalog, &scan, options);

    let diagnostics = validate(&result.catalog);
    if diagnostics.iter().any(|d| d.is_error()) {
        return Err(ValidationError {
            diagnostics,
            catalog: Box::new(result.catalog),
        }
        .into());
    }
    for diagnostic in &diagnostics {
        log::warn!("{}: {}", out.display(), diagnostic);
    }

    write_catalog(out, &result.catalog)?;
    Ok(result)
}
