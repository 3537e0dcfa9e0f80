//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! tsmerge - reconcile translation catalogs with extracted source strings
//!
//! Merges the output of a string extractor into a TS translation catalog,
//! keeping existing translations and marking strings that disappeared
//! from the source as obsolete.

use clap::{Args, Parser, Subcommand};
use gettextrs::{LocaleCategory, bind_textdomain_codeset, gettext, setlocale, textdomain};
use std::path::PathBuf;
use std::process::exit;
use tsmerge::catalog_lib::location::DecodeOptions;
use tsmerge::catalog_lib::reconcile::{PrunePolicy, ReconcileOptions};
use tsmerge::catalog_lib::store::{read_catalog_with, run_reconcile};
use tsmerge::catalog_lib::validate::validate;
use tsmerge::Error;

#[derive(Args, Debug)]
struct ReconcileArgs {
    #[arg(short = 'o', long = "output", help = gettext("Output catalog file"))]
    output: PathBuf,

    #[arg(short = 'l', long = "language", help = gettext("Target language, used when the old catalog does not exist"))]
    language: Option<String>,

    #[arg(long, help = gettext("Remove obsolete and vanished messages"))]
    prune: bool,

    #[arg(long, value_name = "N", conflicts_with = "prune", help = gettext("Remove messages that stayed vanished for N scans"))]
    prune_after: Option<u32>,

    #[arg(short = 'v', long, help = gettext("Print a summary of the changes"))]
    verbose: bool,

    #[arg(long, help = gettext("Warn about locations that move backwards within a file"))]
    strict_lines: bool,

    #[arg(help = gettext("Existing catalog"))]
    old: PathBuf,

    #[arg(help = gettext("Extractor output"))]
    scan: PathBuf,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[arg(long, help = gettext("Warn about locations that move backwards within a file"))]
    strict_lines: bool,

    #[arg(help = gettext("Catalog to check"))]
    catalog: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge extractor output into a catalog
    Reconcile(ReconcileArgs),
    /// Check a catalog for consistency errors
    Validate(ValidateArgs),
}

/// tsmerge - reconcile translation catalogs with extracted source strings
#[derive(Parser, Debug)]
#[command(
    version,
    about = gettext("tsmerge - reconcile translation catalogs with extracted source strings")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn prune_policy(args: &ReconcileArgs) -> PrunePolicy {
    match (args.prune, args.prune_after) {
        (true, _) => PrunePolicy::Immediately,
        (false, Some(passes)) => PrunePolicy::AfterVanishedPasses(passes),
        (false, None) => PrunePolicy::Keep,
    }
}

fn cmd_reconcile(args: &ReconcileArgs) -> Result<(), Error> {
    let options = ReconcileOptions {
        prune: prune_policy(args),
    };
    let result = run_reconcile(
        &args.old,
        &args.scan,
        &args.output,
        args.language.as_deref(),
        DecodeOptions {
            monotonic: args.strict_lines,
        },
        &options,
    )?;

    for warning in &result.warnings {
        eprintln!("tsmerge: {}: {}", gettext("warning"), warning);
    }
    if args.verbose {
        eprintln!("{}", result.stats);
    }
    Ok(())
}

fn cmd_validate(args: &ValidateArgs) -> Result<bool, Error> {
    let decode = DecodeOptions {
        monotonic: args.strict_lines,
    };
    let catalog = read_catalog_with(&args.catalog, decode)?;
    let diagnostics = validate(&catalog);
    for diagnostic in &diagnostics {
        println!("{}: {}", args.catalog.display(), diagnostic);
    }
    Ok(!diagnostics.iter().any(|d| d.is_error()))
}

fn main() {
    setlocale(LocaleCategory::LcAll, "");
    if textdomain("posixutils-rs").is_err() {
        // Ignore error - translation may not be available
    }
    let _ = bind_textdomain_codeset("posixutils-rs", "UTF-8");

    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Reconcile(args) => cmd_reconcile(args).map(|_| true),
        Commands::Validate(args) => cmd_validate(args),
    };

    match result {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(Error::Validation(e)) => {
            for diagnostic in e.diagnostics.iter().filter(|d| d.is_error()) {
                eprintln!("tsmerge: {}", diagnostic);
            }
            eprintln!("tsmerge: {}", e);
            exit(1);
        }
        Err(e) => {
            eprintln!("tsmerge: {}", e);
            exit(e.exit_code());
        }
    }
}
