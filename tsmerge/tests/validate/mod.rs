//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use plib::testing::{run_test, TestPlan};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn create_catalog(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nl.ts");
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

fn validate_test(path: &PathBuf, expected_out: String, expected_exit_code: i32) {
    run_test(TestPlan {
        cmd: String::from("tsmerge"),
        args: vec![
            String::from("validate"),
            path.to_str().unwrap().to_string(),
        ],
        stdin_data: String::new(),
        expected_out,
        expected_err: String::new(),
        expected_exit_code,
    });
}

#[test]
fn test_validate_clean() {
    let (_dir, path) = create_catalog(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="nl">
<context>
    <name>QTerminal</name>
    <message>
        <location filename="qterminal.cpp" line="+88"/>
        <source>Edit %1</source>
        <translation>Bewerk %1</translation>
    </message>
    <message>
        <source>Quit</source>
        <translation type="obsolete">Afsluiten</translation>
    </message>
</context>
</TS>
"#,
    );
    validate_test(&path, String::new(), 0);
}

#[test]
fn test_validate_empty_finished() {
    let (_dir, path) = create_catalog(
        r#"<TS version="2.1">
<context>
    <name>QTerminal</name>
    <message>
        <location filename="qterminal.cpp" line="+88"/>
        <source>Edit %1</source>
        <translation></translation>
    </message>
</context>
</TS>
"#,
    );
    let expected = format!(
        "{}: error: QTerminal::\"Edit %1\": marked finished without a complete translation\n",
        path.display()
    );
    validate_test(&path, expected, 1);
}

#[test]
fn test_validate_warning_only() {
    let (_dir, path) = create_catalog(
        r#"<TS version="2.1">
<context>
    <name>QTerminal</name>
    <message>
        <source>Close</source>
        <translation type="unfinished"></translation>
    </message>
</context>
</TS>
"#,
    );
    let expected = format!(
        "{}: warning: QTerminal::\"Close\": no source location\n",
        path.display()
    );
    validate_test(&path, expected, 0);
}

#[test]
fn test_validate_strict_lines() {
    let (_dir, path) = create_catalog(
        r#"<TS version="2.1">
<context>
    <name>A</name>
    <message>
        <location filename="a.c" line="+30"/>
        <source>y</source>
        <translation>Y</translation>
    </message>
    <message>
        <location line="-10"/>
        <source>z</source>
        <translation>Z</translation>
    </message>
</context>
</TS>
"#,
    );
    validate_test(&path, String::new(), 0);

    run_test(TestPlan {
        cmd: String::from("tsmerge"),
        args: vec![
            String::from("validate"),
            String::from("--strict-lines"),
            path.to_str().unwrap().to_string(),
        ],
        stdin_data: String::new(),
        expected_out: format!(
            "{}: warning: A::\"z\": a.c: line chain moves back from 30 to 20\n",
            path.display()
        ),
        expected_err: String::new(),
        expected_exit_code: 0,
    });
}
