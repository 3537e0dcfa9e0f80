//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use plib::testing::{run_test, run_test_with_checker, TestPlan};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const QTERMINAL_NL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="nl">
<context>
    <name>QTerminal</name>
    <message>
        <location filename="qterminal.cpp" line="+88"/>
        <source>Edit %1</source>
        <translation>Bewerk %1</translation>
    </message>
</context>
<context>
    <name>QObject</name>
    <message>
        <location filename="format.cpp" line="+12"/>
        <source>b</source>
        <comment>short form for bold</comment>
        <translation>v</translation>
    </message>
</context>
</TS>
"#;

const SCAN: &str = r#"#: qterminal.cpp:97
msgctxt "QTerminal"
msgid "Edit %1"
msgstr ""

#. %1 is a file name, %2 a line number
#: urlfilter.cpp:40 urlfilter.cpp:52
msgctxt "UrlFilter"
msgid "Edit %1 at line %2"
msgstr ""
"#;

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn arg(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

fn reconcile_plan(old: &Path, scan: &Path, out: &Path, extra: &[&str]) -> TestPlan {
    let mut args = vec![String::from("reconcile")];
    args.extend(extra.iter().map(|s| s.to_string()));
    args.extend([arg(old), arg(scan), String::from("-o"), arg(out)]);
    TestPlan {
        cmd: String::from("tsmerge"),
        args,
        stdin_data: String::new(),
        expected_out: String::new(),
        expected_err: String::new(),
        expected_exit_code: 0,
    }
}

#[test]
fn test_reconcile_basic() {
    let dir = TempDir::new().unwrap();
    let old = write_fixture(&dir, "nl.ts", QTERMINAL_NL);
    let scan = write_fixture(&dir, "scan.pot", SCAN);
    let out = dir.path().join("out.ts");

    run_test(reconcile_plan(&old, &scan, &out, &[]));

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("<location filename=\"qterminal.cpp\" line=\"+97\"/>"));
    assert!(text.contains("<translation>Bewerk %1</translation>"));
    assert!(text.contains("<location filename=\"urlfilter.cpp\" line=\"+40\"/>"));
    assert!(text.contains("<location line=\"+12\"/>"));
    assert!(text.contains("<extracomment>%1 is a file name, %2 a line number</extracomment>"));
    assert!(text.contains("<translation type=\"obsolete\">v</translation>"));
    // the original catalog is untouched
    assert_eq!(fs::read_to_string(&old).unwrap(), QTERMINAL_NL);
}

#[test]
fn test_reconcile_twice_is_stable() {
    let dir = TempDir::new().unwrap();
    let old = write_fixture(&dir, "nl.ts", QTERMINAL_NL);
    let scan = write_fixture(&dir, "scan.pot", SCAN);
    let first = dir.path().join("first.ts");
    let second = dir.path().join("second.ts");

    run_test(reconcile_plan(&old, &scan, &first, &[]));
    run_test(reconcile_plan(&first, &scan, &second, &[]));

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_reconcile_in_place_with_prune() {
    let dir = TempDir::new().unwrap();
    let catalog = write_fixture(&dir, "nl.ts", QTERMINAL_NL);
    let scan = write_fixture(&dir, "scan.pot", SCAN);

    run_test(reconcile_plan(&catalog, &scan, &catalog, &["--prune"]));

    let text = fs::read_to_string(&catalog).unwrap();
    assert!(!text.contains("<name>QObject</name>"));
    assert!(text.contains("<name>UrlFilter</name>"));
}

#[test]
fn test_reconcile_new_language() {
    let dir = TempDir::new().unwrap();
    let old = dir.path().join("de.ts");
    let scan = write_fixture(&dir, "scan.pot", SCAN);

    run_test(reconcile_plan(&old, &scan, &old, &["-l", "de"]));

    let text = fs::read_to_string(&old).unwrap();
    assert!(text.contains("<TS version=\"2.1\" language=\"de\">"));
    assert_eq!(text.matches("type=\"unfinished\"").count(), 2);
}

#[test]
fn test_reconcile_missing_catalog() {
    let dir = TempDir::new().unwrap();
    let old = dir.path().join("de.ts");
    let scan = write_fixture(&dir, "scan.pot", SCAN);
    let out = dir.path().join("out.ts");

    run_test_with_checker(reconcile_plan(&old, &scan, &out, &[]), |_, output| {
        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.starts_with("tsmerge: "));
        assert!(stderr.contains("de.ts"));
    });
    assert!(!out.exists());
}

#[test]
fn test_reconcile_malformed_catalog() {
    let dir = TempDir::new().unwrap();
    let old = write_fixture(&dir, "nl.ts", "<TS version=\"2.1\"><context><name>X</name>");
    let scan = write_fixture(&dir, "scan.pot", SCAN);
    let out = dir.path().join("out.ts");

    run_test_with_checker(reconcile_plan(&old, &scan, &out, &[]), |_, output| {
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("malformed structure"));
    });
    assert!(!out.exists());
}

#[test]
fn test_reconcile_conflicting_comment_warns() {
    let dir = TempDir::new().unwrap();
    let old = write_fixture(&dir, "nl.ts", QTERMINAL_NL);
    let scan = write_fixture(
        &dir,
        "scan.pot",
        r#"#: format.cpp:30
msgctxt "QObject|short form for bold"
msgid "b"
msgstr ""

#: format.cpp:30
msgctxt "QObject|bold"
msgid "b"
msgstr ""
"#,
    );
    let out = dir.path().join("out.ts");

    run_test_with_checker(reconcile_plan(&old, &scan, &out, &[]), |_, output| {
        assert_eq!(output.status.code(), Some(0));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.starts_with("tsmerge: warning: "));
        assert_eq!(stderr.lines().count(), 1);
    });

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("<comment>short form for bold</comment>"));
    assert!(!text.contains("<comment>bold</comment>"));
}
