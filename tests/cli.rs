//! Command-line tests: run the built binary and check files, output and exit codes.
#![cfg(feature = "cli")]

use dbc_tools::{Database, dbc, encode, from_file};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn dbc_tools(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dbc_tools"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn write_reference(dir: &Path, name: &str, edit: impl FnOnce(&mut Database)) {
    let mut db: Database = dbc::reference_database();
    edit(&mut db);
    fs::write(dir.join(name), encode(&db).unwrap()).unwrap();
}

#[test]
fn test_generate_writes_reference_database() {
    let dir = tempfile::tempdir().unwrap();

    let output = dbc_tools(dir.path(), &["generate"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "DBC file created successfully!\n");

    let text: String = fs::read_to_string(dir.path().join("example.dbc")).unwrap();
    assert_eq!(text, encode(&dbc::reference_database()).unwrap());
    assert!(text.contains("BO_ 291 EngineData: 8 ECU1\n"));
    assert!(text.contains(
        " SG_ RPM : 0|16@1+0.250000 (0.250000,0.000000) [0.000000|16383.750000] \"rpm\" ECU2\n"
    ));
}

#[test]
fn test_generate_standard_into_new_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = dbc_tools(
        dir.path(),
        &["generate", "-o", "out/network.dbc", "-d", "standard"],
    );
    assert!(output.status.success());

    let path = dir.path().join("out").join("network.dbc");
    let text: String = fs::read_to_string(&path).unwrap();
    assert!(text.contains("BU_: ECU1 ECU2\n"));
    assert_eq!(from_file(path.to_str().unwrap()).unwrap(), dbc::reference_database());
}

#[test]
fn test_generate_rejects_wrong_extension() {
    let dir = tempfile::tempdir().unwrap();
    let output = dbc_tools(dir.path(), &["generate", "-o", "network.txt"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(!dir.path().join("network.txt").exists());
}

#[test]
fn test_check_strict_fails_on_warnings() {
    let dir = tempfile::tempdir().unwrap();
    write_reference(dir.path(), "clean.dbc", |_| {});
    write_reference(dir.path(), "wide_id.dbc", |db| db.messages[0].id = 0x800);

    let output = dbc_tools(dir.path(), &["check", "--strict", "clean.dbc"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "clean.dbc: 2 nodes, 1 messages, 1 signals, 0 warnings\n"
    );

    let output = dbc_tools(dir.path(), &["check", "wide_id.dbc"]);
    assert!(output.status.success());

    let output = dbc_tools(dir.path(), &["check", "--strict", "wide_id.dbc"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).starts_with("warning[standard-id-range] EngineData:"));
}

#[test]
fn test_check_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("broken.dbc"),
        "VERSION \"1.0\"\n\nBU_: ECU1\n\nBO_ 1 A: 8 ECU1\n SG_ S : 0|8@3+ (1,0) [0|1] \"\" ECU1\n",
    )
    .unwrap();

    let output = dbc_tools(dir.path(), &["check", "broken.dbc"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr: String = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("line 6: unknown byte-order tag '3'"), "{stderr}");
}

#[test]
fn test_convert_and_busload() {
    let dir = tempfile::tempdir().unwrap();
    write_reference(dir.path(), "legacy.dbc", |db| {
        db.messages[0].cycle_time = Some(10);
        db.messages[0].send_type = Some("Cyclic".to_string());
    });

    let output = dbc_tools(dir.path(), &["convert", "legacy.dbc", "standard.dbc"]);
    assert!(output.status.success());
    let text: String = fs::read_to_string(dir.path().join("standard.dbc")).unwrap();
    assert!(text.contains("\tSG_ RPM : 0|16@1+ (0.25,0) [0|16383.75] \"rpm\"  ECU2\n"));
    assert!(text.contains("BA_ \"GenMsgCycleTime\" BO_ 291 10;\n"));

    let output = dbc_tools(dir.path(), &["busload", "standard.dbc"]);
    assert!(output.status.success());
    let report: String = stdout(&output);
    assert!(report.contains("CAN 500 kbit/s: 2.68% (low)\n"), "{report}");
    assert!(report.contains("CAN 1 Mbit/s: 1.34% (low)\n"), "{report}");
    assert!(!report.contains("without cycle time"));
}

#[test]
fn test_inspect_then_import() {
    let dir = tempfile::tempdir().unwrap();
    write_reference(dir.path(), "network.dbc", |db| {
        db.comment = "Powertrain".to_string();
    });

    let output = dbc_tools(dir.path(), &["inspect", "network.dbc"]);
    assert!(output.status.success());
    fs::write(dir.path().join("network.json"), &output.stdout).unwrap();

    let output = dbc_tools(dir.path(), &["import", "network.json", "copy.dbc"]);
    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(dir.path().join("copy.dbc")).unwrap(),
        fs::read_to_string(dir.path().join("network.dbc")).unwrap()
    );
}
