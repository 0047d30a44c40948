use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const HELLO_A: &str = "슝! 좌아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아아악.\n비비ㅋ따잇!!\n";

fn write_source(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("input.jwak");
    fs::write(&path, contents).expect("write input");
    path
}

#[test]
fn emits_llvm_ir_by_default() {
    let dir = tempdir().expect("tempdir");
    let input_path = write_source(dir.path(), HELLO_A);
    let output_path = dir.path().join("out.ll");

    Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--target-triple")
        .arg("x86_64-unknown-linux-gnu")
        .assert()
        .success();

    let ir = fs::read_to_string(&output_path).expect("read ir");
    assert!(ir.contains("define i32 @main"));
    assert!(ir.contains("target triple = \"x86_64-unknown-linux-gnu\""));
    assert!(ir.contains("line_1:"));
}

#[test]
fn compiles_and_runs_wasm() {
    let dir = tempdir().expect("tempdir");
    let input_path = write_source(dir.path(), HELLO_A);
    let output_path = dir.path().join("nested").join("out.wasm");

    Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--emit")
        .arg("wasm")
        .arg("--run")
        .assert()
        .success()
        .stdout(predicate::eq("A"));

    assert!(output_path.exists(), "wasm output was not created");
}

#[test]
fn run_reads_program_input_from_stdin() {
    let dir = tempdir().expect("tempdir");
    let input_path = write_source(dir.path(), "순수ㅋ따잇\n비비ㅋ따잇 비비ㅋ보호막따잇\n");
    let output_path = dir.path().join("out.wasm");

    Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--emit")
        .arg("wasm")
        .arg("--run")
        .write_stdin("!")
        .assert()
        .success()
        .stdout(predicate::eq("!33"));
}

#[test]
fn reads_source_from_stdin_when_input_is_omitted() {
    let dir = tempdir().expect("tempdir");
    let output_path = dir.path().join("out.ll");

    Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--output")
        .arg(&output_path)
        .write_stdin("슝 좍\n")
        .assert()
        .success();

    let ir = fs::read_to_string(&output_path).expect("read ir");
    assert!(ir.contains("store i32 0, ptr %cursor"));
}

#[test]
fn raw_mode_keeps_punctuation_and_fails_to_lex() {
    let dir = tempdir().expect("tempdir");
    let input_path = write_source(dir.path(), HELLO_A);
    let output_path = dir.path().join("out.ll");

    Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--raw")
        .assert()
        .failure()
        .stderr(predicate::str::contains("lex error at byte"));

    assert!(!output_path.exists(), "no output expected on failure");
}

#[test]
fn reports_goto_out_of_range() {
    let dir = tempdir().expect("tempdir");
    let input_path = write_source(dir.path(), "슝\n에잇ㅋㅋㅋ\n");
    let output_path = dir.path().join("out.ll");

    Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn rejects_unknown_emit_format() {
    let dir = tempdir().expect("tempdir");
    let input_path = write_source(dir.path(), "슝\n");

    Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(dir.path().join("out.bin"))
        .arg("--emit")
        .arg("elf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported emit format: elf"));
}

#[test]
fn run_flag_with_llvm_output_is_logged_as_warning() {
    let dir = tempdir().expect("tempdir");
    let input_path = write_source(dir.path(), HELLO_A);
    let output_path = dir.path().join("out.ll");

    let output = Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--run")
        .output()
        .expect("run jwak");

    assert!(output.status.success());
    let logged = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(logged.contains("WARN"));
    assert!(logged.contains("--run is ignored for non-wasm outputs"));
}

#[test]
fn escapes_quotes_in_module_name() {
    let dir = tempdir().expect("tempdir");
    let input_path = write_source(dir.path(), HELLO_A);
    let output_path = dir.path().join("out.ll");

    Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--module-name")
        .arg("a\"b")
        .assert()
        .success();

    let ir = fs::read_to_string(&output_path).expect("read ir");
    assert!(ir.contains("source_filename = \"a\\22b\""));
}

#[test]
fn rejects_conditional_split_across_lines() {
    let dir = tempdir().expect("tempdir");
    let input_path = write_source(dir.path(), "슝\n하는재미 비비ㅋ따잇\n에잇ㅋㅋ\n");
    let output_path = dir.path().join("out.ll");

    Command::cargo_bin("jwak")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed conditional"));
}
