use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn oolong_binary() -> &'static str {
    env!("CARGO_BIN_EXE_oolong")
}

#[test]
fn accepts_a_valid_source_file() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("valid.oo");
    fs::write(
        &path,
        "object Point:\n    int x\n    int y\n\nfun make() > Point:\n    return Point(x: 1, y: 2)\n",
    )
    .expect("write source");

    let output = Command::new(oolong_binary())
        .arg(&path)
        .output()
        .expect("run oolong");
    assert!(
        output.status.success(),
        "expected success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn reports_type_errors_with_location() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("mismatch.oo");
    fs::write(&path, "fun get() > int:\n    return \"hi\"\n").expect("write source");

    let output = Command::new(oolong_binary())
        .arg(&path)
        .output()
        .expect("run oolong");
    assert!(!output.status.success(), "expected non-zero exit");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("type mismatch; expected int, but got str instead"),
        "unexpected stderr: {stderr}"
    );
    assert!(stderr.contains("-->"), "expected a location line: {stderr}");
    assert!(stderr.contains(":2:"), "expected line 2 in location: {stderr}");
    assert!(stderr.contains('^'), "expected a caret line: {stderr}");
}

#[test]
fn reports_missing_files() {
    let output = Command::new(oolong_binary())
        .arg("does_not_exist.oo")
        .output()
        .expect("run oolong");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("could not open file"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn emits_the_parsed_tree() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("tree.oo");
    fs::write(
        &path,
        "object Box[T]:\n    T value\n\nfun get() > int:\n    return 1\n",
    )
    .expect("write source");

    let output = Command::new(oolong_binary())
        .arg(&path)
        .args(["--emit", "ast"])
        .output()
        .expect("run oolong");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("object Box[T]:"), "unexpected stdout: {stdout}");
    assert!(stdout.contains("    T value"), "unexpected stdout: {stdout}");
    assert!(
        stdout.contains("fun get() > int:"),
        "unexpected stdout: {stdout}"
    );
    assert!(stdout.contains("    return 1"), "unexpected stdout: {stdout}");
}

#[test]
fn dumps_tokens_on_request() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("tokens.oo");
    fs::write(&path, "fun get() > int:\n    return 1\n").expect("write source");

    let output = Command::new(oolong_binary())
        .arg(&path)
        .arg("--dump-tokens")
        .output()
        .expect("run oolong");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Fun"), "unexpected stdout: {stdout}");
    assert!(stdout.contains("Indent"), "unexpected stdout: {stdout}");
}
