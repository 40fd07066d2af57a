mod support;

use support::{run_tool, stderr, stdout};
use tempfile::tempdir;

const EXE: &str = env!("CARGO_BIN_EXE_validator-deploy");

#[test]
fn copies_into_missing_directories() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("model.json");
    std::fs::write(&src, b"{\"kind\":\"gradient_boosting\"}").unwrap();
    let dest = dir.path().join("deploy").join("live").join("model.json");

    let output = run_tool(
        EXE,
        dir.path(),
        &["--src", src.to_str().unwrap(), "--dest", dest.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(std::fs::read(&dest).unwrap(), std::fs::read(&src).unwrap());
    let out = stdout(&output);
    assert!(out.starts_with("Copied "), "stdout: {out}");
    assert!(out.contains("model.json"));
}

#[test]
fn redeploy_overwrites_previous_copy() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("model.json");
    let dest = dir.path().join("out").join("model.json");
    std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
    std::fs::write(&dest, b"old model").unwrap();
    std::fs::write(&src, b"new").unwrap();

    let args = ["--src", src.to_str().unwrap(), "--dest", dest.to_str().unwrap()];
    assert!(run_tool(EXE, dir.path(), &args).status.success());
    assert!(run_tool(EXE, dir.path(), &args).status.success());
    assert_eq!(std::fs::read(&dest).unwrap(), b"new");
}

#[test]
fn missing_source_exits_with_error() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("out").join("model.json");
    let output = run_tool(
        EXE,
        dir.path(),
        &[
            "--src",
            dir.path().join("absent.json").to_str().unwrap(),
            "--dest",
            dest.to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("absent.json"));
    assert!(!dest.exists());
}

#[test]
fn missing_flag_is_a_usage_error() {
    let dir = tempdir().unwrap();
    let output = run_tool(EXE, dir.path(), &["--src", "model.json"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn deploying_into_own_directory_keeps_source_intact() {
    let dir = tempdir().unwrap();
    let models = dir.path().join("models");
    std::fs::create_dir_all(&models).unwrap();
    let src = models.join("m.json");
    std::fs::write(&src, b"trained model").unwrap();

    let output = run_tool(
        EXE,
        dir.path(),
        &["--src", src.to_str().unwrap(), "--dest", models.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("same file"));
    assert_eq!(std::fs::read(&src).unwrap(), b"trained model");
}
