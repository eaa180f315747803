use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn cli(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("zh-flag-fix").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn classify_prints_the_script() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .args(["classify", "Simplified Chinese"])
        .assert()
        .success()
        .stdout("simplified\n");
    cli(home.path())
        .args(["classify", "日本語", "--code", "zh_Hant_TW"])
        .assert()
        .success()
        .stdout("traditional\ncode zh_Hant_TW -> TW\n");
}

#[test]
fn fix_rewrites_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.html");
    let output = dir.path().join("out.html");
    fs::write(
        &input,
        r#"<button><img src="/flags/CN.svg" alt="CN">繁體中文</button>"#,
    )
    .unwrap();

    cli(dir.path())
        .arg("fix")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--no-cache-bust")
        .assert()
        .success();
    let fixed = fs::read_to_string(&output).unwrap();
    assert!(fixed.contains("country-flag-icons/1x1/TW.svg\""), "{fixed}");
    assert!(fixed.contains(r#"alt="TW""#), "{fixed}");
}

#[test]
fn unreadable_input_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    cli(dir.path())
        .arg("fix")
        .arg(dir.path().join("missing.html"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("zh-flag-fix: Failed to read"));
}

#[cfg(target_os = "linux")]
#[test]
fn malformed_config_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("zh-flag-fix");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.json"), "{not json").unwrap();

    cli(home.path())
        .args(["--log-level", "debug", "classify", "zh-Hans"])
        .assert()
        .success()
        .stdout("simplified\n")
        .stderr(predicate::str::contains("Ignoring config file"));
}

#[cfg(target_os = "linux")]
#[test]
fn config_level_is_saved() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .args(["config", "--set-log-level", "trace"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""log_level": "trace""#));
    let saved = fs::read_to_string(home.path().join("zh-flag-fix/config.json")).unwrap();
    assert!(saved.contains(r#""log_level": "trace""#), "{saved}");
}

#[cfg(target_os = "linux")]
#[test]
fn unwritable_config_fails() {
    let home = tempfile::tempdir().unwrap();
    // A file where the config directory should be.
    fs::write(home.path().join("zh-flag-fix"), "").unwrap();
    cli(home.path())
        .args(["config", "--set-log-level", "warn"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("zh-flag-fix: Failed to write"));
}
