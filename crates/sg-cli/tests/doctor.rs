use assert_cmd::Command;

#[test]
fn doctor_cache_check_never_touches_the_matcher_binary() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("sg")
        .unwrap()
        .env("BACKUP_ROOT", dir.path().join("backups"))
        .args(["--no-color", "doctor", "cache"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("query cache"));
}

#[test]
fn config_show_prints_resolved_json() {
    let output = Command::cargo_bin("sg").unwrap().args(["config", "show"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("matcher_binary"));
}
