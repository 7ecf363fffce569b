use assert_cmd::Command;
use predicates::str::contains;

fn authflow() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("authflow"));
    cmd.env_remove("LOGIN_URL")
        .env_remove("CPF")
        .env_remove("SENHA")
        .env_remove("AUTHFLOW_CONFIG_DIR");
    cmd
}

#[test]
fn test_cli_help() {
    authflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("OTP"));
}

#[test]
fn test_cli_version() {
    authflow().arg("--version").assert().success();
}

#[test]
fn test_conflicting_mode_flags_are_rejected() {
    authflow().args(["--headless", "--headed"]).assert().failure();
}

#[test]
fn test_missing_credentials_exit_with_config_status() {
    let dir = tempfile::tempdir().unwrap();
    authflow()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(2)
        .stderr(contains("LOGIN_URL"));
}

#[test]
fn test_missing_override_file_exits_with_config_status() {
    let dir = tempfile::tempdir().unwrap();
    authflow()
        .current_dir(dir.path())
        .args(["--config", "no-such-file.toml"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("no-such-file.toml"));
}
