//! End-to-end checks of the `vntour` binary's startup order.

use std::process::Command;

fn vntour() -> Command {
    Command::new(env!("CARGO_BIN_EXE_vntour"))
}

#[test]
fn help_works_with_invalid_config_in_env() {
    let output = vntour()
        .arg("--help")
        .env("VNTOUR_TRENDS_GROUP_SIZE", "0")
        .output()
        .expect("run vntour");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}

#[test]
fn invalid_config_fails_a_real_command() {
    let missing_log =
        std::env::temp_dir().join(format!("vntour-missing-{}.log", uuid::Uuid::new_v4()));
    let output = vntour()
        .args(["monitor", "--once", "--log-file"])
        .arg(&missing_log)
        .env("VNTOUR_TRENDS_GROUP_SIZE", "0")
        .output()
        .expect("run vntour");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("VNTOUR_TRENDS_GROUP_SIZE"));
}

#[test]
fn monitor_once_renders_waiting_screen() {
    let missing_log =
        std::env::temp_dir().join(format!("vntour-missing-{}.log", uuid::Uuid::new_v4()));
    let output = vntour()
        .args(["monitor", "--once", "--log-file"])
        .arg(&missing_log)
        .output()
        .expect("run vntour");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("waiting for "));
}
