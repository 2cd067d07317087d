#![cfg(unix)]

use std::{
    path::Path,
    process::{Child, Command, ExitStatus, Output, Stdio},
    thread,
    time::{Duration, Instant},
};

use super::common::{fixture, write_config, BINARY_PATH, SECRET_KEY};

fn run(args: &[&str]) -> Output {
    Command::new(BINARY_PATH)
        .args(args)
        .env_remove("CCENV_CONFIG_PATH")
        .output()
        .expect("ccenv binary runs")
}

#[test]
fn passthrough_mirrors_child_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "sh").expect("config written");
    let config = config.to_str().expect("utf-8 path");

    let output = run(&["--config", config, "--passthrough", "--", "-c", "exit 7"]);
    assert_eq!(output.status.code(), Some(7));
}

/// Start `ccenv --passthrough` running a shell that runs `action` on `signal` and loops.
/// Returns once the child has installed its trap.
fn spawn_trapping_child(config: &Path, action: &str, signal: &str, ready: &Path) -> Child {
    let body = format!(
        "trap '{action}' {signal}; touch '{}'; while :; do sleep 0.1; done",
        ready.display()
    );
    let mut child = Command::new(BINARY_PATH)
        .arg("--config")
        .arg(config)
        .args(["--passthrough", "--", "-c", &body])
        .env_remove("CCENV_CONFIG_PATH")
        .stdin(Stdio::null())
        .spawn()
        .expect("ccenv binary starts");

    let deadline = Instant::now() + Duration::from_secs(10);
    while !ready.exists() {
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("child never became ready");
        }
        thread::sleep(Duration::from_millis(20));
    }
    child
}

fn wait_with_deadline(child: &mut Child) -> ExitStatus {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(status) = child.try_wait().expect("ccenv status") {
            return status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("ccenv did not exit after the signal");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn send_signal(child: &Child, signo: libc::c_int) {
    let pid = libc::pid_t::try_from(child.id()).expect("pid fits");
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid, signo) };
    assert_eq!(rc, 0, "kill failed");
}

#[test]
fn sigterm_reaches_child_and_its_code_is_mirrored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "sh").expect("config written");
    let ready = dir.path().join("ready");

    let mut child = spawn_trapping_child(&config, "exit 42", "TERM", &ready);
    send_signal(&child, libc::SIGTERM);
    assert_eq!(wait_with_deadline(&mut child).code(), Some(42));
}

#[test]
fn clean_exit_after_forwarded_sigint_is_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "sh").expect("config written");
    let ready = dir.path().join("ready");

    let mut child = spawn_trapping_child(&config, "exit 0", "INT", &ready);
    send_signal(&child, libc::SIGINT);
    assert_eq!(wait_with_deadline(&mut child).code(), Some(0));
}

#[test]
fn direct_mode_reports_exit_and_mirrors_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "sh").expect("config written");
    let config = config.to_str().expect("utf-8 path");

    let output = run(&["--config", config, "--", "-c", "exit 5"]);
    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exited with status 5"), "stderr: {stderr}");
}

#[test]
fn successful_launch_exits_zero_with_model_override() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "sh").expect("config written");
    let config = config.to_str().expect("utf-8 path");

    let output = run(&[
        "--config",
        config,
        "--model",
        "claude-opus-4",
        "--set",
        "EXTRA=yes",
        "--",
        "-c",
        r#"test "$ANTHROPIC_MODEL" = claude-opus-4 && test "$EXTRA" = yes"#,
    ]);
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn missing_executable_exits_127_with_hints() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "ccenv-missing-claude").expect("config written");
    let config = config.to_str().expect("utf-8 path");

    let output = run(&["--config", config, "--", "--version"]);
    assert_eq!(output.status.code(), Some(127));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hint:"), "stderr: {stderr}");
}

#[test]
fn empty_arguments_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "sh").expect("config written");
    let config = config.to_str().expect("utf-8 path");

    let output = run(&["--config", config]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("after `--`"), "stderr: {stderr}");
}

#[test]
fn list_masks_api_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "sh").expect("config written");
    let config = config.to_str().expect("utf-8 path");

    let output = run(&["--config", config, "list"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"work\""));
    assert!(!stdout.contains(SECRET_KEY));
}

#[test]
fn config_path_from_environment_variable() {
    let output = Command::new(BINARY_PATH)
        .arg("list")
        .env("CCENV_CONFIG_PATH", fixture("tests/fixtures/config_valid.toml"))
        .output()
        .expect("ccenv binary runs");
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"proxy\""));
}

#[test]
fn invalid_config_exits_one() {
    let output = run(&[
        "--config",
        &fixture("tests/fixtures/config_missing_api_key.toml"),
        "list",
    ]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn show_metrics_prints_before_passthrough_exit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "sh").expect("config written");
    let config = config.to_str().expect("utf-8 path");

    let output = run(&[
        "--config",
        config,
        "--passthrough",
        "--show-metrics",
        "--",
        "-c",
        "exit 3",
    ]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"failed_launches\": 1"), "stderr: {stderr}");
}
