#![cfg(unix)]

use std::time::{Duration, Instant};

use ccenv::{
    launcher::{DirectLauncher, Launcher},
    lib::errors::LaunchError,
};

use super::common::{environment, script, sh_launcher};

#[tokio::test]
async fn dry_run_never_spawns_and_counts_a_success() {
    let launcher = sh_launcher();
    let marker = tempfile::tempdir().expect("tempdir");
    let touched = marker.path().join("spawned");

    let params = script(
        environment("work"),
        &format!("touch {}", touched.display()),
    )
    .dry_run(true);
    launcher.launch(params).await.expect("dry run succeeds");

    assert!(!touched.exists(), "dry run must not start the process");
    let metrics = launcher.metrics();
    assert_eq!(metrics.total_launches, 1);
    assert_eq!(metrics.successful_launches, 1);
    assert_eq!(metrics.environments["work"].usage_count, 1);
}

#[tokio::test]
async fn non_zero_exit_is_reported_with_its_code() {
    let launcher = sh_launcher();
    let error = launcher
        .launch(script(environment("work"), "exit 7"))
        .await
        .expect_err("exit 7 is a failure");

    assert!(matches!(
        error,
        LaunchError::Exit {
            code: 7,
            signal_forwarded: false
        }
    ));
    assert_eq!(error.exit_code(), 7);

    let metrics = launcher.metrics();
    assert_eq!(metrics.failed_launches, 1);
    assert_eq!(metrics.environments["work"].error_count, 1);
}

#[tokio::test]
async fn profile_and_variables_reach_the_child() {
    let launcher = sh_launcher();
    let env = environment("work")
        .with_model("claude-sonnet-4")
        .with_header("x-team", "platform");
    let check = r#"test "$ANTHROPIC_BASE_URL" = https://api.example.com \
        && test "$ANTHROPIC_API_KEY" = sk-ant-REDACTED \
        && test "$ANTHROPIC_MODEL" = claude-opus-4 \
        && test "$ANTHROPIC_HEADER_xteam" = platform \
        && test "$EXTRA_FLAG" = 1 \
        && test -n "$PATH""#;

    let params = script(env, check)
        .with_variable("ANTHROPIC_MODEL", "claude-opus-4")
        .with_variable("EXTRA_FLAG", "1");
    launcher
        .launch(params)
        .await
        .expect("child sees the profile variables");
}

#[tokio::test]
async fn working_directory_is_applied() {
    let launcher = sh_launcher();
    let dir = tempfile::tempdir().expect("tempdir");
    let canonical = std::fs::canonicalize(dir.path()).expect("canonical path");

    let params = script(
        environment("work"),
        &format!("test \"$(pwd -P)\" = \"{}\"", canonical.display()),
    )
    .with_working_dir(dir.path());
    launcher.launch(params).await.expect("cwd matches");
}

#[tokio::test]
async fn timeout_kills_the_child() {
    let launcher = sh_launcher();
    let started = Instant::now();
    let error = launcher
        .launch(script(environment("work"), "sleep 5").with_timeout(Duration::from_secs(1)))
        .await
        .expect_err("sleep outlives the deadline");

    assert!(matches!(error, LaunchError::Timeout { duration_secs: 1 }));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(launcher.metrics().failed_launches, 1);
}

#[tokio::test]
async fn missing_executable_lists_every_candidate() {
    let launcher = DirectLauncher::with_executable(
        "ccenv-missing-claude",
        vec!["ccenv-missing-claude-code".into()],
    );
    let error = launcher
        .launch(script(environment("work"), "true"))
        .await
        .expect_err("nothing to run");

    match &error {
        LaunchError::ExecutableNotFound { name, tried } => {
            assert_eq!(name, "ccenv-missing-claude");
            assert_eq!(tried.len(), 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(error.exit_code(), 127);
    assert!(launcher.validate_claude_code().await.is_err());
}

#[tokio::test]
async fn two_argument_launch_uses_defaults() {
    let launcher = sh_launcher();
    launcher
        .launch_profile(
            environment("proxy"),
            vec!["-c".into(), "test \"$ANTHROPIC_BASE_URL\" = https://api.example.com".into()],
        )
        .await
        .expect("legacy form launches");

    let path = launcher.claude_code_path().await.expect("sh resolves");
    assert!(path.ends_with("sh"));
    assert_eq!(launcher.metrics().environments["proxy"].usage_count, 1);
}
