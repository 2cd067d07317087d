#![cfg(unix)]

use std::sync::Arc;

use ccenv::launcher::Launcher;

use super::common::{environment, script, sh_launcher};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_launches_keep_metrics_consistent() {
    let launcher = Arc::new(sh_launcher());
    let profiles = ["alpha", "beta", "gamma", "delta"];

    let handles = (0..12)
        .map(|index| {
            let launcher = Arc::clone(&launcher);
            let name = profiles[index % profiles.len()];
            let body = if index % 3 == 0 { "exit 3" } else { "exit 0" };
            tokio::spawn(async move { launcher.launch(script(environment(name), body)).await })
        })
        .collect::<Vec<_>>();

    let mut failures = 0;
    for handle in handles {
        if handle.await.expect("task joins").is_err() {
            failures += 1;
        }
    }

    let metrics = launcher.metrics();
    assert_eq!(failures, 4);
    assert_eq!(metrics.total_launches, 12);
    assert_eq!(metrics.successful_launches, 8);
    assert_eq!(metrics.failed_launches, 4);
    assert_eq!(metrics.environments.len(), profiles.len());
    for name in profiles {
        assert_eq!(metrics.environments[name].usage_count, 3);
    }
    let errors: u64 = metrics.environments.values().map(|env| env.error_count).sum();
    assert_eq!(errors, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_profiles_each_get_one_entry() {
    let launcher = Arc::new(sh_launcher());
    let count = 16;

    let handles = (0..count)
        .map(|index| {
            let launcher = Arc::clone(&launcher);
            tokio::spawn(async move {
                launcher
                    .launch(script(environment(&format!("profile-{index}")), "true"))
                    .await
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.await.expect("task joins").expect("launch succeeds");
    }

    let metrics = launcher.metrics();
    assert_eq!(metrics.total_launches, count as u64);
    assert_eq!(metrics.environments.len(), count);
    assert!(metrics
        .environments
        .values()
        .all(|entry| entry.usage_count == 1 && entry.error_count == 0));
}
