//! Launch counters and rolling latency averages, per launcher instance.

use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Usage statistics for one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvironmentMetrics {
    pub usage_count: u64,
    /// Launches that have finished; the divisor for `average_latency`.
    pub completed_count: u64,
    pub last_used: Option<DateTime<Utc>>,
    #[serde(rename = "average_latency_ms", serialize_with = "serialize_millis")]
    pub average_latency: Duration,
    pub error_count: u64,
}

/// Snapshot of everything a launcher has recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LauncherMetrics {
    pub total_launches: u64,
    pub successful_launches: u64,
    pub failed_launches: u64,
    pub last_launch: Option<DateTime<Utc>>,
    #[serde(rename = "average_latency_ms", serialize_with = "serialize_millis")]
    pub average_latency: Duration,
    pub environments: BTreeMap<String, EnvironmentMetrics>,
}

/// Mutex-guarded recorder; reads hand out deep copies.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    inner: Mutex<LauncherMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a launch attempt against `environment`.
    pub fn begin(&self, environment: &str) {
        let now = Utc::now();
        let mut metrics = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        metrics.total_launches += 1;
        metrics.last_launch = Some(now);

        let entry = metrics
            .environments
            .entry(environment.to_string())
            .or_default();
        entry.usage_count += 1;
        entry.last_used = Some(now);
    }

    /// Fold a finished launch into the counters and averages.
    pub fn finish(&self, environment: &str, elapsed: Duration, success: bool) {
        let mut metrics = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if success {
            metrics.successful_launches += 1;
        } else {
            metrics.failed_launches += 1;
        }
        let completed = metrics.successful_launches + metrics.failed_launches;
        metrics.average_latency = rolling_average(metrics.average_latency, completed, elapsed);

        let entry = metrics
            .environments
            .entry(environment.to_string())
            .or_default();
        entry.completed_count += 1;
        entry.average_latency =
            rolling_average(entry.average_latency, entry.completed_count, elapsed);
        if !success {
            entry.error_count += 1;
        }
    }

    pub fn snapshot(&self) -> LauncherMetrics {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// `avg' = (avg * (n - 1) + sample) / n`, where `n` counts the new sample.
pub fn rolling_average(average: Duration, count: u64, sample: Duration) -> Duration {
    if count <= 1 {
        return sample;
    }
    let count = u128::from(count);
    let nanos = (average.as_nanos() * (count - 1) + sample.as_nanos()) / count;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u128(duration.as_millis())
}
