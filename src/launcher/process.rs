//! Launch pipeline shared by every launcher strategy.
//!
//! validate → resolve executable → build environment → dry-run report or
//! spawn → forward signals → wait (under the optional deadline).

use std::{
    collections::BTreeMap,
    io::{self, Write},
    path::Path,
    process::{ExitStatus, Stdio},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tokio::{
    process::{Child, Command},
    task::JoinHandle,
    time,
};
use tracing::{info, warn, Instrument};

use crate::{
    config::LauncherSection,
    lib::{env_builder::EnvVarBuilder, errors::LaunchError, telemetry::LaunchSpan},
};

use super::{
    DelegationStrategy, ExecutableResolver, LaunchParameters, LauncherMetrics, MetricsRecorder,
    ParameterError,
};

/// How a launch ended when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    DryRun,
    Exited(ChildExit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    pub code: i32,
    pub success: bool,
    pub signal_forwarded: bool,
}

impl LaunchOutcome {
    pub fn success(&self) -> bool {
        match self {
            LaunchOutcome::DryRun => true,
            LaunchOutcome::Exited(exit) => exit.success,
        }
    }

    fn exit_code(&self) -> Option<i32> {
        match self {
            LaunchOutcome::DryRun => None,
            LaunchOutcome::Exited(exit) => Some(exit.code),
        }
    }

    /// Apply the strategy's exit-code policy.
    ///
    /// Direct reports a non-zero child exit as [`LaunchError::Exit`].
    /// Pass-through terminates this process with the child's exact code.
    pub fn settle(self, strategy: DelegationStrategy) -> Result<(), LaunchError> {
        let exit = match self {
            LaunchOutcome::DryRun => return Ok(()),
            LaunchOutcome::Exited(exit) if exit.success => return Ok(()),
            LaunchOutcome::Exited(exit) => exit,
        };
        match strategy {
            DelegationStrategy::Direct => Err(LaunchError::Exit {
                code: exit.code,
                signal_forwarded: exit.signal_forwarded,
            }),
            DelegationStrategy::Passthrough => exit_with_child_code(exit.code),
        }
    }
}

fn exit_with_child_code(code: i32) -> ! {
    info!(
        target: "ccenv::launcher",
        exit_code = code,
        "Exiting with the Claude Code exit status"
    );
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    std::process::exit(code)
}

/// State shared by both strategies: the resolve-once executable, metrics and the mode flag.
#[derive(Debug)]
pub struct LauncherCore {
    resolver: ExecutableResolver,
    metrics: MetricsRecorder,
    passthrough: AtomicBool,
}

impl LauncherCore {
    pub fn new(resolver: ExecutableResolver, passthrough: bool) -> Self {
        Self {
            resolver,
            metrics: MetricsRecorder::new(),
            passthrough: AtomicBool::new(passthrough),
        }
    }

    pub fn from_settings(settings: &LauncherSection, passthrough: bool) -> Self {
        Self::new(
            ExecutableResolver::new(settings.executable.clone(), settings.alternatives.clone()),
            passthrough,
        )
    }

    pub fn resolver(&self) -> &ExecutableResolver {
        &self.resolver
    }

    pub fn set_passthrough(&self, enabled: bool) {
        self.passthrough.store(enabled, Ordering::SeqCst);
    }

    pub fn passthrough(&self) -> bool {
        self.passthrough.load(Ordering::SeqCst)
    }

    pub fn metrics(&self) -> LauncherMetrics {
        self.metrics.snapshot()
    }

    /// Strategy in effect for one request: the request flag or the launcher mode.
    pub fn strategy_for(&self, params: &LaunchParameters) -> DelegationStrategy {
        if params.passthrough_mode || self.passthrough() {
            DelegationStrategy::Passthrough
        } else {
            DelegationStrategy::Direct
        }
    }

    /// Run one launch and settle it with the effective strategy.
    pub async fn launch(&self, params: LaunchParameters) -> Result<(), LaunchError> {
        let strategy = self.strategy_for(&params);
        self.run(params, strategy).await?.settle(strategy)
    }

    /// Run one launch up to the child's exit, recording metrics.
    pub async fn run(
        &self,
        params: LaunchParameters,
        strategy: DelegationStrategy,
    ) -> Result<LaunchOutcome, LaunchError> {
        params.validate()?;
        let params = params.with_defaults();
        let environment_name = params
            .environment
            .as_ref()
            .map(|env| env.name.clone())
            .ok_or(ParameterError::MissingEnvironment)?;

        let span = LaunchSpan::start(&environment_name, strategy.as_str());
        let started = Instant::now();
        if params.metrics_enabled {
            self.metrics.begin(&environment_name);
        }

        let result = self.supervise(&params).instrument(span.span().clone()).await;

        let success = matches!(&result, Ok(outcome) if outcome.success());
        if params.metrics_enabled {
            self.metrics.finish(&environment_name, started.elapsed(), success);
        }
        match &result {
            Ok(outcome) if params.dry_run => span.finish("dry_run", outcome.exit_code()),
            Ok(outcome) if success => span.finish("succeeded", outcome.exit_code()),
            Ok(outcome) => span.finish("exited", outcome.exit_code()),
            Err(err) => span.finish(err.code(), None),
        }
        result
    }

    async fn supervise(&self, params: &LaunchParameters) -> Result<LaunchOutcome, LaunchError> {
        let executable = self.resolver.resolve().await?;

        let mut builder = EnvVarBuilder::new();
        builder
            .set_current_process_environment()
            .apply_profile(params.environment.as_ref())
            .set_variables(params.variables.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if params.dry_run {
            if params.verbose {
                let mut stderr = io::stderr().lock();
                let _ = write_dry_run_report(
                    &mut stderr,
                    &executable,
                    &params.arguments,
                    &builder.masked(),
                );
            }
            info!(
                target: "ccenv::launcher",
                executable = %executable.display(),
                args = params.arguments.len(),
                "Dry run requested; not starting Claude Code"
            );
            return Ok(LaunchOutcome::DryRun);
        }

        let subscription = SignalSubscription::install()?;
        let mut child = spawn_child(&executable, params, builder.build_map())?;
        let forwarder = subscription.forward_to(child.id());

        let waited = wait_with_deadline(&mut child, params.timeout).await;
        let signal_forwarded = forwarder.finish();
        let status = waited?;

        let exit = ChildExit {
            code: exit_code_of(status),
            success: status.success(),
            signal_forwarded,
        };
        info!(
            target: "ccenv::launcher",
            exit_code = exit.code,
            success = exit.success,
            signal_forwarded,
            "Claude Code exited"
        );
        Ok(LaunchOutcome::Exited(exit))
    }
}

fn spawn_child(
    executable: &Path,
    params: &LaunchParameters,
    vars: BTreeMap<String, String>,
) -> Result<Child, LaunchError> {
    let mut command = Command::new(executable);
    command
        .args(&params.arguments)
        .env_clear()
        .envs(vars)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    if let Some(dir) = &params.working_dir {
        command.current_dir(dir);
    }

    info!(
        target: "ccenv::launcher",
        executable = %executable.display(),
        args = params.arguments.len(),
        working_dir = params
            .working_dir
            .as_deref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default(),
        "Starting Claude Code"
    );

    command.spawn().map_err(|source| LaunchError::Spawn {
        path: executable.to_path_buf(),
        args: params.arguments.clone(),
        source,
    })
}

async fn wait_with_deadline(
    child: &mut Child,
    deadline: Option<Duration>,
) -> Result<ExitStatus, LaunchError> {
    let Some(limit) = deadline else {
        return child
            .wait()
            .await
            .map_err(|source| LaunchError::Wait { source });
    };

    match time::timeout(limit, child.wait()).await {
        Ok(status) => status.map_err(|source| LaunchError::Wait { source }),
        Err(_) => {
            warn!(
                target: "ccenv::launcher",
                timeout_secs = limit.as_secs(),
                "Claude Code exceeded its timeout; killing it"
            );
            if let Err(err) = child.kill().await {
                warn!(
                    target: "ccenv::launcher",
                    reason = %err,
                    "Failed to kill Claude Code after timeout"
                );
            }
            Err(LaunchError::Timeout {
                duration_secs: limit.as_secs(),
            })
        }
    }
}

/// Exit code for the status; signal deaths map to `128 + signo`.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Verbose dry-run report: executable, argv and the masked variables.
pub fn write_dry_run_report(
    out: &mut impl Write,
    executable: &Path,
    arguments: &[String],
    masked: &BTreeMap<String, String>,
) -> io::Result<()> {
    writeln!(out, "ccenv: dry-run: executable: {}", executable.display())?;
    writeln!(out, "ccenv: dry-run: arguments: {arguments:?}")?;
    writeln!(out, "ccenv: dry-run: environment:")?;
    for (key, value) in masked {
        writeln!(out, "  {key}={value}")?;
    }
    Ok(())
}

/// Interrupt/terminate subscription taken before the child starts.
struct SignalSubscription {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl SignalSubscription {
    #[cfg(unix)]
    fn install() -> Result<Self, LaunchError> {
        use tokio::signal::unix::{signal, SignalKind};

        let interrupt =
            signal(SignalKind::interrupt()).map_err(|source| LaunchError::SignalSetup { source })?;
        let terminate =
            signal(SignalKind::terminate()).map_err(|source| LaunchError::SignalSetup { source })?;
        Ok(Self {
            interrupt,
            terminate,
        })
    }

    #[cfg(not(unix))]
    fn install() -> Result<Self, LaunchError> {
        Ok(Self {})
    }

    /// Start forwarding to `pid`. `None` means the child was already reaped.
    #[cfg(unix)]
    fn forward_to(mut self, pid: Option<u32>) -> SignalForwarder {
        let forwarded = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&forwarded);
        let task = tokio::spawn(async move {
            let Some(pid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
                return;
            };
            loop {
                let signo = tokio::select! {
                    Some(()) = self.interrupt.recv() => libc::SIGINT,
                    Some(()) = self.terminate.recv() => libc::SIGTERM,
                    else => break,
                };
                flag.store(true, Ordering::SeqCst);
                // SAFETY: kill(2) has no memory-safety preconditions.
                let rc = unsafe { libc::kill(pid, signo) };
                if rc != 0 {
                    warn!(
                        target: "ccenv::launcher",
                        pid,
                        signal = signo,
                        reason = %io::Error::last_os_error(),
                        "Failed to forward signal"
                    );
                } else {
                    info!(target: "ccenv::launcher", pid, signal = signo, "Forwarded signal");
                }
            }
        });
        SignalForwarder { task, forwarded }
    }

    // The console already delivers Ctrl+C to the child; keep this process alive meanwhile.
    #[cfg(not(unix))]
    fn forward_to(self, _pid: Option<u32>) -> SignalForwarder {
        let forwarded = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&forwarded);
        let task = tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                flag.store(true, Ordering::SeqCst);
            }
        });
        SignalForwarder { task, forwarded }
    }
}

/// Running forwarder; the listener task is aborted when this is dropped.
struct SignalForwarder {
    task: JoinHandle<()>,
    forwarded: Arc<AtomicBool>,
}

impl SignalForwarder {
    /// Stop forwarding and report whether any signal was passed on.
    fn finish(self) -> bool {
        self.forwarded.load(Ordering::SeqCst)
    }
}

impl Drop for SignalForwarder {
    fn drop(&mut self) {
        self.task.abort();
    }
}
