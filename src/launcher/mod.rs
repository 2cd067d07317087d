//! Launching Claude Code with a selected environment.
//!
//! Two strategies share the [`Launcher`] contract: [`DirectLauncher`]
//! reports a non-zero exit as an error, [`PassthroughLauncher`] makes this
//! process exit with the child's code. Both run the pipeline in [`process`].
use std::{future::Future, path::PathBuf};

use crate::{
    config::{Environment, LauncherSection},
    lib::errors::LaunchError,
};

pub mod direct;
pub mod metrics;
pub mod params;
pub mod passthrough;
pub mod plan;
pub mod process;
pub mod resolve;

pub use direct::DirectLauncher;
pub use metrics::{rolling_average, EnvironmentMetrics, LauncherMetrics, MetricsRecorder};
pub use params::{LaunchParameters, ParameterError, DEFAULT_TIMEOUT, MAX_TIMEOUT, MIN_TIMEOUT};
pub use passthrough::PassthroughLauncher;
pub use plan::{DelegationPlan, DelegationStrategy, LaunchOptions};
pub use process::{exit_code_of, ChildExit, LaunchOutcome, LauncherCore};
pub use resolve::ExecutableResolver;

/// Shared launch contract; callers swap strategies without branching.
///
/// Implementors only expose their [`LauncherCore`]; every operation runs
/// through it.
pub trait Launcher: Send + Sync {
    fn core(&self) -> &LauncherCore;

    /// Validate, resolve, build the environment and run Claude Code once.
    fn launch(
        &self,
        params: LaunchParameters,
    ) -> impl Future<Output = Result<(), LaunchError>> + Send {
        self.core().launch(params)
    }

    /// Launch from a plan produced by argument parsing.
    fn launch_with_delegation(
        &self,
        plan: &DelegationPlan,
    ) -> impl Future<Output = Result<(), LaunchError>> + Send {
        self.launch(LaunchParameters::from_plan(plan))
    }

    /// Two-argument form: an environment and the Claude Code arguments.
    fn launch_profile(
        &self,
        environment: Environment,
        arguments: Vec<String>,
    ) -> impl Future<Output = Result<(), LaunchError>> + Send {
        self.launch(LaunchParameters::new(environment, arguments))
    }

    /// Succeeds when the executable can be resolved.
    fn validate_claude_code(&self) -> impl Future<Output = Result<(), LaunchError>> + Send {
        async move { self.core().resolver().resolve().await.map(|_| ()) }
    }

    fn claude_code_path(&self) -> impl Future<Output = Result<PathBuf, LaunchError>> + Send {
        self.core().resolver().resolve()
    }

    fn set_passthrough_mode(&self, enabled: bool) {
        self.core().set_passthrough(enabled);
    }

    /// Deep copy of the recorded metrics.
    fn metrics(&self) -> LauncherMetrics {
        self.core().metrics()
    }
}

/// Strategy chosen at runtime by the pass-through flag.
#[derive(Debug)]
pub enum AnyLauncher {
    Direct(DirectLauncher),
    Passthrough(PassthroughLauncher),
}

impl AnyLauncher {
    pub fn for_mode(passthrough: bool, settings: &LauncherSection) -> Self {
        if passthrough {
            AnyLauncher::Passthrough(PassthroughLauncher::new(settings))
        } else {
            AnyLauncher::Direct(DirectLauncher::new(settings))
        }
    }

    pub fn strategy(&self) -> DelegationStrategy {
        match self {
            AnyLauncher::Direct(_) => DelegationStrategy::Direct,
            AnyLauncher::Passthrough(_) => DelegationStrategy::Passthrough,
        }
    }
}

impl Launcher for AnyLauncher {
    fn core(&self) -> &LauncherCore {
        match self {
            AnyLauncher::Direct(launcher) => launcher.core(),
            AnyLauncher::Passthrough(launcher) => launcher.core(),
        }
    }

    async fn launch_with_delegation(&self, plan: &DelegationPlan) -> Result<(), LaunchError> {
        match self {
            AnyLauncher::Direct(launcher) => launcher.launch_with_delegation(plan).await,
            AnyLauncher::Passthrough(launcher) => launcher.launch_with_delegation(plan).await,
        }
    }
}
