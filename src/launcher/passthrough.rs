use tracing::debug;

use crate::{config::LauncherSection, lib::errors::LaunchError};

use super::{DelegationPlan, ExecutableResolver, LaunchParameters, Launcher, LauncherCore};

/// Transparent launcher: a non-zero child exit terminates this process with the same code.
#[derive(Debug)]
pub struct PassthroughLauncher {
    core: LauncherCore,
}

impl PassthroughLauncher {
    pub fn new(settings: &LauncherSection) -> Self {
        Self {
            core: LauncherCore::from_settings(settings, true),
        }
    }

    pub fn with_executable(primary: impl Into<String>, alternatives: Vec<String>) -> Self {
        Self {
            core: LauncherCore::new(ExecutableResolver::new(primary, alternatives), true),
        }
    }
}

impl Default for PassthroughLauncher {
    fn default() -> Self {
        Self::new(&LauncherSection::default())
    }
}

impl Launcher for PassthroughLauncher {
    fn core(&self) -> &LauncherCore {
        &self.core
    }

    async fn launch_with_delegation(&self, plan: &DelegationPlan) -> Result<(), LaunchError> {
        debug!(
            target: "ccenv::launcher",
            environment = %plan.environment().name,
            plan_strategy = plan.strategy().as_str(),
            "Delegating plan through pass-through launcher"
        );
        self.core.launch(LaunchParameters::from_plan(plan)).await
    }
}
