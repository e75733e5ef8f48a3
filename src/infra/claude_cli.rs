use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::{CommandForm, LocalToolConfig};
use crate::domain::issue::Issue;
use crate::domain::plan::{Plan, PlanSource};
use crate::error::{AppError, AppResult};
use crate::fallback::first_success;
use crate::infra::process::{AttemptError, CommandRunner, Invocation, ProcessRunner};
use crate::prompt::inline_summary;
use crate::services::PlannerService;

const WORKSPACE_PREFIX: &str = "claude-code-";
const PROMPT_FILE_NAME: &str = "prompt.md";

/// Temporary directory holding the prompt file for one planning run.
///
/// Removed recursively when dropped; a failed removal is logged and ignored.
pub struct PromptWorkspace {
    dir: Option<TempDir>,
    root: PathBuf,
    prompt_path: PathBuf,
}

impl PromptWorkspace {
    pub fn create(prompt: &str) -> AppResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()?;
        let root = dir.path().to_path_buf();
        let prompt_path = root.join(PROMPT_FILE_NAME);
        fs::write(&prompt_path, prompt)?;

        Ok(Self {
            dir: Some(dir),
            root,
            prompt_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prompt_path(&self) -> &Path {
        &self.prompt_path
    }
}

impl Drop for PromptWorkspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!(path = %self.root.display(), "removed prompt workspace"),
            Err(err) => warn!(
                path = %self.root.display(),
                error = %err,
                "could not remove prompt workspace"
            ),
        }
    }
}

/// Plans by driving the local assistant binary through its fallback chain.
pub struct ClaudeCliPlanner<R = ProcessRunner> {
    config: LocalToolConfig,
    runner: R,
    example_fallback: bool,
}

impl ClaudeCliPlanner<ProcessRunner> {
    pub fn new(config: LocalToolConfig) -> Self {
        let runner = ProcessRunner::new(config.output_limit);
        Self::with_runner(config, runner)
    }
}

impl<R: CommandRunner> ClaudeCliPlanner<R> {
    pub fn with_runner(config: LocalToolConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            example_fallback: false,
        }
    }

    /// Substitute the example plan when the tool does not answer `--version`.
    /// Dry runs only.
    pub fn with_example_fallback(mut self) -> Self {
        self.example_fallback = true;
        self
    }

    fn invocation(&self, form: CommandForm, prompt_path: &Path, issue: &Issue) -> Invocation {
        let tool = self.config.binary.as_str();
        let prompt = prompt_path.display().to_string();
        match form {
            CommandForm::PromptFile => Invocation::new(tool).arg(prompt),
            CommandForm::AltBinary => Invocation::new(format!("{tool}-cli")).arg(prompt),
            CommandForm::DirectiveFile => Invocation::new(tool)
                .arg("-p")
                .arg(self.config.directive.as_str())
                .arg(prompt),
            CommandForm::DirectiveStdin => Invocation::new(tool)
                .arg("-p")
                .arg(self.config.directive.as_str())
                .stdin_from(prompt_path),
            CommandForm::Bare => Invocation::new(tool).stdin_from(prompt_path),
            CommandForm::SlashCommand => Invocation::new(tool).arg("-p").arg(format!(
                "/project:{} '{}'",
                self.config.slash_command,
                inline_summary(issue)
            )),
        }
    }

    async fn tool_reachable(&self) -> bool {
        let probe = Invocation::new(self.config.binary.as_str()).arg("--version");
        match self.runner.run(&probe).await {
            Ok(version) => {
                info!(version = %version.trim(), "found local assistant");
                true
            }
            Err(err) => {
                warn!(error = %err, "local assistant not reachable");
                false
            }
        }
    }
}

#[async_trait]
impl<R: CommandRunner> PlannerService for ClaudeCliPlanner<R> {
    async fn produce_plan(&self, issue: &Issue) -> AppResult<Plan> {
        if self.example_fallback && !self.tool_reachable().await {
            warn!("using the example plan in place of the local assistant");
            return Ok(Plan::example());
        }

        let workspace = PromptWorkspace::create(&self.config.style.render(issue))?;
        let chain = &self.config.chain;
        debug!(
            path = %workspace.root().display(),
            forms = chain.len(),
            "created prompt workspace"
        );

        let attempts = chain.iter().copied().map(|form| {
            let invocation = self.invocation(form, workspace.prompt_path(), issue);
            move || async move {
                info!(form = %form, command = %invocation, "invoking local assistant");
                self.runner.run(&invocation).await.map(|text| (form, text))
            }
        });

        let outcome = first_success(attempts, |index, err: &AttemptError| {
            let form = chain.get(index).map(CommandForm::as_str).unwrap_or("unknown");
            warn!(form, error = %err, "local assistant attempt failed");
        })
        .await;

        drop(workspace);

        match outcome {
            Ok((form, text)) => Ok(Plan::new(
                text,
                PlanSource::LocalTool {
                    form: form.to_string(),
                },
            )),
            Err(exhausted) => Err(AppError::AssistantUnavailable(exhausted.to_string())),
        }
    }
}
