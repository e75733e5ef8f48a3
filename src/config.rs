use std::env;
use std::fmt;
use std::str::FromStr;

use clap::{Args, ValueEnum};

use crate::error::{AppError, AppResult};
use crate::prompt::PromptStyle;

pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_CLAUDE_BIN: &str = "claude";
pub const DEFAULT_SLASH_COMMAND: &str = "analyze-issue";
pub const DEFAULT_LINEAR_API_URL: &str = "https://api.linear.app/graphql";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ISSUE_URL_BASE: &str = "https://linear.app/issue";
pub const THINKING_DIRECTIVE: &str = "think deeply about this implementation";
pub const OUTPUT_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AssistantMode {
    /// Single request to the hosted Messages API.
    Api,
    /// Local command-line assistant driven through a fallback chain.
    Cli,
}

/// What to do when the branch or pull request for an issue already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExistingPolicy {
    #[default]
    Fail,
    Reuse,
}

/// One way of invoking the local assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CommandForm {
    /// `<tool> <prompt-file>`
    PromptFile,
    /// `<tool>-cli <prompt-file>`
    AltBinary,
    /// `<tool> -p <directive> <prompt-file>`
    DirectiveFile,
    /// `<tool> -p <directive>` with the prompt on stdin
    DirectiveStdin,
    /// `<tool>` with the prompt on stdin
    Bare,
    /// `<tool> -p "/project:<command> '<summary>'"`
    SlashCommand,
}

impl CommandForm {
    pub const DEFAULT_CHAIN: [CommandForm; 5] = [
        CommandForm::PromptFile,
        CommandForm::AltBinary,
        CommandForm::DirectiveFile,
        CommandForm::DirectiveStdin,
        CommandForm::Bare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandForm::PromptFile => "prompt-file",
            CommandForm::AltBinary => "alt-binary",
            CommandForm::DirectiveFile => "directive-file",
            CommandForm::DirectiveStdin => "directive-stdin",
            CommandForm::Bare => "bare",
            CommandForm::SlashCommand => "slash-command",
        }
    }
}

impl fmt::Display for CommandForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value.trim().split_once('/') {
            Some((owner, name))
                if !owner.trim().is_empty()
                    && !name.trim().is_empty()
                    && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.trim().to_string(),
                    name: name.trim().to_string(),
                })
            }
            _ => Err(AppError::Configuration(format!(
                "repository must look like owner/name, got '{value}'"
            ))),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Linear issue identifier, e.g. ABC-123.
    #[arg(long = "issue")]
    pub issue_id: Option<String>,
    /// Linear API key.
    #[arg(long)]
    pub linear_api_key: Option<String>,
    /// GitHub token used for branch and pull request calls.
    #[arg(long)]
    pub github_token: Option<String>,
    /// Anthropic API key (api mode only).
    #[arg(long)]
    pub claude_api_key: Option<String>,
    /// Target repository as owner/name.
    #[arg(long = "repo")]
    pub repository: Option<String>,
    /// How the plan is produced.
    #[arg(long, value_enum)]
    pub assistant: Option<AssistantMode>,
    /// Model identifier for api mode.
    #[arg(long)]
    pub model: Option<String>,
    /// Local assistant binary for cli mode.
    #[arg(long)]
    pub claude_bin: Option<String>,
    /// Ordered invocation forms tried in cli mode.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub cli_chain: Vec<CommandForm>,
    /// Prompt template.
    #[arg(long, value_enum)]
    pub prompt_style: Option<PromptStyle>,
    /// Project command used by the slash-command form.
    #[arg(long)]
    pub slash_command: Option<String>,
    /// Policy for an existing branch or pull request.
    #[arg(long, value_enum)]
    pub on_existing: Option<ExistingPolicy>,
    /// Produce the plan and print the pull request without touching GitHub.
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long)]
    pub linear_api_url: Option<String>,
    #[arg(long)]
    pub github_api_url: Option<String>,
    #[arg(long)]
    pub anthropic_api_url: Option<String>,
    #[arg(long)]
    pub issue_url_base: Option<String>,
}

/// Settings after layering flags over the environment, before validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub linear_api_key: Option<String>,
    pub issue_id: Option<String>,
    pub github_token: Option<String>,
    pub claude_api_key: Option<String>,
    pub repository: Option<String>,
    pub assistant: AssistantMode,
    pub model: String,
    pub claude_bin: String,
    pub cli_chain: Vec<CommandForm>,
    pub prompt_style: Option<PromptStyle>,
    pub slash_command: String,
    pub on_existing: ExistingPolicy,
    pub dry_run: bool,
    pub linear_api_url: String,
    pub github_api_url: String,
    pub anthropic_api_url: String,
    pub issue_url_base: String,
}

impl Settings {
    pub fn from_process_env(args: RunArgs) -> AppResult<Self> {
        Self::resolve(args, |key| env::var(key).ok())
    }

    /// Layers `args` over `lookup`: flag, then `NAME`, then `INPUT_NAME`.
    pub fn resolve(args: RunArgs, lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let source = Lookup(&lookup);

        let repository = non_empty(args.repository)
            .or_else(|| source.get("GITHUB_REPOSITORY"))
            .or_else(|| {
                let owner = source.get("REPO_OWNER")?;
                let name = source.get("REPO_NAME")?;
                Some(format!("{owner}/{name}"))
            })
            .or_else(|| source.input("repository"));

        let cli_chain = if args.cli_chain.is_empty() {
            match source.setting("CLAUDE_CLI_CHAIN", "claude_cli_chain") {
                Some(raw) => parse_chain(&raw)?,
                None => CommandForm::DEFAULT_CHAIN.to_vec(),
            }
        } else {
            args.cli_chain
        };

        Ok(Self {
            linear_api_key: non_empty(args.linear_api_key)
                .or_else(|| source.setting("LINEAR_API_KEY", "linear_api_key")),
            issue_id: non_empty(args.issue_id)
                .or_else(|| source.setting("LINEAR_ISSUE_ID", "linear_issue_id")),
            github_token: non_empty(args.github_token)
                .or_else(|| source.setting("GITHUB_TOKEN", "github_token")),
            claude_api_key: non_empty(args.claude_api_key)
                .or_else(|| source.setting("CLAUDE_API_KEY", "claude_api_key")),
            repository,
            assistant: choose(
                args.assistant,
                source.setting("ASSISTANT_MODE", "assistant_mode"),
                "assistant_mode",
            )?
            .unwrap_or(AssistantMode::Api),
            model: non_empty(args.model)
                .or_else(|| source.setting("CLAUDE_MODEL", "claude_model"))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            claude_bin: non_empty(args.claude_bin)
                .or_else(|| source.setting("CLAUDE_BIN", "claude_bin"))
                .unwrap_or_else(|| DEFAULT_CLAUDE_BIN.to_string()),
            cli_chain,
            prompt_style: choose(
                args.prompt_style,
                source.setting("PROMPT_STYLE", "prompt_style"),
                "prompt_style",
            )?,
            slash_command: non_empty(args.slash_command)
                .or_else(|| source.setting("CLAUDE_SLASH_COMMAND", "claude_slash_command"))
                .unwrap_or_else(|| DEFAULT_SLASH_COMMAND.to_string()),
            on_existing: choose(
                args.on_existing,
                source.setting("ON_EXISTING", "on_existing"),
                "on_existing",
            )?
            .unwrap_or_default(),
            dry_run: args.dry_run
                || source
                    .setting("DRY_RUN", "dry_run")
                    .is_some_and(|value| parse_flag(&value)),
            linear_api_url: non_empty(args.linear_api_url)
                .or_else(|| source.get("LINEAR_API_URL"))
                .unwrap_or_else(|| DEFAULT_LINEAR_API_URL.to_string()),
            github_api_url: non_empty(args.github_api_url)
                .or_else(|| source.get("GITHUB_API_URL"))
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            anthropic_api_url: non_empty(args.anthropic_api_url)
                .or_else(|| source.get("ANTHROPIC_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_API_URL.to_string()),
            issue_url_base: non_empty(args.issue_url_base)
                .or_else(|| source.get("LINEAR_ISSUE_URL_BASE"))
                .unwrap_or_else(|| DEFAULT_ISSUE_URL_BASE.to_string()),
        })
    }

    /// Checks required settings in a fixed order and reports the first gap.
    pub fn validate(self) -> AppResult<AppConfig> {
        let linear_api_key = require(self.linear_api_key, "linear_api_key", "--linear-api-key")?;
        let issue_id = require(self.issue_id, "linear_issue_id", "--issue")?;

        let github_token = if self.dry_run {
            self.github_token
        } else {
            Some(require(self.github_token, "github_token", "--github-token")?)
        };

        let assistant = match self.assistant {
            AssistantMode::Api => AssistantConfig::HostedApi {
                api_key: require(self.claude_api_key, "claude_api_key", "--claude-api-key")?,
                model: self.model,
                max_tokens: DEFAULT_MAX_TOKENS,
                base_url: self.anthropic_api_url,
                style: self.prompt_style.unwrap_or(PromptStyle::Concise),
            },
            AssistantMode::Cli => AssistantConfig::LocalTool(LocalToolConfig {
                binary: self.claude_bin,
                chain: self.cli_chain,
                directive: THINKING_DIRECTIVE.to_string(),
                slash_command: self.slash_command,
                style: self.prompt_style.unwrap_or(PromptStyle::Detailed),
                output_limit: OUTPUT_LIMIT_BYTES,
            }),
        };

        let repository = match self.repository {
            Some(raw) => Some(raw.parse::<RepoSlug>()?),
            None if self.dry_run => None,
            None => {
                return Err(missing("repository", "--repo"));
            }
        };

        Ok(AppConfig {
            linear_api_key,
            issue_id,
            github_token,
            repository,
            assistant,
            on_existing: self.on_existing,
            dry_run: self.dry_run,
            linear_api_url: self.linear_api_url,
            github_api_url: self.github_api_url,
            issue_url_base: self.issue_url_base,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LocalToolConfig {
    pub binary: String,
    pub chain: Vec<CommandForm>,
    pub directive: String,
    pub slash_command: String,
    pub style: PromptStyle,
    pub output_limit: usize,
}

#[derive(Debug, Clone)]
pub enum AssistantConfig {
    HostedApi {
        api_key: String,
        model: String,
        max_tokens: u32,
        base_url: String,
        style: PromptStyle,
    },
    LocalTool(LocalToolConfig),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub linear_api_key: String,
    pub issue_id: String,
    pub github_token: Option<String>,
    pub repository: Option<RepoSlug>,
    pub assistant: AssistantConfig,
    pub on_existing: ExistingPolicy,
    pub dry_run: bool,
    pub linear_api_url: String,
    pub github_api_url: String,
    pub issue_url_base: String,
}

impl AppConfig {
    pub fn repository(&self) -> AppResult<&RepoSlug> {
        self.repository
            .as_ref()
            .ok_or_else(|| missing("repository", "--repo"))
    }
}

struct Lookup<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Lookup<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        non_empty((self.0)(key))
    }

    fn input(&self, name: &str) -> Option<String> {
        self.get(&format!("INPUT_{}", name.to_uppercase()))
    }

    fn setting(&self, env_key: &str, input_name: &str) -> Option<String> {
        self.get(env_key).or_else(|| self.input(input_name))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn choose<T: ValueEnum>(flag: Option<T>, raw: Option<String>, name: &str) -> AppResult<Option<T>> {
    match (flag, raw) {
        (Some(value), _) => Ok(Some(value)),
        (None, Some(raw)) => T::from_str(&raw, true)
            .map(Some)
            .map_err(|_| AppError::Configuration(format!("invalid {name} '{raw}'"))),
        (None, None) => Ok(None),
    }
}

fn parse_chain(raw: &str) -> AppResult<Vec<CommandForm>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            CommandForm::from_str(entry, true).map_err(|_| {
                AppError::Configuration(format!("invalid claude_cli_chain entry '{entry}'"))
            })
        })
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn require(value: Option<String>, name: &str, flag: &str) -> AppResult<String> {
    value.ok_or_else(|| missing(name, flag))
}

fn missing(name: &str, flag: &str) -> AppError {
    AppError::Configuration(format!(
        "{name} is required (set {flag}, {} or INPUT_{})",
        env_hint(name),
        name.to_uppercase()
    ))
}

fn env_hint(name: &str) -> &'static str {
    match name {
        "linear_api_key" => "LINEAR_API_KEY",
        "linear_issue_id" => "LINEAR_ISSUE_ID",
        "github_token" => "GITHUB_TOKEN",
        "claude_api_key" => "CLAUDE_API_KEY",
        "repository" => "GITHUB_REPOSITORY",
        _ => "the environment",
    }
}
