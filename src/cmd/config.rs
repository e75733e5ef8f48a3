use clap::{Args, Subcommand};

use crate::config::{CommandForm, RunArgs, Settings};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the resolved settings (secrets masked) without calling any service.
    Show(RunArgs),
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Show(args) => run_show(Settings::from_process_env(args)?),
    }
}

fn run_show(settings: Settings) -> AppResult<()> {
    for (label, value) in describe(&settings) {
        println!("{label}: {value}");
    }
    Ok(())
}

fn describe(settings: &Settings) -> Vec<(&'static str, String)> {
    let chain = settings
        .cli_chain
        .iter()
        .map(CommandForm::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        ("Linear API key", mask_secret(&settings.linear_api_key)),
        ("Linear issue", display_value(&settings.issue_id)),
        ("GitHub token", mask_secret(&settings.github_token)),
        ("Claude API key", mask_secret(&settings.claude_api_key)),
        ("Repository", display_value(&settings.repository)),
        ("Assistant mode", format!("{:?}", settings.assistant).to_lowercase()),
        ("Model", settings.model.clone()),
        ("Claude binary", settings.claude_bin.clone()),
        ("CLI chain", chain),
        (
            "Prompt style",
            settings
                .prompt_style
                .map(|style| style.as_str().to_string())
                .unwrap_or_else(|| "<mode default>".to_string()),
        ),
        ("Slash command", settings.slash_command.clone()),
        ("On existing", format!("{:?}", settings.on_existing).to_lowercase()),
        ("Dry run", settings.dry_run.to_string()),
        ("Linear API URL", settings.linear_api_url.clone()),
        ("GitHub API URL", settings.github_api_url.clone()),
        ("Anthropic API URL", settings.anthropic_api_url.clone()),
        ("Issue URL base", settings.issue_url_base.clone()),
    ]
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let chars = token.chars().collect::<Vec<_>>();
            let prefix = chars[..3].iter().collect::<String>();
            let suffix = chars[chars.len() - 3..].iter().collect::<String>();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}
