mod actions;
mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod fallback;
mod infra;
mod logging;
mod prompt;
mod services;
mod workflow;

use clap::{Parser, Subcommand};

use crate::actions::ActionsReporter;
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::config::RunArgs;
use crate::error::{AppError, AppResult};

#[derive(Parser)]
#[command(
    name = "linear-plan-pr",
    author,
    version,
    about = "Open a GitHub pull request carrying Claude's implementation plan for a Linear issue"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the issue, plan it, create the branch and open the pull request.
    Run(RunArgs),
    /// Inspect the resolved configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    let reporter = ActionsReporter::from_env();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => exit_with(&reporter, usage_error(&err)),
    };
    logging::init(cli.verbose);

    if let Err(error) = run(cli.command, &reporter).await {
        exit_with(&reporter, error);
    }
}

fn usage_error(err: &clap::Error) -> AppError {
    let rendered = err.to_string();
    let message = rendered.trim();
    AppError::Configuration(message.strip_prefix("error: ").unwrap_or(message).to_string())
}

fn exit_with(reporter: &ActionsReporter, error: AppError) -> ! {
    eprintln!("Error: {error}");
    reporter.fail(&error.to_string());
    std::process::exit(1);
}

async fn run(command: Commands, reporter: &ActionsReporter) -> AppResult<()> {
    match command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Run(args) => cmd::run::run(args, reporter).await,
    }
}
