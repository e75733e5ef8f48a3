use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn linear_plan_pr() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("linear-plan-pr"));
    cmd.env_clear();
    cmd
}

// =============================================================================
// Basic CLI
// =============================================================================

#[test]
fn test_help() {
    linear_plan_pr()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pull request"));
}

#[test]
fn test_run_help_lists_assistant_modes() {
    linear_plan_pr()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--assistant"))
        .stdout(predicate::str::contains("--cli-chain"));
}

// =============================================================================
// Configuration failures happen before any network call
// =============================================================================

#[test]
fn test_missing_github_token_is_named() {
    // unroutable endpoints: reaching the network would fail differently
    linear_plan_pr()
        .arg("run")
        .env("LINEAR_API_KEY", "lin_api_key")
        .env("LINEAR_ISSUE_ID", "ABC-123")
        .env("CLAUDE_API_KEY", "sk-ant")
        .env("GITHUB_REPOSITORY", "acme/widgets")
        .env("LINEAR_API_URL", "http://127.0.0.1:9/graphql")
        .env("GITHUB_API_URL", "http://127.0.0.1:9")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("github_token is required"))
        .stderr(predicate::str::contains("fetching Linear issue").not());
}

#[test]
fn test_first_missing_input_wins() {
    linear_plan_pr()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("linear_api_key is required"));
}

#[test]
fn test_action_inputs_are_read() {
    linear_plan_pr()
        .arg("run")
        .env("INPUT_LINEAR_API_KEY", "lin_api_key")
        .env("INPUT_LINEAR_ISSUE_ID", "ABC-123")
        .env("INPUT_GITHUB_TOKEN", "ghs_token")
        .env("GITHUB_REPOSITORY", "acme/widgets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("claude_api_key is required"));
}

#[test]
fn test_failure_is_annotated_in_actions() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("github_output");

    linear_plan_pr()
        .arg("run")
        .env("GITHUB_ACTIONS", "true")
        .env("GITHUB_OUTPUT", &output)
        .assert()
        .failure()
        .stdout(predicate::str::contains("::error::configuration error: linear_api_key"));

    assert!(!output.exists() || fs::read_to_string(&output).unwrap().is_empty());
}

#[test]
fn test_invalid_assistant_mode_is_rejected() {
    linear_plan_pr()
        .arg("run")
        .env("ASSISTANT_MODE", "telepathy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid assistant_mode"));
}

#[test]
fn test_invalid_assistant_flag_is_a_configuration_error() {
    linear_plan_pr()
        .args(["run", "--assistant", "telepathy"])
        .env("GITHUB_ACTIONS", "true")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: configuration error: invalid value 'telepathy'",
        ))
        .stdout(predicate::str::contains("::error::configuration error: invalid value"));
}

#[test]
fn test_invalid_chain_entry_flag_exits_with_one() {
    linear_plan_pr()
        .args(["run", "--cli-chain", "prompt-file,telepathy"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn test_version_flag_still_succeeds() {
    linear_plan_pr()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("linear-plan-pr"));
}

// =============================================================================
// Config inspection
// =============================================================================

#[test]
fn test_config_show_masks_secrets() {
    linear_plan_pr()
        .args(["config", "show", "--repo", "acme/widgets"])
        .env("LINEAR_API_KEY", "lin_api_0123456789")
        .assert()
        .success()
        .stdout(predicate::str::contains("Linear API key: lin***789"))
        .stdout(predicate::str::contains("Repository: acme/widgets"))
        .stdout(predicate::str::contains("GitHub token: <not set>"))
        .stdout(predicate::str::contains("0123456").not());
}
