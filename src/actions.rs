use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::error::AppResult;

/// Publishes step outputs and failures to a GitHub Actions runner.
#[derive(Debug, Clone, Default)]
pub struct ActionsReporter {
    output_file: Option<PathBuf>,
    annotate: bool,
}

impl ActionsReporter {
    pub fn new(output_file: Option<PathBuf>, annotate: bool) -> Self {
        Self {
            output_file,
            annotate,
        }
    }

    pub fn from_env() -> Self {
        let output_file = env::var_os("GITHUB_OUTPUT")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let annotate = env::var("GITHUB_ACTIONS").is_ok_and(|value| value == "true");
        Self::new(output_file, annotate)
    }

    /// Prints `name=value` and appends it to `$GITHUB_OUTPUT` when set.
    pub fn set_output(&self, name: &str, value: &str) -> AppResult<()> {
        println!("{name}={value}");
        if let Some(path) = &self.output_file {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{name}={value}")?;
        }
        Ok(())
    }

    pub fn fail(&self, message: &str) {
        if self.annotate {
            println!("::error::{}", escape_data(message));
        }
    }
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
