use std::fmt;

pub const BRANCH_PREFIX: &str = "linear-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName(pub String);

impl BranchName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Branch for a tracker issue: `linear-` followed by the lowercased id
    /// with every character outside `[a-z0-9]` replaced by `-`.
    pub fn for_issue(issue_id: &str) -> Self {
        let sanitized = issue_id
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    '-'
                }
            })
            .collect::<String>();
        Self(format!("{BRANCH_PREFIX}{sanitized}"))
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_branch_after_issue() {
        let name = BranchName::for_issue("ABC-123");
        assert_eq!(name.as_str(), "linear-abc-123");
    }

    #[test]
    fn replaces_each_unsafe_character() {
        assert_eq!(
            BranchName::for_issue("Team_X/42 beta").as_str(),
            "linear-team-x-42-beta"
        );
        assert_eq!(BranchName::for_issue("a..b").as_str(), "linear-a--b");
        assert_eq!(BranchName::for_issue("ÉT-1").as_str(), "linear--t-1");
    }

    #[test]
    fn naming_is_deterministic() {
        let first = BranchName::for_issue("ENG-7");
        let second = BranchName::for_issue("ENG-7");
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "linear-eng-7");
    }

    #[test]
    fn empty_id_yields_bare_prefix() {
        assert_eq!(BranchName::for_issue("").as_str(), "linear-");
    }
}
