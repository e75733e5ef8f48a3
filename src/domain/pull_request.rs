use crate::domain::branch::BranchName;
use crate::domain::issue::Issue;
use crate::domain::plan::Plan;

const TRACKER_NAME: &str = "Linear";
const ASSISTANT_NAME: &str = "Claude";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSpec {
    pub title: String,
    pub body: String,
    pub head: BranchName,
    pub base: String,
}

impl PullRequestSpec {
    pub fn compose(
        issue: &Issue,
        plan: &Plan,
        head: BranchName,
        base: impl Into<String>,
        issue_url_base: &str,
    ) -> Self {
        Self {
            title: render_title(issue),
            body: render_body(issue, plan, issue_url_base),
            head,
            base: base.into(),
        }
    }
}

pub fn render_title(issue: &Issue) -> String {
    format!("[{TRACKER_NAME} {}] {}", issue.id, issue.title)
}

pub fn render_body(issue: &Issue, plan: &Plan, issue_url_base: &str) -> String {
    let id = &issue.id;
    let link = format!("{}/{id}", issue_url_base.trim_end_matches('/'));
    format!(
        "## {TRACKER_NAME} Issue\n\
         [{id}: {title}]({link})\n\
         \n\
         ## {ASSISTANT_NAME}'s Analysis and Implementation Plan\n\
         {plan}\n\
         \n\
         ---\n\
         This PR was automatically generated from {TRACKER_NAME} issue {id} using {ASSISTANT_NAME}.",
        title = issue.title,
        plan = plan.text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::PlanSource;

    fn sample_issue() -> Issue {
        Issue::new(
            "ABC-123",
            "Add user authentication feature",
            Some("We need to implement user authentication using OAuth2.".to_string()),
        )
    }

    #[test]
    fn renders_title_with_tracker_and_id() {
        assert_eq!(
            render_title(&sample_issue()),
            "[Linear ABC-123] Add user authentication feature"
        );
    }

    #[test]
    fn body_follows_template() {
        let plan = Plan::new("1. Do it\n2. Ship it", PlanSource::LocalTool {
            form: "prompt-file".to_string(),
        });
        let body = render_body(&sample_issue(), &plan, "https://linear.app/issue/");

        let expected = "## Linear Issue\n\
                        [ABC-123: Add user authentication feature](https://linear.app/issue/ABC-123)\n\
                        \n\
                        ## Claude's Analysis and Implementation Plan\n\
                        1. Do it\n2. Ship it\n\
                        \n\
                        ---\n\
                        This PR was automatically generated from Linear issue ABC-123 using Claude.";
        assert_eq!(body, expected);
    }

    #[test]
    fn compose_embeds_full_plan_and_branches() {
        let plan = Plan::example();
        let spec = PullRequestSpec::compose(
            &sample_issue(),
            &plan,
            BranchName::for_issue("ABC-123"),
            "main",
            "https://linear.app/issue",
        );

        assert!(spec.body.contains("ABC-123"));
        assert!(spec.body.contains("Add user authentication feature"));
        assert!(spec.body.contains(&plan.text));
        assert_eq!(spec.head.as_str(), "linear-abc-123");
        assert_eq!(spec.base, "main");
    }
}
