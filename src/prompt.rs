use clap::ValueEnum;

use crate::domain::issue::Issue;

/// Instruction template wrapped around the issue text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PromptStyle {
    /// Summary, step-by-step plan and likely files.
    Concise,
    /// Adds plan subsections and technical considerations, rendered as Markdown.
    Detailed,
}

impl PromptStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStyle::Concise => "concise",
            PromptStyle::Detailed => "detailed",
        }
    }

    pub fn render(&self, issue: &Issue) -> String {
        match self {
            PromptStyle::Concise => concise_prompt(issue),
            PromptStyle::Detailed => detailed_prompt(issue),
        }
    }
}

fn concise_prompt(issue: &Issue) -> String {
    format!(
        "You are a helpful assistant tasked with analyzing a Linear issue and creating a plan to implement it.
The issue is described as follows:

Title: {title}
Description: {description}

Based on this description, please create:
1. A concise summary of what needs to be implemented
2. A step-by-step plan for implementing this feature or fixing this bug
3. A list of files that likely need to be modified or created

Format your response in a way that would be helpful for a developer implementing this change.
",
        title = issue.title,
        description = issue.description,
    )
}

fn detailed_prompt(issue: &Issue) -> String {
    format!(
        "# Linear Issue Implementation Plan

## Issue Details

Title: {title}
Description: {description}

## Task

I need you to analyze this Linear issue and create a comprehensive implementation plan. As a senior software engineer, think deeply about the most effective approach to implement this feature or fix this bug.

## Requirements

Please provide:

1. **Summary**: A concise explanation of what needs to be implemented (2-3 sentences)
2. **Implementation Plan**: A detailed step-by-step plan including:
   - Key components or functions that need to be created or modified
   - Data models or schemas that need to be updated
   - API endpoints that need to be added or modified
   - UI changes if applicable
3. **File Changes**: A specific list of files that will likely need to be modified or created
4. **Technical Considerations**:
   - Potential edge cases to handle
   - Performance considerations
   - Security implications
   - Testing approach

Format your response as Markdown with clear headings and bullet points for easy readability.
",
        title = issue.title,
        description = issue.description,
    )
}

/// One-line issue summary passed inline to slash commands.
pub fn inline_summary(issue: &Issue) -> String {
    format!("Title: {}, Description: {}", issue.title, issue.description)
}
