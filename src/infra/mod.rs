pub mod claude_cli;
pub mod github;
pub mod linear;
pub mod llm;
pub mod process;
