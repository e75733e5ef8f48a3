pub mod branch;
pub mod issue;
pub mod plan;
pub mod pull_request;
