pub mod issue_tracker;
pub mod planner;
pub mod source_host;

pub use issue_tracker::IssueTrackerService;
pub use planner::PlannerService;
pub use source_host::SourceHostService;
