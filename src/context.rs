use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{IssueTrackerService, PlannerService, SourceHostService};

/// Configuration plus the three collaborators one run talks to.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub tracker: Arc<dyn IssueTrackerService>,
    pub source_host: Arc<dyn SourceHostService>,
    pub planner: Arc<dyn PlannerService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        tracker: Arc<dyn IssueTrackerService>,
        source_host: Arc<dyn SourceHostService>,
        planner: Arc<dyn PlannerService>,
    ) -> Self {
        Self {
            config,
            tracker,
            source_host,
            planner,
        }
    }
}
