use async_trait::async_trait;

use crate::domain::issue::Issue;
use crate::domain::plan::Plan;
use crate::error::AppResult;

#[async_trait]
pub trait PlannerService: Send + Sync {
    async fn produce_plan(&self, issue: &Issue) -> AppResult<Plan>;
}
