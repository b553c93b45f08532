use async_trait::async_trait;

use crate::pipeline::context::{RequestContext, StageRequest};
use crate::pipeline::error::PipelineError;
use crate::views::Rendered;

/// What a stage decided
#[derive(Debug)]
pub enum Flow {
    /// Hand the context to the next stage
    Next,
    /// Stop here and send the client elsewhere
    Redirect(String),
    /// Stop here with a rendered page
    Render(Rendered),
}

/// One link of a request pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name for logging and debugging
    fn name(&self) -> &'static str;

    async fn execute(&self, req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError>;
}
