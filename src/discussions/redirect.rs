use async_trait::async_trait;

use crate::pipeline::{Flow, PipelineError, RequestContext, Stage, StageRequest};

/// Follows `ctx.redirect` when one is pending, otherwise passes control on
#[derive(Debug, Default, Clone, Copy)]
pub struct RedirectView;

#[async_trait]
impl Stage for RedirectView {
    fn name(&self) -> &'static str {
        "RedirectView"
    }

    async fn execute(&self, _req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
        Ok(match ctx.pending_redirect() {
            Some(path) => Flow::Redirect(path.to_string()),
            None => Flow::Next,
        })
    }
}
