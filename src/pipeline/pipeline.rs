use std::time::Instant;

use crate::pipeline::context::{RequestContext, StageRequest};
use crate::pipeline::error::PipelineError;
use crate::pipeline::traits::{Flow, Stage};
use crate::types::Action;
use crate::views::Rendered;

/// How a pipeline run ended
#[derive(Debug)]
pub enum Outcome {
    Redirect(String),
    Render(Rendered),
    /// Every stage passed control onward and none answered
    Unhandled,
}

/// Fixed chain of stages for one action
pub struct Pipeline {
    action: Action,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            stages: Vec::new(),
        }
    }

    /// Append a stage to the end of the chain
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        tracing::debug!("Registered stage '{}' for {} pipeline", stage.name(), self.action);
        self.stages.push(Box::new(stage));
        self
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run with a fresh context
    pub async fn run(&self, req: StageRequest) -> Result<Outcome, PipelineError> {
        let mut ctx = RequestContext::new(self.action);
        self.run_with(&req, &mut ctx).await
    }

    /// Run against a caller-owned context, which is left as the last stage saw it
    pub async fn run_with(&self, req: &StageRequest, ctx: &mut RequestContext) -> Result<Outcome, PipelineError> {
        tracing::debug!(
            "Pipeline starting: action={}, id={:?}, stages={:?}",
            self.action,
            req.id,
            self.stage_names()
        );

        for stage in &self.stages {
            let stage_start = Instant::now();
            let result = stage.execute(req, ctx).await;
            ctx.stages_executed.push(stage.name());

            match result {
                Ok(Flow::Next) => {
                    tracing::trace!("Stage {} passed in {:?}", stage.name(), stage_start.elapsed());
                }
                Ok(Flow::Redirect(path)) => {
                    tracing::debug!(
                        "Stage {} redirected to {} after {:?}",
                        stage.name(),
                        path,
                        ctx.execution_time()
                    );
                    return Ok(Outcome::Redirect(path));
                }
                Ok(Flow::Render(rendered)) => {
                    tracing::debug!("Stage {} rendered after {:?}", stage.name(), ctx.execution_time());
                    return Ok(Outcome::Render(rendered));
                }
                Err(error) => {
                    tracing::warn!("Stage {} failed in {:?}: {}", stage.name(), stage_start.elapsed(), error);
                    return Err(error);
                }
            }
        }

        tracing::debug!("{} pipeline ended without a response", self.action);
        Ok(Outcome::Unhandled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct SetRedirect(&'static str);

    #[async_trait]
    impl Stage for SetRedirect {
        fn name(&self) -> &'static str {
            "SetRedirect"
        }

        async fn execute(&self, _req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
            ctx.redirect = Some(self.0.to_string());
            Ok(Flow::Next)
        }
    }

    struct Follow;

    #[async_trait]
    impl Stage for Follow {
        fn name(&self) -> &'static str {
            "Follow"
        }

        async fn execute(&self, _req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
            Ok(match ctx.pending_redirect() {
                Some(path) => Flow::Redirect(path.to_string()),
                None => Flow::Next,
            })
        }
    }

    struct Fail;

    #[async_trait]
    impl Stage for Fail {
        fn name(&self) -> &'static str {
            "Fail"
        }

        async fn execute(&self, _req: &StageRequest, _ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
            Err(PipelineError::not_found("nothing here"))
        }
    }

    #[tokio::test]
    async fn stages_share_one_context() {
        let pipeline = Pipeline::new(Action::Create).stage(SetRedirect("/list")).stage(Follow);
        match pipeline.run(StageRequest::new()).await.unwrap() {
            Outcome::Redirect(path) => assert_eq!(path, "/list"),
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn falls_off_the_end_as_unhandled() {
        let pipeline = Pipeline::new(Action::Index).stage(Follow).stage(Follow);
        let mut ctx = RequestContext::new(Action::Index);
        let outcome = pipeline.run_with(&StageRequest::new(), &mut ctx).await.unwrap();
        assert!(matches!(outcome, Outcome::Unhandled));
        assert_eq!(ctx.stages_executed, vec!["Follow", "Follow"]);
    }

    #[tokio::test]
    async fn error_stops_the_chain() {
        let pipeline = Pipeline::new(Action::Show).stage(Fail).stage(SetRedirect("/never"));
        let mut ctx = RequestContext::new(Action::Show);
        let result = pipeline.run_with(&StageRequest::new(), &mut ctx).await;
        assert!(matches!(result, Err(PipelineError::NotFound(_))));
        assert_eq!(ctx.stages_executed, vec!["Fail"]);
        assert!(ctx.redirect.is_none());
    }

    #[test]
    fn reports_stage_names_in_order() {
        let pipeline = Pipeline::new(Action::Update).stage(SetRedirect("/x")).stage(Follow);
        assert_eq!(pipeline.stage_names(), vec!["SetRedirect", "Follow"]);
        assert_eq!(pipeline.action(), Action::Update);
    }
}
