use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::database::models::Discussion;
use crate::pipeline::{Flow, PipelineError, RequestContext, Stage, StageRequest};
use crate::views::{View, ViewEngine, ViewError};

/// The discussion pages and their template identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    New,
    Index,
    Show,
    Edit,
}

impl Page {
    pub fn template(self) -> &'static str {
        match self {
            Page::New => "discussions/new",
            Page::Index => "discussions/index",
            Page::Show => "discussions/show",
            Page::Edit => "discussions/edit",
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Page::New => "new-discussion",
            Page::Index => "discussions",
            Page::Show => "discussion-details",
            Page::Edit => "edit-discussion",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::New => "New Discussion",
            Page::Index => "All Discussions",
            Page::Show => "Discussion Details",
            Page::Edit => "Edit Discussion",
        }
    }

    pub fn view(self) -> View {
        View::new(self.template(), self.id(), self.title())
    }
}

pub(crate) fn discussion_value(discussion: Option<&Discussion>) -> Result<Value, ViewError> {
    Ok(match discussion {
        Some(discussion) => serde_json::to_value(discussion)?,
        None => Value::Null,
    })
}

/// Terminal stage that renders one page from the context
pub struct RenderPage {
    page: Page,
    engine: Arc<dyn ViewEngine>,
}

impl RenderPage {
    pub fn new(page: Page, engine: Arc<dyn ViewEngine>) -> Self {
        Self { page, engine }
    }

    /// The page view filled with the slice of context it shows
    fn view(&self, ctx: &RequestContext) -> Result<View, ViewError> {
        let view = self.page.view();
        Ok(match self.page {
            Page::New => view,
            Page::Index => {
                let discussions = ctx.discussions.as_deref().unwrap_or_default();
                view.with("discussions", serde_json::to_value(discussions)?)
            }
            Page::Show | Page::Edit => view.with("discussion", discussion_value(ctx.discussion.as_ref())?),
        })
    }
}

#[async_trait]
impl Stage for RenderPage {
    fn name(&self) -> &'static str {
        match self.page {
            Page::New => "NewView",
            Page::Index => "IndexView",
            Page::Show => "ShowView",
            Page::Edit => "EditView",
        }
    }

    async fn execute(&self, _req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
        let rendered = self.engine.render(&self.view(ctx)?)?;
        Ok(Flow::Render(rendered))
    }
}
