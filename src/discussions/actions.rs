use std::sync::Arc;

use async_trait::async_trait;

use crate::database::store::{DiscussionStore, Expand};
use crate::discussions::pages::{discussion_value, Page};
use crate::discussions::params::discussion_params;
use crate::pipeline::{Flow, PipelineError, RequestContext, Stage, StageRequest};
use crate::views::ViewEngine;

/// How show persists the bumped views counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewIncrement {
    /// Spawn the write and move on; its outcome is only logged
    Detached,
    /// Increment atomically in the store, wait for it and fail the request
    /// if it fails. Concurrent shows never lose a view.
    Awaited,
}

/// `create`: insert from the payload and the acting user, then queue a redirect
pub struct CreateDiscussion {
    store: Arc<dyn DiscussionStore>,
    list_path: String,
}

impl CreateDiscussion {
    pub fn new(store: Arc<dyn DiscussionStore>, list_path: impl Into<String>) -> Self {
        Self {
            store,
            list_path: list_path.into(),
        }
    }
}

#[async_trait]
impl Stage for CreateDiscussion {
    fn name(&self) -> &'static str {
        "CreateDiscussion"
    }

    async fn execute(&self, req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
        let params = discussion_params(&req.form, req.user.as_ref());

        let discussion = self.store.create(params).await.map_err(|e| {
            tracing::error!("Error creating discussion: {}", e);
            e
        })?;

        tracing::info!("Created discussion {}", discussion.id);
        ctx.redirect = Some(self.list_path.clone());
        ctx.discussion = Some(discussion);
        Ok(Flow::Next)
    }
}

/// `index`: every discussion with its author joined
pub struct ListDiscussions {
    store: Arc<dyn DiscussionStore>,
}

impl ListDiscussions {
    pub fn new(store: Arc<dyn DiscussionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Stage for ListDiscussions {
    fn name(&self) -> &'static str {
        "ListDiscussions"
    }

    async fn execute(&self, _req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
        let discussions = self.store.find_all(Expand::AUTHOR).await.map_err(|e| {
            tracing::error!("Error fetching discussions: {}", e);
            e
        })?;

        ctx.discussions = Some(discussions);
        Ok(Flow::Next)
    }
}

/// `show`: load one discussion with author and comments, and count the view.
///
/// In `Detached` mode the views write races with concurrent shows of the same
/// record: each one writes back the value it read plus one, so increments
/// can be lost.
pub struct ShowDiscussion {
    store: Arc<dyn DiscussionStore>,
    increment: ViewIncrement,
}

impl ShowDiscussion {
    pub fn new(store: Arc<dyn DiscussionStore>, increment: ViewIncrement) -> Self {
        Self { store, increment }
    }
}

#[async_trait]
impl Stage for ShowDiscussion {
    fn name(&self) -> &'static str {
        "ShowDiscussion"
    }

    async fn execute(&self, req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
        let id = req.require_id()?;

        let mut discussion = self
            .store
            .find_by_id(id, Expand::ALL)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching discussion by ID: {}", e);
                e
            })?
            .ok_or_else(|| PipelineError::not_found(format!("discussion {} not found", id)))?;

        let record_id = discussion.id;

        match self.increment {
            ViewIncrement::Detached => {
                discussion.views += 1;
                let (store, views) = (Arc::clone(&self.store), discussion.views);
                tokio::spawn(async move {
                    if let Err(e) = store.save_views(record_id, views).await {
                        tracing::warn!("Dropped views update for discussion {}: {}", record_id, e);
                    }
                });
            }
            ViewIncrement::Awaited => {
                let views = self
                    .store
                    .increment_views(record_id)
                    .await
                    .map_err(|e| {
                        tracing::error!("Error saving views for discussion {}: {}", record_id, e);
                        e
                    })?
                    // Deleted between the read and the increment
                    .ok_or_else(|| PipelineError::not_found(format!("discussion {} not found", id)))?;
                discussion.views = views;
            }
        }

        ctx.discussion = Some(discussion);
        Ok(Flow::Next)
    }
}

/// `edit`: load one discussion and render the edit page straight away.
///
/// Unlike the other actions this one does not go through the context.
pub struct EditDiscussion {
    store: Arc<dyn DiscussionStore>,
    engine: Arc<dyn ViewEngine>,
}

impl EditDiscussion {
    pub fn new(store: Arc<dyn DiscussionStore>, engine: Arc<dyn ViewEngine>) -> Self {
        Self { store, engine }
    }
}

#[async_trait]
impl Stage for EditDiscussion {
    fn name(&self) -> &'static str {
        "EditDiscussion"
    }

    async fn execute(&self, req: &StageRequest, _ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
        let id = req.require_id()?;

        let discussion = self
            .store
            .find_by_id(id, Expand::ALL)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching discussion by ID: {}", e);
                e
            })?
            .ok_or_else(|| PipelineError::not_found(format!("discussion {} not found", id)))?;

        let view = Page::Edit.view().with("discussion", discussion_value(Some(&discussion))?);
        let rendered = self.engine.render(&view)?;
        Ok(Flow::Render(rendered))
    }
}

/// `update`: overwrite the fields present in the payload, then queue a redirect.
///
/// The acting user is deliberately not passed to the extractor, so an update
/// can never change the author.
pub struct UpdateDiscussion {
    store: Arc<dyn DiscussionStore>,
    list_path: String,
}

impl UpdateDiscussion {
    pub fn new(store: Arc<dyn DiscussionStore>, list_path: impl Into<String>) -> Self {
        Self {
            store,
            list_path: list_path.into(),
        }
    }
}

#[async_trait]
impl Stage for UpdateDiscussion {
    fn name(&self) -> &'static str {
        "UpdateDiscussion"
    }

    async fn execute(&self, req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
        let id = req.require_id()?;
        let params = discussion_params(&req.form, None);

        let discussion = self
            .store
            .update_by_id(id, params, Expand::AUTHOR)
            .await
            .map_err(|e| {
                tracing::error!("Error updating discussion by ID: {}", e);
                e
            })?
            .ok_or_else(|| PipelineError::not_found(format!("discussion {} not found", id)))?;

        ctx.redirect = Some(self.list_path.clone());
        ctx.discussion = Some(discussion);
        Ok(Flow::Next)
    }
}

/// `delete`: hard delete, then queue a redirect.
///
/// A missing record still redirects. Store failures are logged and swallowed
/// unless `surface_errors` is set.
pub struct DeleteDiscussion {
    store: Arc<dyn DiscussionStore>,
    list_path: String,
    surface_errors: bool,
}

impl DeleteDiscussion {
    pub fn new(store: Arc<dyn DiscussionStore>, list_path: impl Into<String>, surface_errors: bool) -> Self {
        Self {
            store,
            list_path: list_path.into(),
            surface_errors,
        }
    }
}

#[async_trait]
impl Stage for DeleteDiscussion {
    fn name(&self) -> &'static str {
        "DeleteDiscussion"
    }

    async fn execute(&self, req: &StageRequest, ctx: &mut RequestContext) -> Result<Flow, PipelineError> {
        let id = req.require_id()?;

        match self.store.delete_by_id(id).await {
            Ok(true) => tracing::info!("Deleted discussion {}", id),
            Ok(false) => tracing::debug!("Delete of discussion {} matched nothing", id),
            Err(e) if self.surface_errors => {
                tracing::error!("Error deleting discussion by ID: {}", e);
                return Err(e.into());
            }
            Err(e) => tracing::error!("Error deleting discussion by ID: {}", e),
        }

        ctx.redirect = Some(self.list_path.clone());
        Ok(Flow::Next)
    }
}
