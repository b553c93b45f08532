use std::time::Instant;

use crate::auth::ActingUser;
use crate::database::models::Discussion;
use crate::discussions::params::DiscussionForm;
use crate::pipeline::error::PipelineError;
use crate::types::Action;

/// Inbound request data, read-only for every stage
#[derive(Debug, Clone, Default)]
pub struct StageRequest {
    pub id: Option<String>,
    pub form: DiscussionForm,
    pub user: Option<ActingUser>,
}

impl StageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_form(mut self, form: DiscussionForm) -> Self {
        self.form = form;
        self
    }

    pub fn with_user(mut self, user: Option<ActingUser>) -> Self {
        self.user = user;
        self
    }

    /// The `:id` path segment, for actions addressed at a single record
    pub fn require_id(&self) -> Result<&str, PipelineError> {
        self.id
            .as_deref()
            .ok_or_else(|| PipelineError::not_found("discussion id missing from request"))
    }
}

/// Per-request state shared between stages.
///
/// Created fresh for every pipeline run and dropped when it ends; stages only
/// ever see the context of their own request.
#[derive(Debug)]
pub struct RequestContext {
    pub action: Action,

    /// Path the redirect stage should send the client to
    pub redirect: Option<String>,

    /// Single record for show/create/update
    pub discussion: Option<Discussion>,

    /// Listing for index
    pub discussions: Option<Vec<Discussion>>,

    // Bookkeeping
    pub start_time: Instant,
    pub stages_executed: Vec<&'static str>,
}

impl RequestContext {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            redirect: None,
            discussion: None,
            discussions: None,
            start_time: Instant::now(),
            stages_executed: Vec::new(),
        }
    }

    /// Redirect target, ignoring an empty path
    pub fn pending_redirect(&self) -> Option<&str> {
        self.redirect.as_deref().filter(|path| !path.trim().is_empty())
    }

    pub fn execution_time(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}
