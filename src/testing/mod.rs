use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::ActingUser;
use crate::database::manager::DatabaseError;
use crate::database::models::{Discussion, DiscussionParams, User};
use crate::database::store::{DiscussionStore, Expand};
use crate::database::MemoryStore;

/// Memory-backed fixture with one registered user
pub struct TestContext {
    pub memory: MemoryStore,
    pub user: User,
}

impl TestContext {
    pub async fn new() -> Self {
        let memory = MemoryStore::new();
        let user = memory.insert_user(User::new("ada").with_email("ada@example.com")).await;
        Self { memory, user }
    }

    pub fn store(&self) -> Arc<dyn DiscussionStore> {
        Arc::new(self.memory.clone())
    }

    pub fn acting_user(&self) -> ActingUser {
        ActingUser::from(&self.user)
    }

    /// Insert a discussion authored by the fixture user
    pub async fn seed(&self, title: &str) -> Discussion {
        let params = DiscussionParams {
            title: Some(title.to_string()),
            description: Some("D".to_string()),
            author: Some(self.user.id),
            category: Some("C".to_string()),
            tags: Some(vec!["a".to_string(), "b".to_string()]),
        };
        self.memory.create(params).await.expect("seed discussion")
    }

    /// Stored views counter, read without going through a pipeline
    pub async fn views(&self, id: Uuid) -> i64 {
        self.memory
            .find_by_id(&id.to_string(), Expand::NONE)
            .await
            .expect("read discussion")
            .map(|discussion| discussion.views)
            .expect("discussion exists")
    }
}

/// Store whose every call fails, for exercising error paths
pub struct FailingStore;

impl FailingStore {
    fn error(op: &str) -> DatabaseError {
        DatabaseError::QueryError(format!("{} failed: store offline", op))
    }
}

#[async_trait]
impl DiscussionStore for FailingStore {
    async fn create(&self, _params: DiscussionParams) -> Result<Discussion, DatabaseError> {
        Err(Self::error("create"))
    }

    async fn find_all(&self, _expand: Expand) -> Result<Vec<Discussion>, DatabaseError> {
        Err(Self::error("find_all"))
    }

    async fn find_by_id(&self, _id: &str, _expand: Expand) -> Result<Option<Discussion>, DatabaseError> {
        Err(Self::error("find_by_id"))
    }

    async fn update_by_id(
        &self,
        _id: &str,
        _params: DiscussionParams,
        _expand: Expand,
    ) -> Result<Option<Discussion>, DatabaseError> {
        Err(Self::error("update_by_id"))
    }

    async fn delete_by_id(&self, _id: &str) -> Result<bool, DatabaseError> {
        Err(Self::error("delete_by_id"))
    }

    async fn save_views(&self, _id: Uuid, _views: i64) -> Result<(), DatabaseError> {
        Err(Self::error("save_views"))
    }

    async fn increment_views(&self, _id: Uuid) -> Result<Option<i64>, DatabaseError> {
        Err(Self::error("increment_views"))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Err(Self::error("ping"))
    }
}
