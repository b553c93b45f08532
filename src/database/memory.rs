use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Comment, Discussion, DiscussionParams, Ref, User};
use crate::database::store::{parse_id, DiscussionStore, Expand};

#[derive(Debug, Default)]
struct Tables {
    // Insertion order is the listing order
    discussions: Vec<Discussion>,
    users: HashMap<Uuid, User>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn position(&self, id: Uuid) -> Option<usize> {
        self.discussions.iter().position(|d| d.id == id)
    }

    fn expand(&self, raw: &Discussion, expand: Expand) -> Discussion {
        let mut discussion = raw.clone();

        if expand.author {
            discussion.author = discussion.author.map(|author| match self.users.get(&author.id()) {
                Some(user) => Ref::Expanded(user.clone()),
                None => author,
            });
        }

        if expand.comments {
            discussion.comments = discussion
                .comments
                .into_iter()
                .map(|comment| match self.comments.get(&comment.id()) {
                    Some(found) => Ref::Expanded(found.clone()),
                    None => comment,
                })
                .collect();
        }

        discussion
    }
}

/// Process-local store. Cloning shares the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user so author references can be expanded
    pub async fn insert_user(&self, user: User) -> User {
        let mut tables = self.tables.write().await;
        tables.users.insert(user.id, user.clone());
        user
    }

    /// Attach a comment to a discussion. Returns false when the discussion is unknown.
    pub async fn insert_comment(&self, discussion_id: Uuid, comment: Comment) -> bool {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.position(discussion_id) else {
            return false;
        };
        tables.discussions[index].comments.push(Ref::Id(comment.id));
        tables.comments.insert(comment.id, comment);
        true
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.discussions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DiscussionStore for MemoryStore {
    async fn create(&self, params: DiscussionParams) -> Result<Discussion, DatabaseError> {
        let discussion = Discussion::from_params(params);
        let mut tables = self.tables.write().await;
        tables.discussions.push(discussion.clone());
        Ok(discussion)
    }

    async fn find_all(&self, expand: Expand) -> Result<Vec<Discussion>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .discussions
            .iter()
            .map(|raw| tables.expand(raw, expand))
            .collect())
    }

    async fn find_by_id(&self, id: &str, expand: Expand) -> Result<Option<Discussion>, DatabaseError> {
        let id = parse_id(id)?;
        let tables = self.tables.read().await;
        Ok(tables
            .position(id)
            .map(|index| tables.expand(&tables.discussions[index], expand)))
    }

    async fn update_by_id(
        &self,
        id: &str,
        params: DiscussionParams,
        expand: Expand,
    ) -> Result<Option<Discussion>, DatabaseError> {
        let id = parse_id(id)?;
        let mut tables = self.tables.write().await;
        let Some(index) = tables.position(id) else {
            return Ok(None);
        };
        tables.discussions[index].apply(params);
        Ok(Some(tables.expand(&tables.discussions[index], expand)))
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, DatabaseError> {
        let id = parse_id(id)?;
        let mut tables = self.tables.write().await;
        match tables.position(id) {
            Some(index) => {
                tables.discussions.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_views(&self, id: Uuid, views: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        // Saving a record that was deleted in the meantime is a silent no-op
        if let Some(index) = tables.position(id) {
            tables.discussions[index].views = views;
        }
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.position(id).map(|index| {
            let discussion = &mut tables.discussions[index];
            discussion.views += 1;
            discussion.views
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(title: &str, author: Option<Uuid>) -> DiscussionParams {
        DiscussionParams {
            title: Some(title.to_string()),
            author,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store = MemoryStore::new();
        for title in ["first", "second", "third"] {
            store.create(params(title, None)).await.unwrap();
        }

        let titles: Vec<_> = store
            .find_all(Expand::NONE)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn expands_author_only_when_asked() {
        let store = MemoryStore::new();
        let user = store.insert_user(User::new("ada")).await;
        let created = store.create(params("t", Some(user.id))).await.unwrap();
        let id = created.id.to_string();

        let raw = store.find_by_id(&id, Expand::NONE).await.unwrap().unwrap();
        assert_eq!(raw.author, Some(Ref::Id(user.id)));

        let expanded = store.find_by_id(&id, Expand::AUTHOR).await.unwrap().unwrap();
        assert_eq!(expanded.author, Some(Ref::Expanded(user)));
    }

    #[tokio::test]
    async fn unknown_author_stays_a_bare_reference() {
        let store = MemoryStore::new();
        let ghost = Uuid::new_v4();
        let created = store.create(params("t", Some(ghost))).await.unwrap();

        let found = store
            .find_by_id(&created.id.to_string(), Expand::ALL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.author, Some(Ref::Id(ghost)));
    }

    #[tokio::test]
    async fn expands_comments_in_attachment_order() {
        let store = MemoryStore::new();
        let created = store.create(params("t", None)).await.unwrap();
        let first = Comment::new("one", None);
        let second = Comment::new("two", None);
        assert!(store.insert_comment(created.id, first.clone()).await);
        assert!(store.insert_comment(created.id, second.clone()).await);

        let found = store
            .find_by_id(&created.id.to_string(), Expand::ALL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            found.comments,
            vec![Ref::Expanded(first), Ref::Expanded(second)]
        );
    }

    #[tokio::test]
    async fn insert_comment_on_unknown_discussion_is_rejected() {
        let store = MemoryStore::new();
        assert!(!store.insert_comment(Uuid::new_v4(), Comment::new("x", None)).await);
    }

    #[tokio::test]
    async fn update_without_author_keeps_author() {
        let store = MemoryStore::new();
        let user = store.insert_user(User::new("ada")).await;
        let created = store.create(params("t", Some(user.id))).await.unwrap();

        let updated = store
            .update_by_id(
                &created.id.to_string(),
                DiscussionParams {
                    category: Some("X".into()),
                    ..Default::default()
                },
                Expand::AUTHOR,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.category.as_deref(), Some("X"));
        assert_eq!(updated.title.as_deref(), Some("t"));
        assert_eq!(updated.author, Some(Ref::Expanded(user)));
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_record_report_absence() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4().to_string();
        assert!(store
            .update_by_id(&missing, DiscussionParams::default(), Expand::NONE)
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_by_id(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = MemoryStore::new();
        let created = store.create(params("t", None)).await.unwrap();
        assert!(store.delete_by_id(&created.id.to_string()).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn malformed_id_is_a_store_error() {
        let store = MemoryStore::new();
        let err = store.find_by_id("nope", Expand::NONE).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidId(_)));
        assert!(store.delete_by_id("nope").await.is_err());
    }

    #[tokio::test]
    async fn save_views_overwrites_counter() {
        let store = MemoryStore::new();
        let created = store.create(params("t", None)).await.unwrap();
        store.save_views(created.id, 7).await.unwrap();
        let found = store
            .find_by_id(&created.id.to_string(), Expand::NONE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.views, 7);

        // Unknown ids are ignored
        store.save_views(Uuid::new_v4(), 3).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_all_counted() {
        let store = MemoryStore::new();
        let created = store.create(params("t", None)).await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_views(created.id).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }

        let found = store
            .find_by_id(&created.id.to_string(), Expand::NONE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.views, 20);
        assert_eq!(store.increment_views(Uuid::new_v4()).await.unwrap(), None);
    }
}
