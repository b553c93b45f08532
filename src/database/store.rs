use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Discussion, DiscussionParams};

/// Which reference fields a store call should join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Expand {
    pub author: bool,
    pub comments: bool,
}

impl Expand {
    pub const NONE: Expand = Expand { author: false, comments: false };
    pub const AUTHOR: Expand = Expand { author: true, comments: false };
    pub const ALL: Expand = Expand { author: true, comments: true };
}

/// Persistence boundary for discussion records.
///
/// Ids arrive as raw path segments; a segment that is not a valid id is a
/// `DatabaseError::InvalidId`, which callers treat like any other store fault.
/// Lookups that match nothing return `None` and leave the NotFound decision to
/// the caller.
#[async_trait]
pub trait DiscussionStore: Send + Sync {
    /// Insert a new record. References come back unexpanded.
    async fn create(&self, params: DiscussionParams) -> Result<Discussion, DatabaseError>;

    /// Every record in insertion order
    async fn find_all(&self, expand: Expand) -> Result<Vec<Discussion>, DatabaseError>;

    async fn find_by_id(&self, id: &str, expand: Expand) -> Result<Option<Discussion>, DatabaseError>;

    /// Replace the fields present in `params` and return the updated record.
    /// An absent author must leave the stored author untouched.
    async fn update_by_id(
        &self,
        id: &str,
        params: DiscussionParams,
        expand: Expand,
    ) -> Result<Option<Discussion>, DatabaseError>;

    /// Hard delete. Returns whether a record was removed.
    async fn delete_by_id(&self, id: &str) -> Result<bool, DatabaseError>;

    /// Persist an absolute views value. Last writer wins.
    async fn save_views(&self, id: Uuid, views: i64) -> Result<(), DatabaseError>;

    /// Add one to the stored counter in a single step and return the new
    /// value, or `None` when the record is gone
    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, DatabaseError>;

    /// Cheap liveness probe for the health endpoint
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Parse a path segment into a record id
pub fn parse_id(id: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(id.trim()).map_err(|_| DatabaseError::InvalidId(id.to_string()))
}
