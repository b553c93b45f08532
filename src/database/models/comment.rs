use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Entity;

/// Comment attached to a discussion. Written elsewhere; read here for expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(content: impl Into<String>, author: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            author,
            created_at: Utc::now(),
        }
    }
}

impl Entity for Comment {
    fn id(&self) -> Uuid {
        self.id
    }
}
