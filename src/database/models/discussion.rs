use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Comment, Entity, Ref, User};

/// Discussion record as held by a store.
///
/// `author` and `comments` are references; which of them come back expanded
/// depends on the `Expand` passed to the store call that produced the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<Ref<User>>,
    pub comments: Vec<Ref<Comment>>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Discussion {
    /// Build a fresh record from normalized params. Stores call this on create.
    pub fn from_params(params: DiscussionParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: params.title,
            description: params.description,
            category: params.category,
            tags: params.tags.unwrap_or_default(),
            author: params.author.map(Ref::Id),
            comments: Vec::new(),
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every field present in `params`; absent fields are left alone.
    ///
    /// An absent author never clears the existing one.
    pub fn apply(&mut self, params: DiscussionParams) {
        if let Some(title) = params.title {
            self.title = Some(title);
        }
        if let Some(description) = params.description {
            self.description = Some(description);
        }
        if let Some(category) = params.category {
            self.category = Some(category);
        }
        if let Some(tags) = params.tags {
            self.tags = tags;
        }
        if let Some(author) = params.author {
            self.author = Some(Ref::Id(author));
        }
        self.updated_at = Utc::now();
    }

    pub fn author_id(&self) -> Option<Uuid> {
        self.author.as_ref().map(Ref::id)
    }
}

impl Entity for Discussion {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Normalized create/update record produced by the field extractor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<Uuid>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}
