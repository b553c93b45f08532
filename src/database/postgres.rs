use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Comment, Discussion, DiscussionParams, Ref, User};
use crate::database::store::{parse_id, DiscussionStore, Expand};

const COLUMNS: &str = "id, title, description, category, tags, author, comments, views, created_at, updated_at";

/// Idempotent bootstrap. `users` and `comments` belong to other services but
/// must exist for expansion queries to run.
const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT
        )"#,
    ),
    (
        "comments",
        r#"CREATE TABLE IF NOT EXISTS comments (
            id UUID PRIMARY KEY,
            content TEXT NOT NULL,
            author UUID,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"#,
    ),
    (
        "discussions",
        r#"CREATE TABLE IF NOT EXISTS discussions (
            id UUID PRIMARY KEY,
            title TEXT,
            description TEXT,
            category TEXT,
            tags TEXT[] NOT NULL DEFAULT '{}',
            author UUID,
            comments UUID[] NOT NULL DEFAULT '{}',
            views BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"#,
    ),
];

#[derive(Debug, FromRow)]
struct DiscussionRow {
    id: Uuid,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    tags: Vec<String>,
    author: Option<Uuid>,
    comments: Vec<Uuid>,
    views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DiscussionRow {
    fn into_discussion(self, users: &HashMap<Uuid, User>, comments: &HashMap<Uuid, Comment>) -> Discussion {
        Discussion {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            tags: self.tags,
            author: self.author.map(|id| match users.get(&id) {
                Some(user) => Ref::Expanded(user.clone()),
                None => Ref::Id(id),
            }),
            comments: self
                .comments
                .into_iter()
                .map(|id| match comments.get(&id) {
                    Some(comment) => Ref::Expanded(comment.clone()),
                    None => Ref::Id(id),
                })
                .collect(),
            views: self.views,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL-backed discussion store
#[derive(Clone)]
pub struct PgDiscussionStore {
    pool: PgPool,
}

impl PgDiscussionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables this store reads and writes, if missing
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        for (table, ddl) in SCHEMA {
            sqlx::query(*ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::QueryError(format!("failed to create table {}: {}", table, e)))?;
            tracing::debug!("Ensured table '{}'", table);
        }
        Ok(())
    }

    async fn load_users(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, User>, DatabaseError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }

    async fn load_comments(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, Comment>, DatabaseError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, content, author, created_at FROM comments WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments.into_iter().map(|comment| (comment.id, comment)).collect())
    }

    /// Join the requested relations onto a batch of rows
    async fn expand(&self, rows: Vec<DiscussionRow>, expand: Expand) -> Result<Vec<Discussion>, DatabaseError> {
        let author_ids: Vec<Uuid> = if expand.author {
            rows.iter().filter_map(|row| row.author).collect()
        } else {
            Vec::new()
        };
        let comment_ids: Vec<Uuid> = if expand.comments {
            rows.iter().flat_map(|row| row.comments.iter().copied()).collect()
        } else {
            Vec::new()
        };

        let (users, comments) = tokio::try_join!(self.load_users(author_ids), self.load_comments(comment_ids))?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_discussion(&users, &comments))
            .collect())
    }

    async fn expand_one(&self, row: Option<DiscussionRow>, expand: Expand) -> Result<Option<Discussion>, DatabaseError> {
        match row {
            Some(row) => Ok(self.expand(vec![row], expand).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DiscussionStore for PgDiscussionStore {
    async fn create(&self, params: DiscussionParams) -> Result<Discussion, DatabaseError> {
        let draft = Discussion::from_params(params);
        let sql = format!(
            "INSERT INTO discussions ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {COLUMNS}"
        );

        let row = sqlx::query_as::<_, DiscussionRow>(&sql)
            .bind(draft.id)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(&draft.category)
            .bind(&draft.tags)
            .bind(draft.author_id())
            .bind(Vec::<Uuid>::new())
            .bind(draft.views)
            .bind(draft.created_at)
            .bind(draft.updated_at)
            .fetch_one(&self.pool)
            .await?;

        let mut created = self.expand(vec![row], Expand::NONE).await?;
        created
            .pop()
            .ok_or_else(|| DatabaseError::QueryError("insert returned no row".to_string()))
    }

    async fn find_all(&self, expand: Expand) -> Result<Vec<Discussion>, DatabaseError> {
        let sql = format!("SELECT {COLUMNS} FROM discussions ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, DiscussionRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        self.expand(rows, expand).await
    }

    async fn find_by_id(&self, id: &str, expand: Expand) -> Result<Option<Discussion>, DatabaseError> {
        let id = parse_id(id)?;
        let sql = format!("SELECT {COLUMNS} FROM discussions WHERE id = $1");
        let row = sqlx::query_as::<_, DiscussionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.expand_one(row, expand).await
    }

    async fn update_by_id(
        &self,
        id: &str,
        params: DiscussionParams,
        expand: Expand,
    ) -> Result<Option<Discussion>, DatabaseError> {
        let id = parse_id(id)?;
        // COALESCE keeps the stored value for every absent field, author included
        let sql = format!(
            r#"UPDATE discussions SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                tags = COALESCE($5, tags),
                author = COALESCE($6, author),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}"#
        );

        let row = sqlx::query_as::<_, DiscussionRow>(&sql)
            .bind(id)
            .bind(params.title)
            .bind(params.description)
            .bind(params.category)
            .bind(params.tags)
            .bind(params.author)
            .fetch_optional(&self.pool)
            .await?;
        self.expand_one(row, expand).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, DatabaseError> {
        let id = parse_id(id)?;
        let result = sqlx::query("DELETE FROM discussions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_views(&self, id: Uuid, views: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE discussions SET views = $2 WHERE id = $1")
            .bind(id)
            .bind(views)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, DatabaseError> {
        let views = sqlx::query_scalar::<_, i64>("UPDATE discussions SET views = views + 1 WHERE id = $1 RETURNING views")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(views)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(author: Option<Uuid>, comments: Vec<Uuid>) -> DiscussionRow {
        let now = Utc::now();
        DiscussionRow {
            id: Uuid::new_v4(),
            title: Some("t".into()),
            description: None,
            category: None,
            tags: vec!["a".into()],
            author,
            comments,
            views: 2,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_conversion_expands_known_references() {
        let user = User::new("ada");
        let comment = Comment::new("hello", Some(user.id));
        let orphan = Uuid::new_v4();

        let users = HashMap::from([(user.id, user.clone())]);
        let comments = HashMap::from([(comment.id, comment.clone())]);

        let discussion = row(Some(user.id), vec![comment.id, orphan]).into_discussion(&users, &comments);
        assert_eq!(discussion.author, Some(Ref::Expanded(user)));
        assert_eq!(discussion.comments, vec![Ref::Expanded(comment), Ref::Id(orphan)]);
        assert_eq!(discussion.views, 2);
    }

    #[test]
    fn row_conversion_without_lookups_keeps_ids() {
        let author = Uuid::new_v4();
        let discussion = row(Some(author), vec![]).into_discussion(&HashMap::new(), &HashMap::new());
        assert_eq!(discussion.author, Some(Ref::Id(author)));
    }

    #[test]
    fn schema_bootstrap_covers_every_table() {
        let tables: Vec<_> = SCHEMA.iter().map(|(table, _)| *table).collect();
        assert_eq!(tables, vec!["users", "comments", "discussions"]);
        assert!(SCHEMA.iter().all(|(_, ddl)| ddl.contains("IF NOT EXISTS")));
    }
}
