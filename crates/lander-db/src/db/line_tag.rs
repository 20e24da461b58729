use async_trait::async_trait;
use lander_core::models::{LineTag, NewLineTag, UpdateLineTagRequest};
use lander_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::transaction::TransactionGuard;

const LINE_TAG_COLUMNS: &str = "id, key, label, url, sort_order, is_default, created_at, updated_at";

/// LINE tag persistence
#[async_trait]
pub trait LineTagStore: Send + Sync {
    /// Tags ordered by sort order
    async fn list_tags(&self) -> Result<Vec<LineTag>, AppError>;

    /// Insert tags as given, skipping any that collide with an existing key
    /// or default flag
    async fn insert_tags(&self, tags: &[NewLineTag]) -> Result<(), AppError>;

    /// Insert a non-default tag after every existing one; `Conflict` if the
    /// key is taken
    async fn create_tag(&self, key: &str, label: &str, url: &str) -> Result<LineTag, AppError>;

    /// Apply the present fields; `is_default: Some(true)` clears the flag on
    /// every other tag in the same transaction
    async fn update_tag(&self, id: Uuid, update: &UpdateLineTagRequest)
        -> Result<LineTag, AppError>;

    /// Refuses to delete the last tag. Deleting the default promotes the
    /// first remaining tag in sort order.
    async fn delete_tag(&self, id: Uuid) -> Result<(), AppError>;
}

fn key_taken(key: &str) -> AppError {
    AppError::Conflict(format!("LINE tag key {} is already in use", key))
}

fn tag_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("LINE tag {} not found", id))
}

/// Postgres-backed LINE tag store
#[derive(Clone)]
pub struct LineTagRepository {
    pool: PgPool,
}

impl LineTagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LineTagStore for LineTagRepository {
    #[tracing::instrument(skip(self), fields(db.table = "lp_line_tags", db.operation = "select"))]
    async fn list_tags(&self) -> Result<Vec<LineTag>, AppError> {
        let sql = format!(
            "SELECT {} FROM lp_line_tags ORDER BY sort_order ASC, created_at ASC",
            LINE_TAG_COLUMNS
        );
        let tags = sqlx::query_as::<Postgres, LineTag>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    #[tracing::instrument(skip(self, tags), fields(db.table = "lp_line_tags", db.operation = "insert", count = tags.len()))]
    async fn insert_tags(&self, tags: &[NewLineTag]) -> Result<(), AppError> {
        for tag in tags {
            sqlx::query(
                r#"
                INSERT INTO lp_line_tags (key, label, url, sort_order, is_default)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(&tag.key)
            .bind(&tag.label)
            .bind(&tag.url)
            .bind(tag.sort_order)
            .bind(tag.is_default)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, label, url), fields(db.table = "lp_line_tags", db.operation = "insert"))]
    async fn create_tag(&self, key: &str, label: &str, url: &str) -> Result<LineTag, AppError> {
        let sql = format!(
            r#"
            INSERT INTO lp_line_tags (key, label, url, sort_order)
            VALUES ($1, $2, $3, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM lp_line_tags))
            RETURNING {}
            "#,
            LINE_TAG_COLUMNS
        );
        sqlx::query_as::<Postgres, LineTag>(&sql)
            .bind(key)
            .bind(label)
            .bind(url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => key_taken(key),
                other => AppError::Database(other),
            })
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "lp_line_tags", db.operation = "update", db.record_id = %id))]
    async fn update_tag(
        &self,
        id: Uuid,
        update: &UpdateLineTagRequest,
    ) -> Result<LineTag, AppError> {
        let make_default = update.is_default == Some(true);
        let mut tx = TransactionGuard::begin(&self.pool, "update_line_tag").await?;

        if make_default {
            sqlx::query(
                "UPDATE lp_line_tags SET is_default = FALSE, updated_at = NOW() WHERE is_default AND id <> $1",
            )
            .bind(id)
            .execute(&mut **tx)
            .await?;
        }

        let sql = format!(
            r#"
            UPDATE lp_line_tags
            SET key = COALESCE($2, key),
                label = COALESCE($3, label),
                url = COALESCE($4, url),
                is_default = is_default OR $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LINE_TAG_COLUMNS
        );
        let updated = sqlx::query_as::<Postgres, LineTag>(&sql)
            .bind(id)
            .bind(&update.key)
            .bind(&update.label)
            .bind(&update.url)
            .bind(make_default)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    key_taken(update.key.as_deref().unwrap_or_default())
                }
                other => AppError::Database(other),
            })?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return Err(tag_not_found(id));
        };

        tx.commit().await?;
        Ok(updated)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lp_line_tags", db.operation = "delete", db.record_id = %id))]
    async fn delete_tag(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "delete_line_tag").await?;

        let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM lp_line_tags")
            .fetch_one(&mut **tx)
            .await?;
        if count <= 1 {
            tx.rollback().await?;
            return Err(AppError::InvalidInput(
                "The last LINE tag cannot be deleted".to_string(),
            ));
        }

        let was_default = sqlx::query_scalar::<Postgres, bool>(
            "DELETE FROM lp_line_tags WHERE id = $1 RETURNING is_default",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(was_default) = was_default else {
            tx.rollback().await?;
            return Err(tag_not_found(id));
        };

        if was_default {
            sqlx::query(
                r#"
                UPDATE lp_line_tags SET is_default = TRUE, updated_at = NOW()
                WHERE id = (SELECT id FROM lp_line_tags ORDER BY sort_order ASC, created_at ASC LIMIT 1)
                "#,
            )
            .execute(&mut **tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
