use async_trait::async_trait;
use lander_core::models::{
    CampaignCode, CampaignCodeFilter, CodeGenre, NewCampaignCode, UpdateCampaignCodeRequest,
};
use lander_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const CODE_SELECT: &str = r#"
    SELECT c.id, c.code, c.site_id, c.genre_id, g.prefix AS genre_prefix, g.name AS genre_name,
           c.name, c.memo, c.is_active, c.created_at
    FROM lp_campaign_codes c
    JOIN lp_code_genres g ON g.id = c.genre_id
"#;

/// Campaign code and genre persistence
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Codes matching the filter, newest first
    async fn list_codes(&self, filter: CampaignCodeFilter) -> Result<Vec<CampaignCode>, AppError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<CampaignCode>, AppError>;

    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;

    /// Fails with `Conflict` if the code value is taken
    async fn create_code(&self, code: NewCampaignCode) -> Result<CampaignCode, AppError>;

    async fn update_code(
        &self,
        id: Uuid,
        update: UpdateCampaignCodeRequest,
    ) -> Result<CampaignCode, AppError>;

    async fn delete_code(&self, id: Uuid) -> Result<(), AppError>;

    async fn list_active_codes_for_site(&self, site_id: Uuid)
        -> Result<Vec<CampaignCode>, AppError>;

    /// Genres ordered by sort order
    async fn list_genres(&self) -> Result<Vec<CodeGenre>, AppError>;

    async fn get_genre(&self, id: i32) -> Result<Option<CodeGenre>, AppError>;

    /// Lexicographically greatest prefix in use
    async fn last_genre_prefix(&self) -> Result<Option<String>, AppError>;

    /// Insert a genre after every existing one in sort order
    async fn create_genre(&self, prefix: &str, name: &str) -> Result<CodeGenre, AppError>;

    /// Insert genres with explicit sort orders, skipping prefixes that exist
    async fn insert_genres(&self, genres: &[(&str, &str, i32)]) -> Result<(), AppError>;

    async fn rename_genre(&self, id: i32, name: &str) -> Result<CodeGenre, AppError>;

    /// Fails with `Conflict` while any code references the genre
    async fn delete_genre(&self, id: i32) -> Result<(), AppError>;
}

/// Postgres-backed campaign code store
#[derive(Clone)]
pub struct CampaignCodeRepository {
    pool: PgPool,
}

impl CampaignCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn get_code(&self, id: Uuid) -> Result<Option<CampaignCode>, AppError> {
        let sql = format!("{} WHERE c.id = $1", CODE_SELECT);
        let code = sqlx::query_as::<Postgres, CampaignCode>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(code)
    }
}

#[async_trait]
impl CampaignStore for CampaignCodeRepository {
    #[tracing::instrument(skip(self), fields(db.table = "lp_campaign_codes", db.operation = "select"))]
    async fn list_codes(&self, filter: CampaignCodeFilter) -> Result<Vec<CampaignCode>, AppError> {
        let sql = format!(
            "{} WHERE ($1::uuid IS NULL OR c.site_id = $1) AND ($2::int IS NULL OR c.genre_id = $2) \
             ORDER BY c.created_at DESC",
            CODE_SELECT
        );
        let codes = sqlx::query_as::<Postgres, CampaignCode>(&sql)
            .bind(filter.site_id)
            .bind(filter.genre_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(codes)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lp_campaign_codes", db.operation = "select"))]
    async fn find_by_code(&self, code: &str) -> Result<Option<CampaignCode>, AppError> {
        let sql = format!("{} WHERE c.code = $1", CODE_SELECT);
        let code = sqlx::query_as::<Postgres, CampaignCode>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(code)
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM lp_campaign_codes WHERE code = $1)",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    #[tracing::instrument(skip(self, code), fields(db.table = "lp_campaign_codes", db.operation = "insert", code = %code.code))]
    async fn create_code(&self, code: NewCampaignCode) -> Result<CampaignCode, AppError> {
        let id = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            INSERT INTO lp_campaign_codes (code, site_id, genre_id, name, memo, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&code.code)
        .bind(code.site_id)
        .bind(code.genre_id)
        .bind(&code.name)
        .bind(&code.memo)
        .bind(code.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Campaign code {} already exists", code.code))
            }
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::InvalidInput("Site or genre does not exist".to_string())
            }
            other => AppError::Database(other),
        })?;

        self.get_code(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Campaign code {} vanished after insert", id)))
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "lp_campaign_codes", db.operation = "update", db.record_id = %id))]
    async fn update_code(
        &self,
        id: Uuid,
        update: UpdateCampaignCodeRequest,
    ) -> Result<CampaignCode, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE lp_campaign_codes
            SET name = COALESCE($2, name),
                memo = COALESCE($3, memo),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.memo)
        .bind(update.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Campaign code {} not found", id)));
        }

        self.get_code(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign code {} not found", id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "lp_campaign_codes", db.operation = "delete", db.record_id = %id))]
    async fn delete_code(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM lp_campaign_codes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Campaign code {} not found", id)));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "lp_campaign_codes", db.operation = "select"))]
    async fn list_active_codes_for_site(
        &self,
        site_id: Uuid,
    ) -> Result<Vec<CampaignCode>, AppError> {
        let sql = format!(
            "{} WHERE c.site_id = $1 AND c.is_active ORDER BY c.created_at ASC",
            CODE_SELECT
        );
        let codes = sqlx::query_as::<Postgres, CampaignCode>(&sql)
            .bind(site_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(codes)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lp_code_genres", db.operation = "select"))]
    async fn list_genres(&self) -> Result<Vec<CodeGenre>, AppError> {
        let genres = sqlx::query_as::<Postgres, CodeGenre>(
            "SELECT id, prefix, name, sort_order, created_at FROM lp_code_genres ORDER BY sort_order ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn get_genre(&self, id: i32) -> Result<Option<CodeGenre>, AppError> {
        let genre = sqlx::query_as::<Postgres, CodeGenre>(
            "SELECT id, prefix, name, sort_order, created_at FROM lp_code_genres WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(genre)
    }

    async fn last_genre_prefix(&self) -> Result<Option<String>, AppError> {
        let prefix = sqlx::query_scalar::<Postgres, Option<String>>(
            "SELECT MAX(prefix) FROM lp_code_genres",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(prefix)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lp_code_genres", db.operation = "insert"))]
    async fn create_genre(&self, prefix: &str, name: &str) -> Result<CodeGenre, AppError> {
        let genre = sqlx::query_as::<Postgres, CodeGenre>(
            r#"
            INSERT INTO lp_code_genres (prefix, name, sort_order)
            VALUES ($1, $2, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM lp_code_genres))
            RETURNING id, prefix, name, sort_order, created_at
            "#,
        )
        .bind(prefix)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Genre prefix {} already exists", prefix))
            }
            other => AppError::Database(other),
        })?;
        Ok(genre)
    }

    #[tracing::instrument(skip(self, genres), fields(db.table = "lp_code_genres", db.operation = "insert", count = genres.len()))]
    async fn insert_genres(&self, genres: &[(&str, &str, i32)]) -> Result<(), AppError> {
        for (prefix, name, sort_order) in genres {
            sqlx::query(
                r#"
                INSERT INTO lp_code_genres (prefix, name, sort_order)
                VALUES ($1, $2, $3)
                ON CONFLICT (prefix) DO NOTHING
                "#,
            )
            .bind(*prefix)
            .bind(*name)
            .bind(*sort_order)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "lp_code_genres", db.operation = "update", db.record_id = id))]
    async fn rename_genre(&self, id: i32, name: &str) -> Result<CodeGenre, AppError> {
        sqlx::query_as::<Postgres, CodeGenre>(
            "UPDATE lp_code_genres SET name = $2 WHERE id = $1 RETURNING id, prefix, name, sort_order, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "lp_code_genres", db.operation = "delete", db.record_id = id))]
    async fn delete_genre(&self, id: i32) -> Result<(), AppError> {
        let in_use = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM lp_campaign_codes WHERE genre_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if in_use {
            return Err(AppError::Conflict(
                "Genre is referenced by campaign codes and cannot be deleted".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM lp_code_genres WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }
        Ok(())
    }
}
