use async_trait::async_trait;
use lander_core::models::{site_storage_path, LandingPage, NewLandingPage, SortOrderEntry, TagFlags};
use lander_core::AppError;
use sqlx::{PgPool, Postgres};

use super::transaction::TransactionGuard;

const SITE_COLUMNS: &str = "id, site_number, name, has_analytics_tag, has_tracking_script, \
    has_cta_marker, storage_path, cta_url, is_hidden, is_published, sort_order, created_at, updated_at";

/// Site registry persistence
///
/// Abstracts the database so the pipeline and registry services can be
/// exercised against an in-memory store.
#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Next unused site number: one past the greatest number ever issued,
    /// or `0` when none has been issued. Deleted numbers are never returned.
    async fn next_site_number(&self) -> Result<i32, AppError>;

    async fn get_site(&self, site_number: i32) -> Result<Option<LandingPage>, AppError>;

    /// All sites ordered by sort order, then site number
    async fn list_sites(&self) -> Result<Vec<LandingPage>, AppError>;

    /// Insert a new row and record its number as issued
    async fn create_site(&self, site: NewLandingPage) -> Result<LandingPage, AppError>;

    /// Overwrite name and tag flags after a re-upload, leaving every other
    /// field (notably `cta_url`) untouched
    async fn update_after_upload(
        &self,
        site_number: i32,
        name: &str,
        flags: TagFlags,
    ) -> Result<LandingPage, AppError>;

    /// Returns `false` when no such site existed
    async fn delete_site(&self, site_number: i32) -> Result<bool, AppError>;

    async fn set_hidden(&self, site_number: i32, hidden: bool) -> Result<LandingPage, AppError>;

    async fn set_published(
        &self,
        site_number: i32,
        published: bool,
    ) -> Result<LandingPage, AppError>;

    async fn update_name(&self, site_number: i32, name: &str) -> Result<LandingPage, AppError>;

    async fn update_cta_url(
        &self,
        site_number: i32,
        cta_url: Option<&str>,
    ) -> Result<LandingPage, AppError>;

    async fn update_tag_flags(
        &self,
        site_number: i32,
        flags: TagFlags,
    ) -> Result<LandingPage, AppError>;

    /// Apply every entry or none of them
    async fn set_sort_orders(&self, entries: &[SortOrderEntry]) -> Result<(), AppError>;

    /// One past the greatest sort order in use
    async fn next_sort_order(&self) -> Result<i32, AppError>;
}

fn site_not_found(site_number: i32) -> AppError {
    AppError::NotFound(format!("Site {} not found", site_number))
}

/// Postgres-backed site registry
#[derive(Clone)]
pub struct SiteRepository {
    pool: PgPool,
}

impl SiteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update_returning(
        &self,
        site_number: i32,
        set_clause: &str,
        bind: impl FnOnce(
            sqlx::query::QueryAs<'_, Postgres, LandingPage, sqlx::postgres::PgArguments>,
        )
            -> sqlx::query::QueryAs<'_, Postgres, LandingPage, sqlx::postgres::PgArguments>,
    ) -> Result<LandingPage, AppError> {
        let sql = format!(
            "UPDATE landing_pages SET {}, updated_at = NOW() WHERE site_number = $1 RETURNING {}",
            set_clause, SITE_COLUMNS
        );
        let query = sqlx::query_as::<Postgres, LandingPage>(&sql).bind(site_number);

        bind(query)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| site_not_found(site_number))
    }
}

#[async_trait]
impl SiteStore for SiteRepository {
    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "select"))]
    async fn next_site_number(&self) -> Result<i32, AppError> {
        let next = sqlx::query_scalar::<Postgres, i32>(
            r#"
            SELECT GREATEST(
                COALESCE((SELECT last_issued FROM site_number_counter WHERE id = 1), -1),
                COALESCE((SELECT MAX(site_number) FROM landing_pages), -1)
            ) + 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(next)
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "select"))]
    async fn get_site(&self, site_number: i32) -> Result<Option<LandingPage>, AppError> {
        let sql = format!(
            "SELECT {} FROM landing_pages WHERE site_number = $1",
            SITE_COLUMNS
        );
        let site = sqlx::query_as::<Postgres, LandingPage>(&sql)
            .bind(site_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(site)
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "select"))]
    async fn list_sites(&self) -> Result<Vec<LandingPage>, AppError> {
        let sql = format!(
            "SELECT {} FROM landing_pages ORDER BY sort_order ASC, site_number ASC",
            SITE_COLUMNS
        );
        let sites = sqlx::query_as::<Postgres, LandingPage>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(sites)
    }

    #[tracing::instrument(skip(self, site), fields(db.table = "landing_pages", db.operation = "insert", site_number = site.site_number))]
    async fn create_site(&self, site: NewLandingPage) -> Result<LandingPage, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "create_site").await?;

        let sql = format!(
            r#"
            INSERT INTO landing_pages (
                site_number, name, has_analytics_tag, has_tracking_script, has_cta_marker,
                storage_path, cta_url, sort_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            SITE_COLUMNS
        );
        let created = sqlx::query_as::<Postgres, LandingPage>(&sql)
            .bind(site.site_number)
            .bind(&site.name)
            .bind(site.flags.analytics_tag)
            .bind(site.flags.tracking_script)
            .bind(site.flags.cta_marker)
            .bind(site_storage_path(site.site_number))
            .bind(&site.cta_url)
            .bind(site.sort_order)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict(
                    format!("Site {} already exists", site.site_number),
                ),
                other => AppError::Database(other),
            })?;

        sqlx::query(
            r#"
            INSERT INTO site_number_counter (id, last_issued)
            VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE
            SET last_issued = GREATEST(site_number_counter.last_issued, EXCLUDED.last_issued)
            "#,
        )
        .bind(site.site_number)
        .execute(&mut **tx)
        .await?;

        tx.commit().await?;

        tracing::info!(site_number = created.site_number, "Site created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, flags), fields(db.table = "landing_pages", db.operation = "update"))]
    async fn update_after_upload(
        &self,
        site_number: i32,
        name: &str,
        flags: TagFlags,
    ) -> Result<LandingPage, AppError> {
        self.update_returning(
            site_number,
            "name = $2, has_analytics_tag = $3, has_tracking_script = $4, has_cta_marker = $5",
            |q| {
                q.bind(name.to_string())
                    .bind(flags.analytics_tag)
                    .bind(flags.tracking_script)
                    .bind(flags.cta_marker)
            },
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "delete"))]
    async fn delete_site(&self, site_number: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM landing_pages WHERE site_number = $1")
            .bind(site_number)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "update"))]
    async fn set_hidden(&self, site_number: i32, hidden: bool) -> Result<LandingPage, AppError> {
        self.update_returning(site_number, "is_hidden = $2", |q| q.bind(hidden))
            .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "update"))]
    async fn set_published(
        &self,
        site_number: i32,
        published: bool,
    ) -> Result<LandingPage, AppError> {
        self.update_returning(site_number, "is_published = $2", |q| q.bind(published))
            .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "update"))]
    async fn update_name(&self, site_number: i32, name: &str) -> Result<LandingPage, AppError> {
        self.update_returning(site_number, "name = $2", |q| q.bind(name.to_string()))
            .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "update"))]
    async fn update_cta_url(
        &self,
        site_number: i32,
        cta_url: Option<&str>,
    ) -> Result<LandingPage, AppError> {
        let cta_url = cta_url.map(str::to_string);
        self.update_returning(site_number, "cta_url = $2", |q| q.bind(cta_url))
            .await
    }

    #[tracing::instrument(skip(self, flags), fields(db.table = "landing_pages", db.operation = "update"))]
    async fn update_tag_flags(
        &self,
        site_number: i32,
        flags: TagFlags,
    ) -> Result<LandingPage, AppError> {
        self.update_returning(
            site_number,
            "has_analytics_tag = $2, has_tracking_script = $3, has_cta_marker = $4",
            |q| {
                q.bind(flags.analytics_tag)
                    .bind(flags.tracking_script)
                    .bind(flags.cta_marker)
            },
        )
        .await
    }

    #[tracing::instrument(skip(self, entries), fields(db.table = "landing_pages", db.operation = "update", entries = entries.len()))]
    async fn set_sort_orders(&self, entries: &[SortOrderEntry]) -> Result<(), AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "set_sort_orders").await?;

        for entry in entries {
            let result = sqlx::query(
                "UPDATE landing_pages SET sort_order = $2, updated_at = NOW() WHERE site_number = $1",
            )
            .bind(entry.site_number)
            .bind(entry.order)
            .execute(&mut **tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(site_not_found(entry.site_number));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "select"))]
    async fn next_sort_order(&self) -> Result<i32, AppError> {
        let next = sqlx::query_scalar::<Postgres, i32>(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM landing_pages",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(next)
    }
}
