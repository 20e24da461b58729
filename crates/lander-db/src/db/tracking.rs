use async_trait::async_trait;
use lander_core::models::{ClientInfo, TrackingEvent, TrackingEventKind};
use lander_core::AppError;
use sqlx::PgPool;

/// Landing-page tracking event persistence
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Append the event to its table. Engagement summaries are upserted per
    /// session; `Unknown` events are not stored.
    async fn record(&self, event: &TrackingEvent, client: &ClientInfo) -> Result<(), AppError>;
}

/// Postgres-backed tracking store
#[derive(Clone)]
pub struct TrackingRepository {
    pool: PgPool,
}

impl TrackingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackingStore for TrackingRepository {
    #[tracing::instrument(skip(self, event, client), fields(event_type = event.kind.name(), lp_id = %event.lp_id))]
    async fn record(&self, event: &TrackingEvent, client: &ClientInfo) -> Result<(), AppError> {
        let campaign_code = event.campaign_code.as_deref().filter(|c| !c.is_empty());

        match &event.kind {
            TrackingEventKind::Pageview => {
                sqlx::query(
                    r#"
                    INSERT INTO lp_page_views (lp_id, campaign_code, session_id, user_agent, referrer, ip_address)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(&event.lp_id)
                .bind(campaign_code)
                .bind(&event.session_id)
                .bind(&client.user_agent)
                .bind(&client.referrer)
                .bind(&client.ip_address)
                .execute(&self.pool)
                .await?;
            }
            TrackingEventKind::Click {
                button_id,
                button_text,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO lp_click_events (lp_id, campaign_code, session_id, button_id, button_text)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(&event.lp_id)
                .bind(campaign_code)
                .bind(&event.session_id)
                .bind(button_id)
                .bind(button_text)
                .execute(&self.pool)
                .await?;
            }
            TrackingEventKind::Scroll {
                scroll_depth,
                time_to_reach,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO lp_scroll_events (lp_id, campaign_code, session_id, scroll_depth, time_to_reach)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(&event.lp_id)
                .bind(campaign_code)
                .bind(&event.session_id)
                .bind(scroll_depth)
                .bind(time_to_reach)
                .execute(&self.pool)
                .await?;
            }
            TrackingEventKind::Dwell { dwell_seconds } => {
                sqlx::query(
                    r#"
                    INSERT INTO lp_dwell_events (lp_id, campaign_code, session_id, dwell_seconds)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(&event.lp_id)
                .bind(campaign_code)
                .bind(&event.session_id)
                .bind(dwell_seconds)
                .execute(&self.pool)
                .await?;
            }
            TrackingEventKind::SectionDwell {
                section_id,
                section_name,
                dwell_seconds,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO lp_section_dwells (lp_id, campaign_code, session_id, section_id, section_name, dwell_seconds)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(&event.lp_id)
                .bind(campaign_code)
                .bind(&event.session_id)
                .bind(section_id)
                .bind(section_name)
                .bind(dwell_seconds)
                .execute(&self.pool)
                .await?;
            }
            TrackingEventKind::EngagementSummary {
                max_scroll_depth,
                total_dwell_time,
                engagement_level,
                cta_clicked,
                utm_source,
                utm_medium,
                utm_campaign,
            } => {
                // Later beacons of a session only refresh the measurements
                sqlx::query(
                    r#"
                    INSERT INTO lp_engagement_summaries (
                        lp_id, campaign_code, session_id, max_scroll_depth, total_dwell_time,
                        engagement_level, cta_clicked, utm_source, utm_medium, utm_campaign
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    ON CONFLICT (session_id) DO UPDATE
                    SET max_scroll_depth = EXCLUDED.max_scroll_depth,
                        total_dwell_time = EXCLUDED.total_dwell_time,
                        engagement_level = EXCLUDED.engagement_level,
                        cta_clicked = EXCLUDED.cta_clicked,
                        updated_at = NOW()
                    "#,
                )
                .bind(&event.lp_id)
                .bind(campaign_code)
                .bind(&event.session_id)
                .bind(max_scroll_depth)
                .bind(total_dwell_time)
                .bind(engagement_level)
                .bind(cta_clicked)
                .bind(utm_source)
                .bind(utm_medium)
                .bind(utm_campaign)
                .execute(&self.pool)
                .await?;
            }
            TrackingEventKind::Unknown => {}
        }

        Ok(())
    }
}
