//! `TrackingRepository` against Postgres: one table per event kind.

mod helpers;

use helpers::setup_test_db;
use lander_core::models::{ClientInfo, TrackingEvent, TrackingEventKind};
use lander_db::{TrackingRepository, TrackingStore};

fn event(kind: TrackingEventKind) -> TrackingEvent {
    TrackingEvent {
        lp_id: "3".into(),
        campaign_code: Some("AAA-ABC123".into()),
        session_id: "sess_abc".into(),
        kind,
    }
}

fn summary(max_scroll_depth: i32, cta_clicked: bool) -> TrackingEventKind {
    TrackingEventKind::EngagementSummary {
        max_scroll_depth,
        total_dwell_time: 12,
        engagement_level: 3,
        cta_clicked,
        utm_source: Some("google".into()),
        utm_medium: None,
        utm_campaign: None,
    }
}

#[tokio::test]
async fn test_events_land_in_their_tables() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let repo = TrackingRepository::new(db.pool.clone());
    let client = ClientInfo {
        user_agent: Some("Mozilla/5.0".into()),
        referrer: None,
        ip_address: Some("203.0.113.7".into()),
    };

    repo.record(&event(TrackingEventKind::Pageview), &client)
        .await
        .unwrap();
    repo.record(
        &event(TrackingEventKind::Click {
            button_id: "line_register".into(),
            button_text: Some("LINE".into()),
        }),
        &client,
    )
    .await
    .unwrap();
    repo.record(
        &event(TrackingEventKind::Scroll {
            scroll_depth: 50,
            time_to_reach: Some(4),
        }),
        &client,
    )
    .await
    .unwrap();
    repo.record(&event(TrackingEventKind::Dwell { dwell_seconds: 10 }), &client)
        .await
        .unwrap();
    repo.record(
        &event(TrackingEventKind::SectionDwell {
            section_id: "hero".into(),
            section_name: None,
            dwell_seconds: 2.5,
        }),
        &client,
    )
    .await
    .unwrap();
    repo.record(&event(TrackingEventKind::Unknown), &client)
        .await
        .unwrap();

    for table in [
        "lp_page_views",
        "lp_click_events",
        "lp_scroll_events",
        "lp_dwell_events",
        "lp_section_dwells",
    ] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 1, "{}", table);
    }

    let ip: Option<String> = sqlx::query_scalar("SELECT ip_address FROM lp_page_views")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(ip.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_engagement_summary_is_upserted_per_session() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let repo = TrackingRepository::new(db.pool.clone());
    let client = ClientInfo::default();

    repo.record(&event(summary(40, false)), &client).await.unwrap();
    repo.record(&event(summary(90, true)), &client).await.unwrap();

    let rows: Vec<(i32, bool, Option<String>)> = sqlx::query_as(
        "SELECT max_scroll_depth, cta_clicked, utm_source FROM lp_engagement_summaries",
    )
    .fetch_all(&db.pool)
    .await
    .unwrap();
    assert_eq!(rows, vec![(90, true, Some("google".to_string()))]);
}
