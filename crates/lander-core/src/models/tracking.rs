use serde::{Deserialize, Serialize};

/// One beacon from the landing-page tracking script
///
/// The script posts flat camelCase JSON whose `type` selects the event kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// Site number as the page reports it (path segment or `lp-number` meta)
    pub lp_id: String,
    #[serde(default)]
    pub campaign_code: Option<String>,
    pub session_id: String,
    #[serde(flatten)]
    pub kind: TrackingEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TrackingEventKind {
    Pageview,
    Click {
        button_id: String,
        #[serde(default)]
        button_text: Option<String>,
    },
    Scroll {
        /// Percentage threshold reached (25, 50, 75, 90)
        scroll_depth: i32,
        #[serde(default)]
        time_to_reach: Option<i32>,
    },
    Dwell {
        dwell_seconds: i32,
    },
    SectionDwell {
        section_id: String,
        #[serde(default)]
        section_name: Option<String>,
        dwell_seconds: f64,
    },
    /// Sent on page hide; one row per session, later beacons overwrite it
    EngagementSummary {
        #[serde(default)]
        max_scroll_depth: i32,
        #[serde(default)]
        total_dwell_time: i32,
        #[serde(default)]
        engagement_level: i32,
        #[serde(default)]
        cta_clicked: bool,
        #[serde(default)]
        utm_source: Option<String>,
        #[serde(default)]
        utm_medium: Option<String>,
        #[serde(default)]
        utm_campaign: Option<String>,
    },
    /// Event types this server does not record
    #[serde(other)]
    Unknown,
}

impl TrackingEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            TrackingEventKind::Pageview => "pageview",
            TrackingEventKind::Click { .. } => "click",
            TrackingEventKind::Scroll { .. } => "scroll",
            TrackingEventKind::Dwell { .. } => "dwell",
            TrackingEventKind::SectionDwell { .. } => "section_dwell",
            TrackingEventKind::EngagementSummary { .. } => "engagement_summary",
            TrackingEventKind::Unknown => "unknown",
        }
    }
}

/// Request metadata stored with page views
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    /// First hop of `X-Forwarded-For`
    pub ip_address: Option<String>,
}

/// Response body of the event endpoint; failures never surface as HTTP errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingAck {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_beacon_payloads() {
        let event: TrackingEvent = serde_json::from_str(
            r#"{"type":"scroll","lpId":"3","campaignCode":"AAA-X1Y2Z3","sessionId":"sess_1","scrollDepth":50,"timeToReach":4}"#,
        )
        .unwrap();
        assert_eq!(event.lp_id, "3");
        assert_eq!(event.campaign_code.as_deref(), Some("AAA-X1Y2Z3"));
        assert_eq!(
            event.kind,
            TrackingEventKind::Scroll {
                scroll_depth: 50,
                time_to_reach: Some(4)
            }
        );

        let event: TrackingEvent = serde_json::from_str(
            r#"{"type":"section_dwell","lpId":"3","sessionId":"s","sectionId":"hero","dwellSeconds":2.5}"#,
        )
        .unwrap();
        assert_eq!(event.kind.name(), "section_dwell");
    }

    #[test]
    fn test_unknown_type_is_tolerated() {
        let event: TrackingEvent =
            serde_json::from_str(r#"{"type":"heatmap","lpId":"1","sessionId":"s","x":3}"#).unwrap();
        assert_eq!(event.kind, TrackingEventKind::Unknown);
    }
}
