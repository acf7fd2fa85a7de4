pub mod events;

use crate::database::DbPool;
use crate::errors::CampaignResult;
use crate::models::{fmt_ts, parse_ts, BusinessContact, EmailStatus, OutreachRecord, OutreachType};
use chrono::{Duration, Utc};
use events::{DeliveryEvent, EventKind, EventOutcome};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

const RECORD_COLUMNS: &str = "id, business_name, business_email, location, outreach_type, \
     search_query, date_contacted, email_status, tracking_id, provider_message_id, \
     delivered_at, opened_at, clicked_at, responded_at, converted_at, bounce_reason, \
     cooldown_until, click_count, visited_site";

/// Append-only log of every contact attempt, updated synchronously at send
/// time and asynchronously by delivery events. Rows are never deleted.
#[derive(Clone)]
pub struct OutreachLog {
    pool: DbPool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub status: Option<EmailStatus>,
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct RecordPage {
    pub records: Vec<OutreachRecord>,
    pub total_count: i64,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementStats {
    pub total_contacted: i64,
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub site_visits: i64,
}

impl OutreachLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Synchronous write path: exactly one append per send attempt, success
    /// or failure, with a cooldown window starting now.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_attempt(
        &self,
        contact: &BusinessContact,
        outreach_type: OutreachType,
        search_query: &str,
        tracking_id: &str,
        status: EmailStatus,
        provider_message_id: Option<&str>,
        cooldown_days: u32,
    ) -> CampaignResult<OutreachRecord> {
        let now = Utc::now();
        let record = OutreachRecord {
            id: Uuid::new_v4().to_string(),
            business_name: contact.name.clone(),
            business_email: contact.email.clone(),
            location: contact.location.clone(),
            outreach_type,
            search_query: search_query.to_string(),
            date_contacted: now,
            email_status: status,
            tracking_id: tracking_id.to_string(),
            provider_message_id: provider_message_id.map(|s| s.to_string()),
            delivered_at: None,
            opened_at: None,
            clicked_at: None,
            responded_at: None,
            converted_at: None,
            bounce_reason: None,
            cooldown_until: now + Duration::days(cooldown_days as i64),
            click_count: 0,
            visited_site: false,
        };

        let conn = self.pool.get().await?;
        conn.execute(
            r#"
            INSERT INTO outreach_log (
                id, business_name, business_email, location, outreach_type,
                search_query, date_contacted, email_status, tracking_id,
                provider_message_id, cooldown_until, click_count, visited_site
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, 0)
            "#,
            params![
                record.id,
                record.business_name,
                record.business_email,
                record.location,
                record.outreach_type.as_str(),
                record.search_query,
                fmt_ts(record.date_contacted),
                record.email_status.as_str(),
                record.tracking_id,
                record.provider_message_id,
                fmt_ts(record.cooldown_until),
            ],
        )?;

        debug!(
            "Logged outreach attempt {} -> {} ({})",
            record.business_email,
            record.email_status.as_str(),
            record.id
        );
        Ok(record)
    }

    /// Asynchronous write path. Timestamp slots are monotonic (the earliest
    /// event wins, equal-or-later duplicates are no-ops), so replaying a
    /// webhook cannot corrupt state.
    pub async fn apply_event(&self, event: &DeliveryEvent) -> CampaignResult<EventOutcome> {
        let conn = self.pool.get().await?;

        let record_id: Option<String> = conn
            .query_row(
                r#"
                SELECT id FROM outreach_log
                WHERE (?1 IS NOT NULL AND tracking_id = ?1)
                   OR (?2 IS NOT NULL AND provider_message_id = ?2)
                LIMIT 1
                "#,
                params![event.tracking_id, event.provider_message_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(id) = record_id else {
            warn!(
                "Dropping {} event for unknown tracking id {:?} / message id {:?}",
                event.kind.as_str(),
                event.tracking_id,
                event.provider_message_id
            );
            return Ok(EventOutcome::UnknownRecord);
        };

        let ts = fmt_ts(event.timestamp);
        match event.kind {
            EventKind::Delivered => {
                conn.execute(
                    r#"
                    UPDATE outreach_log SET
                        delivered_at = CASE
                            WHEN delivered_at IS NULL OR delivered_at > ?2 THEN ?2
                            ELSE delivered_at END,
                        email_status = CASE
                            WHEN email_status = 'sent' THEN 'delivered'
                            ELSE email_status END
                    WHERE id = ?1
                    "#,
                    params![id, ts],
                )?;
            }
            EventKind::Opened => {
                conn.execute(
                    r#"
                    UPDATE outreach_log SET
                        opened_at = CASE
                            WHEN opened_at IS NULL OR opened_at > ?2 THEN ?2
                            ELSE opened_at END,
                        email_status = CASE
                            WHEN email_status IN ('sent', 'delivered') THEN 'opened'
                            ELSE email_status END
                    WHERE id = ?1
                    "#,
                    params![id, ts],
                )?;
            }
            EventKind::Clicked => {
                conn.execute(
                    r#"
                    UPDATE outreach_log SET
                        click_count = CASE
                            WHEN clicked_at IS NULL THEN 1
                            WHEN ?2 > clicked_at THEN click_count + 1
                            ELSE click_count END,
                        clicked_at = CASE
                            WHEN clicked_at IS NULL OR clicked_at > ?2 THEN ?2
                            ELSE clicked_at END,
                        visited_site = 1,
                        email_status = CASE
                            WHEN email_status IN ('sent', 'delivered', 'opened') THEN 'clicked'
                            ELSE email_status END
                    WHERE id = ?1
                    "#,
                    params![id, ts],
                )?;
            }
            EventKind::Bounced => {
                // Bounces are only reachable before delivery confirms.
                conn.execute(
                    r#"
                    UPDATE outreach_log SET
                        email_status = CASE
                            WHEN email_status = 'sent' THEN 'bounced'
                            ELSE email_status END,
                        bounce_reason = CASE
                            WHEN email_status = 'sent' THEN COALESCE(bounce_reason, ?2)
                            ELSE bounce_reason END
                    WHERE id = ?1
                    "#,
                    params![id, event.reason.as_deref().unwrap_or("bounced")],
                )?;
            }
        }

        debug!("Applied {} event to record {}", event.kind.as_str(), id);
        Ok(EventOutcome::Applied)
    }

    /// Out-of-band engagement flags, independent of delivery state.
    pub async fn mark_responded(&self, id: &str) -> CampaignResult<bool> {
        let conn = self.pool.get().await?;
        let changed = conn.execute(
            "UPDATE outreach_log SET responded_at = COALESCE(responded_at, ?2) WHERE id = ?1",
            params![id, fmt_ts(Utc::now())],
        )?;
        Ok(changed > 0)
    }

    pub async fn mark_converted(&self, id: &str) -> CampaignResult<bool> {
        let conn = self.pool.get().await?;
        let changed = conn.execute(
            "UPDATE outreach_log SET converted_at = COALESCE(converted_at, ?2) WHERE id = ?1",
            params![id, fmt_ts(Utc::now())],
        )?;
        Ok(changed > 0)
    }

    pub async fn get_by_id(&self, id: &str) -> CampaignResult<Option<OutreachRecord>> {
        let conn = self.pool.get().await?;
        let record = conn
            .query_row(
                &format!("SELECT {} FROM outreach_log WHERE id = ?1", RECORD_COLUMNS),
                params![id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    pub async fn latest_for_email(&self, email: &str) -> CampaignResult<Option<OutreachRecord>> {
        let conn = self.pool.get().await?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM outreach_log WHERE business_email = ?1 \
                     ORDER BY date_contacted DESC LIMIT 1",
                    RECORD_COLUMNS
                ),
                params![email],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    pub async fn stats(&self) -> CampaignResult<EngagementStats> {
        let conn = self.pool.get().await?;

        let (total, sent, delivered, opened, clicked, visits): (i64, i64, i64, i64, i64, i64) =
            conn.query_row(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN email_status != 'failed' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN delivered_at IS NOT NULL
                        OR email_status IN ('delivered', 'opened', 'clicked') THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN opened_at IS NOT NULL THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN clicked_at IS NOT NULL THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(visited_site), 0)
                FROM outreach_log
                "#,
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )?;

        let rate = |num: i64, den: i64| {
            if den > 0 {
                (num as f64 / den as f64) * 100.0
            } else {
                0.0
            }
        };

        Ok(EngagementStats {
            total_contacted: total,
            delivery_rate: rate(delivered, sent),
            open_rate: rate(opened, delivered),
            click_rate: rate(clicked, delivered),
            site_visits: visits,
        })
    }

    /// Read side for the admin audit view: filter, order newest first,
    /// paginate.
    pub async fn query(&self, filter: &RecordFilter) -> CampaignResult<RecordPage> {
        let conn = self.pool.get().await?;

        let mut where_conditions: Vec<String> = Vec::new();
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            where_conditions.push(format!("email_status = ?{}", params_vec.len() + 1));
            params_vec.push(status.as_str().to_string());
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let like = format!("%{}%", search.trim());
            where_conditions.push(format!(
                "(business_name LIKE ?{n} OR business_email LIKE ?{n} OR search_query LIKE ?{n})",
                n = params_vec.len() + 1
            ));
            params_vec.push(like);
        }

        let where_clause = if where_conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_conditions.join(" AND "))
        };

        let total_count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM outreach_log {}", where_clause),
            rusqlite::params_from_iter(params_vec.iter()),
            |row| row.get(0),
        )?;

        // limit 0 means "everything", used by the audit export
        let limit_sql: i64 = if filter.limit == 0 {
            -1
        } else {
            filter.limit as i64
        };
        let query = format!(
            "SELECT {} FROM outreach_log {} ORDER BY date_contacted DESC LIMIT {} OFFSET {}",
            RECORD_COLUMNS, where_clause, limit_sql, filter.offset
        );

        let mut stmt = conn.prepare(&query)?;
        let record_iter =
            stmt.query_map(rusqlite::params_from_iter(params_vec.iter()), row_to_record)?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }

        Ok(RecordPage {
            records,
            total_count,
            limit: filter.limit,
            offset: filter.offset,
        })
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<OutreachRecord> {
    let get_ts = |idx: usize| -> rusqlite::Result<Option<chrono::DateTime<Utc>>> {
        let value: Option<String> = row.get(idx)?;
        Ok(value.as_deref().and_then(parse_ts))
    };

    let required_ts = |idx: usize| -> rusqlite::Result<chrono::DateTime<Utc>> {
        let value: String = row.get(idx)?;
        parse_ts(&value).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(idx, value, rusqlite::types::Type::Text)
        })
    };

    let outreach_type_str: String = row.get(4)?;
    let status_str: String = row.get(7)?;

    Ok(OutreachRecord {
        id: row.get(0)?,
        business_name: row.get(1)?,
        business_email: row.get(2)?,
        location: row.get(3)?,
        outreach_type: OutreachType::parse(&outreach_type_str).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(4, outreach_type_str, rusqlite::types::Type::Text)
        })?,
        search_query: row.get(5)?,
        date_contacted: required_ts(6)?,
        email_status: EmailStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(7, status_str, rusqlite::types::Type::Text)
        })?,
        tracking_id: row.get(8)?,
        provider_message_id: row.get(9)?,
        delivered_at: get_ts(10)?,
        opened_at: get_ts(11)?,
        clicked_at: get_ts(12)?,
        responded_at: get_ts(13)?,
        converted_at: get_ts(14)?,
        bounce_reason: row.get(15)?,
        cooldown_until: required_ts(16)?,
        click_count: row.get(17)?,
        visited_site: row.get::<_, i64>(18)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_db_pool;
    use crate::models::PriceEstimate;
    use chrono::TimeZone;

    async fn test_log() -> (tempfile::TempDir, OutreachLog) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outreach.db");
        let pool = create_db_pool(path.to_str().unwrap()).await.unwrap();
        (dir, OutreachLog::new(pool))
    }

    fn contact(email: &str) -> BusinessContact {
        BusinessContact {
            name: "Leeds Kitchen Fitters".to_string(),
            email: email.to_string(),
            phone: None,
            website: None,
            location: "Leeds".to_string(),
            category: "kitchen".to_string(),
            source_id: None,
            rating: None,
            price_estimate: PriceEstimate::Unknown,
            opening_hours: None,
        }
    }

    async fn seed_sent(log: &OutreachLog, email: &str, tracking_id: &str) -> OutreachRecord {
        log.record_attempt(
            &contact(email),
            OutreachType::SystematicDiscovery,
            "kitchen",
            tracking_id,
            EmailStatus::Sent,
            Some("<msg-1@mailgun>"),
            30,
        )
        .await
        .unwrap()
    }

    fn event(kind: EventKind, tracking_id: &str, ts: chrono::DateTime<Utc>) -> DeliveryEvent {
        DeliveryEvent {
            kind,
            provider_message_id: None,
            tracking_id: Some(tracking_id.to_string()),
            timestamp: ts,
            reason: None,
        }
    }

    #[tokio::test]
    async fn attempt_append_sets_cooldown_and_status() {
        let (_dir, log) = test_log().await;
        let record = seed_sent(&log, "info@a.co.uk", "trk-1").await;

        assert_eq!(record.email_status, EmailStatus::Sent);
        assert!(record.cooldown_until > record.date_contacted);

        let stored = log.latest_for_email("info@a.co.uk").await.unwrap().unwrap();
        assert_eq!(stored.id, record.id);
        assert_eq!(stored.click_count, 0);
        assert!(!stored.visited_site);
    }

    #[tokio::test]
    async fn opened_event_is_idempotent() {
        let (_dir, log) = test_log().await;
        seed_sent(&log, "info@a.co.uk", "trk-1").await;

        let ts = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
        log.apply_event(&event(EventKind::Opened, "trk-1", ts))
            .await
            .unwrap();
        let first = log.latest_for_email("info@a.co.uk").await.unwrap().unwrap();

        log.apply_event(&event(EventKind::Opened, "trk-1", ts))
            .await
            .unwrap();
        let second = log.latest_for_email("info@a.co.uk").await.unwrap().unwrap();

        assert_eq!(first.opened_at, second.opened_at);
        assert_eq!(second.opened_at, Some(ts));
        assert_eq!(second.email_status, EmailStatus::Opened);
    }

    #[tokio::test]
    async fn duplicate_click_does_not_double_count() {
        let (_dir, log) = test_log().await;
        seed_sent(&log, "info@a.co.uk", "trk-1").await;

        let ts = Utc.with_ymd_and_hms(2026, 8, 1, 11, 0, 0).unwrap();
        log.apply_event(&event(EventKind::Clicked, "trk-1", ts))
            .await
            .unwrap();
        log.apply_event(&event(EventKind::Clicked, "trk-1", ts))
            .await
            .unwrap();

        let record = log.latest_for_email("info@a.co.uk").await.unwrap().unwrap();
        assert_eq!(record.click_count, 1);
        assert!(record.visited_site);
        assert_eq!(record.email_status, EmailStatus::Clicked);

        // a genuinely later click is a second visit
        let later = Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap();
        log.apply_event(&event(EventKind::Clicked, "trk-1", later))
            .await
            .unwrap();
        let record = log.latest_for_email("info@a.co.uk").await.unwrap().unwrap();
        assert_eq!(record.click_count, 2);
        assert_eq!(record.clicked_at, Some(ts));
    }

    #[tokio::test]
    async fn status_never_moves_backwards() {
        let (_dir, log) = test_log().await;
        seed_sent(&log, "info@a.co.uk", "trk-1").await;

        let t1 = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 8, 1, 11, 0, 0).unwrap();

        log.apply_event(&event(EventKind::Opened, "trk-1", t2))
            .await
            .unwrap();
        // late-arriving delivered event must not demote the status
        log.apply_event(&event(EventKind::Delivered, "trk-1", t1))
            .await
            .unwrap();

        let record = log.latest_for_email("info@a.co.uk").await.unwrap().unwrap();
        assert_eq!(record.email_status, EmailStatus::Opened);
        assert_eq!(record.delivered_at, Some(t1));
    }

    #[tokio::test]
    async fn bounce_is_absorbing_and_only_reachable_before_delivery() {
        let (_dir, log) = test_log().await;
        seed_sent(&log, "info@a.co.uk", "trk-1").await;

        let t1 = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
        let mut bounce = event(EventKind::Bounced, "trk-1", t1);
        bounce.reason = Some("550 mailbox unavailable".to_string());

        log.apply_event(&bounce).await.unwrap();
        let record = log.latest_for_email("info@a.co.uk").await.unwrap().unwrap();
        assert_eq!(record.email_status, EmailStatus::Bounced);
        assert_eq!(
            record.bounce_reason.as_deref(),
            Some("550 mailbox unavailable")
        );

        // a stray delivered event afterwards cannot resurrect the record
        log.apply_event(&event(EventKind::Delivered, "trk-1", t1))
            .await
            .unwrap();
        let record = log.latest_for_email("info@a.co.uk").await.unwrap().unwrap();
        assert_eq!(record.email_status, EmailStatus::Bounced);
    }

    #[tokio::test]
    async fn unknown_tracking_id_is_dropped_with_warning() {
        let (_dir, log) = test_log().await;
        let ts = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();

        let outcome = log
            .apply_event(&event(EventKind::Opened, "trk-ghost", ts))
            .await
            .unwrap();
        assert_eq!(outcome, EventOutcome::UnknownRecord);
    }

    #[tokio::test]
    async fn events_match_by_provider_message_id_too() {
        let (_dir, log) = test_log().await;
        seed_sent(&log, "info@a.co.uk", "trk-1").await;

        let ts = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
        let delivered = DeliveryEvent {
            kind: EventKind::Delivered,
            provider_message_id: Some("<msg-1@mailgun>".to_string()),
            tracking_id: None,
            timestamp: ts,
            reason: None,
        };

        assert_eq!(
            log.apply_event(&delivered).await.unwrap(),
            EventOutcome::Applied
        );
        let record = log.latest_for_email("info@a.co.uk").await.unwrap().unwrap();
        assert_eq!(record.email_status, EmailStatus::Delivered);
    }

    #[tokio::test]
    async fn responded_and_converted_are_independent_flags() {
        let (_dir, log) = test_log().await;
        let record = seed_sent(&log, "info@a.co.uk", "trk-1").await;

        assert!(log.mark_responded(&record.id).await.unwrap());
        assert!(log.mark_converted(&record.id).await.unwrap());
        assert!(!log.mark_converted("no-such-id").await.unwrap());

        let stored = log.get_by_id(&record.id).await.unwrap().unwrap();
        assert!(stored.responded_at.is_some());
        assert!(stored.converted_at.is_some());
        assert_eq!(stored.email_status, EmailStatus::Sent);
    }

    #[tokio::test]
    async fn stats_aggregate_over_all_records() {
        let (_dir, log) = test_log().await;
        seed_sent(&log, "info@a.co.uk", "trk-1").await;
        seed_sent(&log, "info@b.co.uk", "trk-2").await;
        log.record_attempt(
            &contact("info@c.co.uk"),
            OutreachType::SystematicDiscovery,
            "kitchen",
            "trk-3",
            EmailStatus::Failed,
            None,
            30,
        )
        .await
        .unwrap();

        let ts = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
        log.apply_event(&event(EventKind::Delivered, "trk-1", ts))
            .await
            .unwrap();
        log.apply_event(&event(EventKind::Clicked, "trk-1", ts))
            .await
            .unwrap();

        let stats = log.stats().await.unwrap();
        assert_eq!(stats.total_contacted, 3);
        assert_eq!(stats.delivery_rate, 50.0);
        assert_eq!(stats.click_rate, 100.0);
        assert_eq!(stats.site_visits, 1);
    }

    #[tokio::test]
    async fn query_filters_and_paginates() {
        let (_dir, log) = test_log().await;
        seed_sent(&log, "info@alpha.co.uk", "trk-1").await;
        seed_sent(&log, "info@beta.co.uk", "trk-2").await;
        log.record_attempt(
            &contact("info@gamma.co.uk"),
            OutreachType::SystematicDiscovery,
            "kitchen",
            "trk-3",
            EmailStatus::Failed,
            None,
            30,
        )
        .await
        .unwrap();

        let page = log
            .query(&RecordFilter {
                status: Some(EmailStatus::Sent),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);

        let page = log
            .query(&RecordFilter {
                search: Some("beta".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.records[0].business_email, "info@beta.co.uk");

        let page = log
            .query(&RecordFilter {
                limit: 2,
                offset: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.records.len(), 1);
    }
}
