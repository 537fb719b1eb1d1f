use std::time::Duration;

use centro_core::{ListParams, ListResult, ServiceError, now_rfc3339, store};
use centro_sql::Value;

use super::NotifyService;
use super::dispatch::notification_indexes;
use crate::model::{Notification, TriggerExecution};

/// Longest a feed poll is allowed to park, in seconds.
const MAX_POLL_SECS: u64 = 120;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedFilters {
    #[serde(default)]
    pub unread: bool,
    pub channel: Option<String>,
}

/// Result of a feed poll: notifications created after the cursor, plus
/// the cursor to pass to the next poll.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPoll {
    pub notifications: Vec<Notification>,
    pub cursor: String,
}

impl NotifyService {
    pub fn list_notifications(
        &self,
        org: &str,
        params: &ListParams,
        filters: &FeedFilters,
    ) -> Result<ListResult<Notification>, ServiceError> {
        let mut cols: Vec<(&str, Value)> = Vec::new();
        if filters.unread {
            cols.push(("read", Value::Integer(0)));
        }
        if let Some(channel) = &filters.channel {
            cols.push(("channel", Value::Text(channel.clone())));
        }
        store::list_records(
            self.db.as_ref(),
            "notifications",
            org,
            &cols,
            None,
            params.limit.min(500),
            params.offset,
        )
    }

    pub fn unread_count(&self, org: &str) -> Result<i64, ServiceError> {
        store::count_records(
            self.db.as_ref(),
            "notifications",
            org,
            &[("read", Value::Integer(0))],
        )
    }

    pub fn mark_read(&self, org: &str, id: &str) -> Result<Notification, ServiceError> {
        let mut notification: Notification =
            store::get_record(self.db.as_ref(), "notifications", org, id)?;
        if notification.read {
            return Ok(notification);
        }
        notification.read = true;
        store::update_record(
            self.db.as_ref(),
            "notifications",
            org,
            id,
            &notification,
            &notification_indexes(&notification),
        )?;
        Ok(notification)
    }

    pub fn mark_all_read(&self, org: &str) -> Result<usize, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM notifications WHERE org_id = ?1 AND read = 0",
                &[Value::Text(org.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut updated = 0usize;
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let mut notification: Notification =
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
            notification.read = true;
            store::update_record(
                self.db.as_ref(),
                "notifications",
                org,
                &notification.id,
                &notification,
                &notification_indexes(&notification),
            )?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Waits up to `timeout_secs` for notifications created after `after`
    /// (defaults to now, i.e. "anything from here on"). The waiter is
    /// registered before the first read so a dispatch landing between
    /// the read and the wait still wakes us.
    pub async fn poll_feed(
        &self,
        org: &str,
        after: Option<String>,
        timeout_secs: u64,
    ) -> Result<FeedPoll, ServiceError> {
        let after = after.unwrap_or_else(now_rfc3339);
        let deadline = tokio::time::Instant::now()
            + Duration::from_secs(timeout_secs.min(MAX_POLL_SECS));
        let mut notified = Box::pin(self.feed_notify.notified());

        loop {
            let fresh = self.notifications_after(org, &after)?;
            if !fresh.is_empty() {
                return Ok(feed_poll(fresh, after));
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(feed_poll(Vec::new(), after));
            }

            tokio::select! {
                _ = &mut notified => {
                    // Woken; re-arm before looping so we can't miss the
                    // next dispatch while re-reading.
                    notified = Box::pin(self.feed_notify.notified());
                }
                _ = tokio::time::sleep(remaining) => {
                    let fresh = self.notifications_after(org, &after)?;
                    return Ok(feed_poll(fresh, after));
                }
            }
        }
    }

    pub fn list_executions(
        &self,
        org: &str,
        trigger_id: &str,
        params: &ListParams,
    ) -> Result<ListResult<TriggerExecution>, ServiceError> {
        self.get_trigger(org, trigger_id)?;
        store::list_records(
            self.db.as_ref(),
            "trigger_executions",
            org,
            &[("trigger_id", Value::Text(trigger_id.to_string()))],
            None,
            params.limit.min(500),
            params.offset,
        )
    }

    fn notifications_after(
        &self,
        org: &str,
        after: &str,
    ) -> Result<Vec<Notification>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM notifications
                 WHERE org_id = ?1 AND created_at > ?2
                 ORDER BY created_at ASC LIMIT 500",
                &[Value::Text(org.to_string()), Value::Text(after.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut fresh = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let notification: Notification =
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
            fresh.push(notification);
        }
        Ok(fresh)
    }
}

fn feed_poll(notifications: Vec<Notification>, after: String) -> FeedPoll {
    let cursor = notifications
        .last()
        .map(|n| n.created_at.clone())
        .unwrap_or(after);
    FeedPoll {
        notifications,
        cursor,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use centro_sql::SqliteStore;

    use super::*;
    use crate::model::{ChannelConfig, CreateTriggerRequest};
    use crate::outbound::RecordingOutbound;
    use crate::service::NotifyConfig;

    fn svc() -> NotifyService {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        NotifyService::new(db, Arc::new(RecordingOutbound::new()), NotifyConfig::default()).unwrap()
    }

    async fn seed(svc: &NotifyService, org: &str, event_code: &str, n: usize) {
        svc.create_trigger(
            org,
            CreateTriggerRequest {
                name: format!("{event_code} feed"),
                event_code: event_code.into(),
                channels: vec![ChannelConfig {
                    channel: "push".into(),
                    target: "device-1".into(),
                }],
                template_id: None,
                silent_window_minutes: 0,
            },
        )
        .unwrap();
        for i in 0..n {
            svc.dispatch(org, event_code, &serde_json::json!({"seq": i}))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn unread_count_and_mark_flows() {
        let svc = svc();
        seed(&svc, "org1", "stock.low", 3).await;

        assert_eq!(svc.unread_count("org1").unwrap(), 3);
        let unread = svc
            .list_notifications(
                "org1",
                &ListParams::default(),
                &FeedFilters {
                    unread: true,
                    channel: None,
                },
            )
            .unwrap();
        assert_eq!(unread.total, 3);

        let first = unread.items[0].clone();
        let marked = svc.mark_read("org1", &first.id).unwrap();
        assert!(marked.read);
        // Marking twice is a no-op.
        assert!(svc.mark_read("org1", &first.id).unwrap().read);
        assert_eq!(svc.unread_count("org1").unwrap(), 2);

        assert_eq!(svc.mark_all_read("org1").unwrap(), 2);
        assert_eq!(svc.unread_count("org1").unwrap(), 0);
        assert_eq!(svc.mark_all_read("org1").unwrap(), 0);
    }

    #[tokio::test]
    async fn channel_filter_narrows_the_feed() {
        let svc = svc();
        svc.create_trigger(
            "org1",
            CreateTriggerRequest {
                name: "Two channels".into(),
                event_code: "sale.recorded".into(),
                channels: vec![
                    ChannelConfig {
                        channel: "push".into(),
                        target: "device-1".into(),
                    },
                    ChannelConfig {
                        channel: "sms".into(),
                        target: "+525512345678".into(),
                    },
                ],
                template_id: None,
                silent_window_minutes: 0,
            },
        )
        .unwrap();
        svc.dispatch("org1", "sale.recorded", &serde_json::json!({}))
            .await
            .unwrap();

        let sms = svc
            .list_notifications(
                "org1",
                &ListParams::default(),
                &FeedFilters {
                    unread: false,
                    channel: Some("sms".into()),
                },
            )
            .unwrap();
        assert_eq!(sms.total, 1);
        assert_eq!(sms.items[0].channel, "sms");
    }

    #[tokio::test]
    async fn feed_is_org_scoped() {
        let svc = svc();
        seed(&svc, "org1", "stock.low", 1).await;
        assert_eq!(svc.unread_count("org2").unwrap(), 0);
        let other = svc
            .list_notifications("org2", &ListParams::default(), &FeedFilters::default())
            .unwrap();
        assert_eq!(other.total, 0);
    }

    #[tokio::test]
    async fn poll_returns_backlog_immediately() {
        let svc = svc();
        seed(&svc, "org1", "stock.low", 2).await;

        let poll = svc
            .poll_feed("org1", Some("2000-01-01T00:00:00+00:00".into()), 30)
            .await
            .unwrap();
        assert_eq!(poll.notifications.len(), 2);
        assert_eq!(poll.cursor, poll.notifications[1].created_at);
    }

    #[tokio::test]
    async fn poll_times_out_empty() {
        let svc = svc();
        let poll = svc.poll_feed("org1", None, 0).await.unwrap();
        assert!(poll.notifications.is_empty());
        assert!(!poll.cursor.is_empty());
    }

    #[tokio::test]
    async fn poll_wakes_on_dispatch() {
        let svc = Arc::new(svc());
        svc.create_trigger(
            "org1",
            CreateTriggerRequest {
                name: "Waker".into(),
                event_code: "stock.low".into(),
                channels: vec![ChannelConfig {
                    channel: "push".into(),
                    target: "device-1".into(),
                }],
                template_id: None,
                silent_window_minutes: 0,
            },
        )
        .unwrap();

        let waiter = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.poll_feed("org1", None, 30).await })
        };
        // Let the poll register its waiter and take its first snapshot.
        tokio::task::yield_now().await;

        svc.dispatch("org1", "stock.low", &serde_json::json!({"sku": "SKU-1"}))
            .await
            .unwrap();

        let poll = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(poll.notifications.len(), 1);
        assert_eq!(poll.notifications[0].event_code, "stock.low");
    }

    #[tokio::test]
    async fn execution_log_requires_the_trigger() {
        let svc = svc();
        let err = svc
            .list_executions("org1", "missing", &ListParams::default())
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }
}
