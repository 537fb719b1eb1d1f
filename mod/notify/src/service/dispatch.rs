use centro_core::{ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::NotifyService;
use super::trigger::trigger_indexes;
use crate::model::{ChannelConfig, EventTrigger, Notification, TriggerExecution};
use crate::render;

impl NotifyService {
    /// Fans an event out to every active trigger registered for its code.
    ///
    /// Each trigger either fires (one notification row per channel, one
    /// execution row for the whole attempt) or is skipped because its
    /// silence window has not elapsed. Returns the number of triggers
    /// that fired; silenced triggers are logged but not counted.
    pub async fn dispatch(
        &self,
        org: &str,
        event_code: &str,
        payload: &serde_json::Value,
    ) -> Result<usize, ServiceError> {
        let triggers = self.matching_triggers(org, event_code)?;
        let now = Utc::now();
        let mut fired = 0usize;

        for trigger in triggers {
            if is_silenced(&trigger, now) {
                self.record_execution(
                    org,
                    &trigger.id,
                    event_code,
                    "silenced",
                    &format!(
                        "within {} minute silence window",
                        trigger.silent_window_minutes
                    ),
                )?;
                continue;
            }
            self.fire(org, &trigger, event_code, payload).await?;
            fired += 1;
        }

        if fired > 0 {
            self.feed_notify.notify_waiters();
        }
        Ok(fired)
    }

    async fn fire(
        &self,
        org: &str,
        trigger: &EventTrigger,
        event_code: &str,
        payload: &serde_json::Value,
    ) -> Result<(), ServiceError> {
        let (title, body) = self.render_message(org, trigger, payload);
        let mut detail = Vec::with_capacity(trigger.channels.len());
        let mut any_failed = false;

        for ch in &trigger.channels {
            let (status, error) = self.deliver(ch, trigger, event_code, payload, &title, &body).await;
            if status == "failed" {
                any_failed = true;
            }
            detail.push(match &error {
                Some(err) => format!("{}: {} ({})", ch.channel, status, err),
                None => format!("{}: {}", ch.channel, status),
            });

            let notification = Notification {
                id: new_id(),
                org_id: org.to_string(),
                channel: ch.channel.clone(),
                target: ch.target.clone(),
                title: title.clone(),
                body: body.clone(),
                event_code: event_code.to_string(),
                trigger_id: Some(trigger.id.clone()),
                status: status.to_string(),
                read: false,
                created_at: now_rfc3339(),
            };
            store::insert_record(
                self.db.as_ref(),
                "notifications",
                org,
                &notification.id,
                &notification,
                &notification_indexes(&notification),
            )?;
        }

        let outcome = if any_failed { "failed" } else { "dispatched" };
        self.record_execution(org, &trigger.id, event_code, outcome, &detail.join("; "))?;

        // A silenced skip never lands here, so the window always measures
        // from the last actual delivery attempt.
        let mut bumped = trigger.clone();
        bumped.last_fired_at = Some(now_rfc3339());
        store::update_record(
            self.db.as_ref(),
            "event_triggers",
            org,
            &bumped.id,
            &bumped,
            &trigger_indexes(&bumped),
        )?;
        Ok(())
    }

    /// Sends one channel of a firing trigger. Returns the notification
    /// status ("sent", "failed" or "logged") plus an error detail when
    /// delivery did not go through.
    async fn deliver(
        &self,
        ch: &ChannelConfig,
        trigger: &EventTrigger,
        event_code: &str,
        payload: &serde_json::Value,
        title: &str,
        body: &str,
    ) -> (&'static str, Option<String>) {
        match ch.channel.as_str() {
            "webhook" => {
                let hook = serde_json::json!({
                    "event": event_code,
                    "trigger": {"id": trigger.id, "name": trigger.name},
                    "data": payload,
                    "timestamp": now_rfc3339(),
                });
                match self.outbound.post_json(&ch.target, &hook).await {
                    Ok(()) => ("sent", None),
                    Err(e) => ("failed", Some(e.to_string())),
                }
            }
            "email" => match &self.config.email_api_url {
                Some(relay) => {
                    let mail = serde_json::json!({
                        "to": ch.target,
                        "subject": title,
                        "body": body,
                    });
                    match self.outbound.post_json(relay, &mail).await {
                        Ok(()) => ("sent", None),
                        Err(e) => ("failed", Some(e.to_string())),
                    }
                }
                None => ("failed", Some("email relay not configured".into())),
            },
            // whatsapp, sms and push have no wired transport; the
            // notification row itself is the delivery.
            _ => ("logged", None),
        }
    }

    fn render_message(
        &self,
        org: &str,
        trigger: &EventTrigger,
        payload: &serde_json::Value,
    ) -> (String, String) {
        let vars = render::payload_vars(payload);
        if let Some(template_id) = &trigger.template_id {
            match self.get_template(org, template_id) {
                Ok(template) => {
                    let subject = render::render(&template.subject, &vars);
                    let title = if subject.trim().is_empty() {
                        trigger.event_code.clone()
                    } else {
                        subject
                    };
                    return (title, render::render(&template.body, &vars));
                }
                Err(_) => {
                    warn!(
                        trigger = %trigger.id,
                        template = %template_id,
                        "template missing, falling back to raw payload"
                    );
                }
            }
        }
        (trigger.event_code.clone(), payload.to_string())
    }

    fn matching_triggers(
        &self,
        org: &str,
        event_code: &str,
    ) -> Result<Vec<EventTrigger>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM event_triggers
                 WHERE org_id = ?1 AND event_code = ?2 AND active = 1
                 ORDER BY created_at",
                &[
                    Value::Text(org.to_string()),
                    Value::Text(event_code.to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut triggers = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let trigger: EventTrigger =
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
            triggers.push(trigger);
        }
        Ok(triggers)
    }

    fn record_execution(
        &self,
        org: &str,
        trigger_id: &str,
        event_code: &str,
        outcome: &str,
        detail: &str,
    ) -> Result<(), ServiceError> {
        let execution = TriggerExecution {
            id: new_id(),
            org_id: org.to_string(),
            trigger_id: trigger_id.to_string(),
            event_code: event_code.to_string(),
            outcome: outcome.to_string(),
            detail: detail.to_string(),
            executed_at: now_rfc3339(),
        };
        store::insert_record(
            self.db.as_ref(),
            "trigger_executions",
            org,
            &execution.id,
            &execution,
            &[
                ("trigger_id", Value::Text(execution.trigger_id.clone())),
                ("event_code", Value::Text(execution.event_code.clone())),
                ("outcome", Value::Text(execution.outcome.clone())),
                ("created_at", Value::Text(execution.executed_at.clone())),
            ],
        )
    }
}

fn is_silenced(trigger: &EventTrigger, now: DateTime<Utc>) -> bool {
    if trigger.silent_window_minutes == 0 {
        return false;
    }
    let Some(last) = &trigger.last_fired_at else {
        return false;
    };
    let Ok(last) = DateTime::parse_from_rfc3339(last) else {
        return false;
    };
    now - last.with_timezone(&Utc) < Duration::minutes(trigger.silent_window_minutes as i64)
}

pub(crate) fn notification_indexes(n: &Notification) -> Vec<(&'static str, Value)> {
    vec![
        ("channel", Value::Text(n.channel.clone())),
        ("event_code", Value::Text(n.event_code.clone())),
        ("status", Value::Text(n.status.clone())),
        ("read", Value::Integer(n.read as i64)),
        ("created_at", Value::Text(n.created_at.clone())),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use centro_core::ListParams;
    use centro_sql::SqliteStore;

    use super::*;
    use crate::model::{CreateTemplateRequest, CreateTriggerRequest};
    use crate::outbound::RecordingOutbound;
    use crate::service::NotifyConfig;
    use crate::service::feed::FeedFilters;
    use crate::service::trigger::TriggerFilters;

    fn svc_with(config: NotifyConfig) -> (NotifyService, Arc<RecordingOutbound>) {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        let outbound = Arc::new(RecordingOutbound::new());
        let svc = NotifyService::new(db, outbound.clone(), config).unwrap();
        (svc, outbound)
    }

    fn svc() -> (NotifyService, Arc<RecordingOutbound>) {
        svc_with(NotifyConfig::default())
    }

    fn channel(channel: &str, target: &str) -> crate::model::ChannelConfig {
        crate::model::ChannelConfig {
            channel: channel.into(),
            target: target.into(),
        }
    }

    fn make_trigger(
        svc: &NotifyService,
        org: &str,
        event_code: &str,
        channels: Vec<crate::model::ChannelConfig>,
        template_id: Option<String>,
        window: u32,
    ) -> EventTrigger {
        svc.create_trigger(
            org,
            CreateTriggerRequest {
                name: format!("{event_code} trigger"),
                event_code: event_code.into(),
                channels,
                template_id,
                silent_window_minutes: window,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn webhook_body_carries_event_trigger_data_and_timestamp() {
        let (svc, outbound) = svc();
        let trigger = make_trigger(
            &svc,
            "org1",
            "stock.low",
            vec![channel("webhook", "https://hooks.example.com/x")],
            None,
            0,
        );

        let payload = serde_json::json!({"sku": "SKU-1", "quantity": 2});
        let fired = svc.dispatch("org1", "stock.low", &payload).await.unwrap();
        assert_eq!(fired, 1);

        let calls = outbound.calls();
        assert_eq!(calls.len(), 1);
        let (url, body) = &calls[0];
        assert_eq!(url, "https://hooks.example.com/x");
        assert_eq!(body["event"], "stock.low");
        assert_eq!(body["trigger"]["id"], trigger.id.as_str());
        assert_eq!(body["trigger"]["name"], trigger.name.as_str());
        assert_eq!(body["data"], payload);
        assert!(body["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(body.as_object().unwrap().len(), 4);
        assert_eq!(body["trigger"].as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn template_renders_into_email() {
        let (svc, outbound) = svc_with(NotifyConfig {
            email_api_url: Some("https://mail.example.com/send".into()),
        });
        let template = svc
            .create_template(
                "org1",
                CreateTemplateRequest {
                    name: "Low stock".into(),
                    subject: "Low stock: {{sku}}".into(),
                    body: "Only {{quantity}} left of {{sku}}.".into(),
                },
            )
            .unwrap();
        make_trigger(
            &svc,
            "org1",
            "stock.low",
            vec![channel("email", "ops@example.com")],
            Some(template.id),
            0,
        );

        svc.dispatch("org1", "stock.low", &serde_json::json!({"sku": "SKU-1", "quantity": 2}))
            .await
            .unwrap();

        let calls = outbound.calls();
        assert_eq!(calls.len(), 1);
        let (url, mail) = &calls[0];
        assert_eq!(url, "https://mail.example.com/send");
        assert_eq!(mail["to"], "ops@example.com");
        assert_eq!(mail["subject"], "Low stock: SKU-1");
        assert_eq!(mail["body"], "Only 2 left of SKU-1.");

        let feed = svc
            .list_notifications("org1", &ListParams::default(), &FeedFilters::default())
            .unwrap();
        assert_eq!(feed.total, 1);
        assert_eq!(feed.items[0].status, "sent");
        assert_eq!(feed.items[0].title, "Low stock: SKU-1");
    }

    #[tokio::test]
    async fn email_without_relay_fails_delivery() {
        let (svc, outbound) = svc();
        make_trigger(
            &svc,
            "org1",
            "stock.low",
            vec![channel("email", "ops@example.com")],
            None,
            0,
        );

        svc.dispatch("org1", "stock.low", &serde_json::json!({}))
            .await
            .unwrap();

        assert!(outbound.calls().is_empty());
        let feed = svc
            .list_notifications("org1", &ListParams::default(), &FeedFilters::default())
            .unwrap();
        assert_eq!(feed.items[0].status, "failed");

        let trigger = svc
            .list_triggers("org1", &ListParams::default(), &TriggerFilters::default())
            .unwrap();
        let executions = svc
            .list_executions("org1", &trigger.items[0].id, &ListParams::default())
            .unwrap();
        assert_eq!(executions.items[0].outcome, "failed");
        assert!(executions.items[0].detail.contains("relay not configured"));
    }

    #[tokio::test]
    async fn silence_window_skips_and_logs() {
        let (svc, outbound) = svc();
        let trigger = make_trigger(
            &svc,
            "org1",
            "member.expired",
            vec![channel("webhook", "https://hooks.example.com/x")],
            None,
            30,
        );

        let first = svc
            .dispatch("org1", "member.expired", &serde_json::json!({"member": "m1"}))
            .await
            .unwrap();
        let second = svc
            .dispatch("org1", "member.expired", &serde_json::json!({"member": "m2"}))
            .await
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(outbound.calls().len(), 1);

        let executions = svc
            .list_executions("org1", &trigger.id, &ListParams::default())
            .unwrap();
        assert_eq!(executions.total, 2);
        let outcomes: Vec<&str> = executions
            .items
            .iter()
            .map(|e| e.outcome.as_str())
            .collect();
        assert!(outcomes.contains(&"dispatched"));
        assert!(outcomes.contains(&"silenced"));

        // The skip must not move the silence anchor.
        let stored = svc.get_trigger("org1", &trigger.id).unwrap();
        let after_first = stored.last_fired_at.clone().unwrap();
        svc.dispatch("org1", "member.expired", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(svc.get_trigger("org1", &trigger.id).unwrap().last_fired_at, Some(after_first));
    }

    #[tokio::test]
    async fn zero_window_never_silences() {
        let (svc, outbound) = svc();
        make_trigger(
            &svc,
            "org1",
            "sale.recorded",
            vec![channel("webhook", "https://hooks.example.com/x")],
            None,
            0,
        );

        for _ in 0..2 {
            let fired = svc
                .dispatch("org1", "sale.recorded", &serde_json::json!({}))
                .await
                .unwrap();
            assert_eq!(fired, 1);
        }
        assert_eq!(outbound.calls().len(), 2);
    }

    #[tokio::test]
    async fn placeholder_channels_only_log() {
        let (svc, outbound) = svc();
        make_trigger(
            &svc,
            "org1",
            "customer.created",
            vec![
                channel("whatsapp", "+5215512345678"),
                channel("sms", "+5215512345678"),
                channel("push", "device-1"),
            ],
            None,
            0,
        );

        svc.dispatch("org1", "customer.created", &serde_json::json!({"name": "Ana"}))
            .await
            .unwrap();

        assert!(outbound.calls().is_empty());
        let feed = svc
            .list_notifications("org1", &ListParams::default(), &FeedFilters::default())
            .unwrap();
        assert_eq!(feed.total, 3);
        assert!(feed.items.iter().all(|n| n.status == "logged"));
    }

    #[tokio::test]
    async fn failed_webhook_marks_rows_but_still_anchors_window() {
        let (svc, outbound) = svc();
        outbound.set_failure(Some("connection refused"));
        let trigger = make_trigger(
            &svc,
            "org1",
            "stock.low",
            vec![channel("webhook", "https://hooks.example.com/x")],
            None,
            0,
        );

        let fired = svc
            .dispatch("org1", "stock.low", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(fired, 1);

        let feed = svc
            .list_notifications("org1", &ListParams::default(), &FeedFilters::default())
            .unwrap();
        assert_eq!(feed.items[0].status, "failed");

        let executions = svc
            .list_executions("org1", &trigger.id, &ListParams::default())
            .unwrap();
        assert_eq!(executions.items[0].outcome, "failed");
        assert!(executions.items[0].detail.contains("connection refused"));

        // A failed attempt is still an attempt.
        assert!(svc.get_trigger("org1", &trigger.id).unwrap().last_fired_at.is_some());
    }

    #[tokio::test]
    async fn missing_template_falls_back_to_raw_payload() {
        let (svc, _) = svc();
        let template = svc
            .create_template(
                "org1",
                CreateTemplateRequest {
                    name: "Doomed".into(),
                    subject: "s".into(),
                    body: "b".into(),
                },
            )
            .unwrap();
        make_trigger(
            &svc,
            "org1",
            "stock.low",
            vec![channel("push", "device-1")],
            Some(template.id.clone()),
            0,
        );
        svc.delete_template("org1", &template.id).unwrap();

        svc.dispatch("org1", "stock.low", &serde_json::json!({"sku": "SKU-1"}))
            .await
            .unwrap();

        let feed = svc
            .list_notifications("org1", &ListParams::default(), &FeedFilters::default())
            .unwrap();
        assert_eq!(feed.items[0].title, "stock.low");
        assert_eq!(feed.items[0].body, r#"{"sku":"SKU-1"}"#);
    }

    #[tokio::test]
    async fn unmatched_inactive_and_foreign_org_triggers_stay_quiet() {
        let (svc, outbound) = svc();
        let trigger = make_trigger(
            &svc,
            "org1",
            "stock.low",
            vec![channel("webhook", "https://hooks.example.com/x")],
            None,
            0,
        );
        svc.update_trigger("org1", &trigger.id, serde_json::json!({"active": false}))
            .unwrap();

        assert_eq!(svc.dispatch("org1", "stock.low", &serde_json::json!({})).await.unwrap(), 0);
        assert_eq!(svc.dispatch("org1", "other.event", &serde_json::json!({})).await.unwrap(), 0);
        assert_eq!(svc.dispatch("org2", "stock.low", &serde_json::json!({})).await.unwrap(), 0);
        assert!(outbound.calls().is_empty());
    }

    #[tokio::test]
    async fn one_event_fans_out_to_every_matching_trigger() {
        let (svc, outbound) = svc();
        make_trigger(
            &svc,
            "org1",
            "sale.recorded",
            vec![channel("webhook", "https://hooks.example.com/a")],
            None,
            0,
        );
        make_trigger(
            &svc,
            "org1",
            "sale.recorded",
            vec![channel("webhook", "https://hooks.example.com/b")],
            None,
            0,
        );

        let fired = svc
            .dispatch("org1", "sale.recorded", &serde_json::json!({"total": 10.0}))
            .await
            .unwrap();
        assert_eq!(fired, 2);

        let urls: Vec<String> = outbound.calls().iter().map(|(u, _)| u.clone()).collect();
        assert!(urls.contains(&"https://hooks.example.com/a".to_string()));
        assert!(urls.contains(&"https://hooks.example.com/b".to_string()));
    }
}
