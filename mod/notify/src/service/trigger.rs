use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;

use super::NotifyService;
use crate::model::{CHANNELS, ChannelConfig, CreateTriggerRequest, EventTrigger};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerFilters {
    pub event_code: Option<String>,
    pub active: Option<bool>,
}

impl NotifyService {
    pub fn create_trigger(
        &self,
        org: &str,
        req: CreateTriggerRequest,
    ) -> Result<EventTrigger, ServiceError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("trigger name is required".into()));
        }
        let event_code = req.event_code.trim();
        if event_code.is_empty() {
            return Err(ServiceError::Validation("eventCode is required".into()));
        }
        validate_channels(&req.channels)?;
        if let Some(template_id) = &req.template_id {
            self.get_template(org, template_id).map_err(|_| {
                ServiceError::Validation(format!("template '{}' not found", template_id))
            })?;
        }

        let now = now_rfc3339();
        let trigger = EventTrigger {
            id: new_id(),
            org_id: org.to_string(),
            name: name.to_string(),
            event_code: event_code.to_string(),
            channels: req.channels,
            template_id: req.template_id,
            silent_window_minutes: req.silent_window_minutes,
            active: true,
            last_fired_at: None,
            created_at: now.clone(),
            updated_at: now,
        };

        store::insert_record(
            self.db.as_ref(),
            "event_triggers",
            org,
            &trigger.id,
            &trigger,
            &trigger_indexes(&trigger),
        )?;
        Ok(trigger)
    }

    pub fn get_trigger(&self, org: &str, id: &str) -> Result<EventTrigger, ServiceError> {
        store::get_record(self.db.as_ref(), "event_triggers", org, id)
    }

    pub fn list_triggers(
        &self,
        org: &str,
        params: &ListParams,
        filters: &TriggerFilters,
    ) -> Result<ListResult<EventTrigger>, ServiceError> {
        let mut cols: Vec<(&str, Value)> = Vec::new();
        if let Some(event_code) = &filters.event_code {
            cols.push(("event_code", Value::Text(event_code.clone())));
        }
        if let Some(active) = filters.active {
            cols.push(("active", Value::Integer(active as i64)));
        }
        store::list_records(
            self.db.as_ref(),
            "event_triggers",
            org,
            &cols,
            params.q.as_deref(),
            params.limit.min(500),
            params.offset,
        )
    }

    pub fn update_trigger(
        &self,
        org: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<EventTrigger, ServiceError> {
        let current = self.get_trigger(org, id)?;
        let updated: EventTrigger = store::apply_patch(&current, patch)?;

        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("trigger name is required".into()));
        }
        if updated.event_code.trim().is_empty() {
            return Err(ServiceError::Validation("eventCode is required".into()));
        }
        validate_channels(&updated.channels)?;
        if let Some(template_id) = &updated.template_id {
            self.get_template(org, template_id).map_err(|_| {
                ServiceError::Validation(format!("template '{}' not found", template_id))
            })?;
        }

        store::update_record(
            self.db.as_ref(),
            "event_triggers",
            org,
            id,
            &updated,
            &trigger_indexes(&updated),
        )?;
        Ok(updated)
    }

    pub fn delete_trigger(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        store::delete_record(self.db.as_ref(), "event_triggers", org, id)
    }
}

fn validate_channels(channels: &[ChannelConfig]) -> Result<(), ServiceError> {
    if channels.is_empty() {
        return Err(ServiceError::Validation(
            "at least one channel is required".into(),
        ));
    }
    for ch in channels {
        if !CHANNELS.contains(&ch.channel.as_str()) {
            return Err(ServiceError::Validation(format!(
                "unknown channel '{}': expected one of {}",
                ch.channel,
                CHANNELS.join(", "),
            )));
        }
        if ch.target.trim().is_empty() {
            return Err(ServiceError::Validation(format!(
                "channel '{}' needs a target",
                ch.channel,
            )));
        }
    }
    Ok(())
}

pub(crate) fn trigger_indexes(t: &EventTrigger) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(t.name.clone())),
        ("event_code", Value::Text(t.event_code.clone())),
        ("active", Value::Integer(t.active as i64)),
        ("created_at", Value::Text(t.created_at.clone())),
        ("updated_at", Value::Text(t.updated_at.clone())),
    ]
}
