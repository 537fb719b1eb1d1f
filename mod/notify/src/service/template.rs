use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;

use super::NotifyService;
use crate::model::{CreateTemplateRequest, NotificationTemplate};

impl NotifyService {
    pub fn create_template(
        &self,
        org: &str,
        req: CreateTemplateRequest,
    ) -> Result<NotificationTemplate, ServiceError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("template name is required".into()));
        }
        if req.body.trim().is_empty() {
            return Err(ServiceError::Validation("template body is required".into()));
        }

        let now = now_rfc3339();
        let template = NotificationTemplate {
            id: new_id(),
            org_id: org.to_string(),
            name: name.to_string(),
            subject: req.subject,
            body: req.body,
            created_at: now.clone(),
            updated_at: now,
        };

        store::insert_record(
            self.db.as_ref(),
            "notification_templates",
            org,
            &template.id,
            &template,
            &template_indexes(&template),
        )?;
        Ok(template)
    }

    pub fn get_template(&self, org: &str, id: &str) -> Result<NotificationTemplate, ServiceError> {
        store::get_record(self.db.as_ref(), "notification_templates", org, id)
    }

    pub fn list_templates(
        &self,
        org: &str,
        params: &ListParams,
    ) -> Result<ListResult<NotificationTemplate>, ServiceError> {
        store::list_records(
            self.db.as_ref(),
            "notification_templates",
            org,
            &[],
            params.q.as_deref(),
            params.limit.min(500),
            params.offset,
        )
    }

    pub fn update_template(
        &self,
        org: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<NotificationTemplate, ServiceError> {
        let current = self.get_template(org, id)?;
        let updated: NotificationTemplate = store::apply_patch(&current, patch)?;

        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("template name is required".into()));
        }
        if updated.body.trim().is_empty() {
            return Err(ServiceError::Validation("template body is required".into()));
        }

        store::update_record(
            self.db.as_ref(),
            "notification_templates",
            org,
            id,
            &updated,
            &template_indexes(&updated),
        )?;
        Ok(updated)
    }

    pub fn delete_template(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        store::delete_record(self.db.as_ref(), "notification_templates", org, id)
    }
}

fn template_indexes(t: &NotificationTemplate) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(t.name.clone())),
        ("created_at", Value::Text(t.created_at.clone())),
        ("updated_at", Value::Text(t.updated_at.clone())),
    ]
}
