use std::sync::Arc;

use centro_core::{
    EventSink, ListParams, ListResult, ServiceError, new_id, now_rfc3339, store,
};
use centro_sql::{SQLStore, Value};
use chrono::NaiveDate;
use serde_json::json;

use crate::model::{
    CreateMembershipRequest, CreatePlanRequest, GymStats, Membership, MembershipCard, Plan,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS plans (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        name TEXT,
        active INTEGER,
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS memberships (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        customer_id TEXT,
        plan_id TEXT,
        start_date TEXT,
        end_date TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_plan_org ON plans(org_id)",
    "CREATE INDEX IF NOT EXISTS idx_mem_org ON memberships(org_id)",
    "CREATE INDEX IF NOT EXISTS idx_mem_customer ON memberships(org_id, customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_mem_end ON memberships(org_id, end_date)",
];

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipFilters {
    pub customer_id: Option<String>,
    /// `active` or `expired`.
    pub status: Option<String>,
}

/// Whole days from `today` until `end_date`, negative once it has passed.
/// The end date itself is still a covered day: day 0 is not expired.
pub fn days_remaining(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

/// Gym service — membership plans and enrollments.
pub struct GymService {
    db: Arc<dyn SQLStore>,
    events: Arc<dyn EventSink>,
}

impl GymService {
    pub fn new(db: Arc<dyn SQLStore>, events: Arc<dyn EventSink>) -> Result<Self, ServiceError> {
        for stmt in SCHEMA {
            db.exec(stmt, &[])
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        Ok(Self { db, events })
    }

    // ── Plans ──

    pub fn create_plan(&self, org: &str, req: CreatePlanRequest) -> Result<Plan, ServiceError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("plan name is required".into()));
        }
        if req.duration_days == 0 {
            return Err(ServiceError::Validation("plan duration must be at least one day".into()));
        }
        if req.price < 0.0 {
            return Err(ServiceError::Validation("price can not be negative".into()));
        }

        let id = new_id();
        let now = now_rfc3339();
        let record = Plan {
            id: id.clone(),
            org_id: org.to_string(),
            name,
            duration_days: req.duration_days,
            price: req.price,
            currency: req
                .currency
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(crate::model::default_currency),
            active: true,
            created_at: now.clone(),
            updated_at: now,
        };

        store::insert_record(self.db.as_ref(), "plans", org, &id, &record, &plan_indexes(&record))?;
        Ok(record)
    }

    pub fn get_plan(&self, org: &str, id: &str) -> Result<Plan, ServiceError> {
        store::get_record(self.db.as_ref(), "plans", org, id)
    }

    pub fn list_plans(
        &self,
        org: &str,
        params: &ListParams,
    ) -> Result<ListResult<Plan>, ServiceError> {
        store::list_records(
            self.db.as_ref(),
            "plans",
            org,
            &[],
            params.q.as_deref(),
            params.limit.min(500),
            params.offset,
        )
    }

    pub fn update_plan(
        &self,
        org: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Plan, ServiceError> {
        let current = self.get_plan(org, id)?;
        let updated: Plan = store::apply_patch(&current, patch)?;
        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("plan name is required".into()));
        }
        if updated.duration_days == 0 {
            return Err(ServiceError::Validation("plan duration must be at least one day".into()));
        }
        if updated.price < 0.0 {
            return Err(ServiceError::Validation("price can not be negative".into()));
        }
        store::update_record(self.db.as_ref(), "plans", org, id, &updated, &plan_indexes(&updated))?;
        Ok(updated)
    }

    /// Delete a plan. Plans with memberships can not be deleted.
    pub fn delete_plan(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        let in_use = store::count_records(
            self.db.as_ref(),
            "memberships",
            org,
            &[("plan_id", Value::Text(id.to_string()))],
        )?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "plan has {} memberships",
                in_use
            )));
        }
        store::delete_record(self.db.as_ref(), "plans", org, id)
    }

    // ── Memberships ──

    pub fn create_membership(
        &self,
        org: &str,
        req: CreateMembershipRequest,
    ) -> Result<Membership, ServiceError> {
        let plan = self.get_plan(org, &req.plan_id).map_err(|e| match e {
            ServiceError::NotFound(_) => {
                ServiceError::Validation(format!("plan '{}' not found", req.plan_id))
            }
            other => other,
        })?;
        if !plan.active {
            return Err(ServiceError::Validation(format!(
                "plan '{}' is not active",
                plan.name
            )));
        }
        if self.customer_name(org, &req.customer_id)?.is_none() {
            return Err(ServiceError::Validation(format!(
                "customer '{}' not found",
                req.customer_id
            )));
        }

        let start = match req.start_date {
            Some(ref d) => parse_date(d)?,
            None => today_date(),
        };
        let end = match req.end_date {
            Some(ref d) => parse_date(d)?,
            None => start + chrono::Duration::days(plan.duration_days as i64),
        };
        if end < start {
            return Err(ServiceError::Validation("end date is before start date".into()));
        }
        let price_paid = req.price_paid.unwrap_or(plan.price);
        if price_paid < 0.0 {
            return Err(ServiceError::Validation("price can not be negative".into()));
        }

        let id = new_id();
        let now = now_rfc3339();
        let record = Membership {
            id: id.clone(),
            org_id: org.to_string(),
            customer_id: req.customer_id,
            plan_id: req.plan_id,
            start_date: start.to_string(),
            end_date: end.to_string(),
            price_paid,
            created_at: now.clone(),
            updated_at: now,
        };

        store::insert_record(
            self.db.as_ref(),
            "memberships",
            org,
            &id,
            &record,
            &membership_indexes(&record),
        )?;

        Ok(record)
    }

    pub fn get_membership(&self, org: &str, id: &str) -> Result<Membership, ServiceError> {
        store::get_record(self.db.as_ref(), "memberships", org, id)
    }

    pub fn list_memberships(
        &self,
        org: &str,
        params: &ListParams,
        filters: &MembershipFilters,
    ) -> Result<ListResult<Membership>, ServiceError> {
        let limit = params.limit.min(500);

        let status = match filters.status.as_deref() {
            None => None,
            Some(s @ ("active" | "expired")) => Some(s),
            Some(other) => {
                return Err(ServiceError::Validation(format!(
                    "unknown status filter '{}': expected active or expired",
                    other
                )));
            }
        };

        let Some(status) = status else {
            let mut f: Vec<(&str, Value)> = Vec::new();
            if let Some(ref c) = filters.customer_id {
                f.push(("customer_id", Value::Text(c.clone())));
            }
            return store::list_records(
                self.db.as_ref(),
                "memberships",
                org,
                &f,
                None,
                limit,
                params.offset,
            );
        };

        // Expiry is derived, so the status filter compares the end_date
        // column against today. ISO dates compare correctly as strings.
        let cmp = if status == "active" { ">=" } else { "<" };
        let mut where_sql = format!("org_id = ?1 AND end_date {} ?2", cmp);
        let mut sql_params = vec![Value::Text(org.to_string()), Value::Text(today())];
        if let Some(ref c) = filters.customer_id {
            sql_params.push(Value::Text(c.clone()));
            where_sql.push_str(&format!(" AND customer_id = ?{}", sql_params.len()));
        }

        let count_sql = format!("SELECT COUNT(*) as cnt FROM memberships WHERE {}", where_sql);
        let rows = self
            .db
            .query(&count_sql, &sql_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize;

        sql_params.push(Value::Integer(limit as i64));
        sql_params.push(Value::Integer(params.offset as i64));
        let sql = format!(
            "SELECT data FROM memberships WHERE {} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_sql,
            sql_params.len() - 1,
            sql_params.len(),
        );
        let rows = self
            .db
            .query(&sql, &sql_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(parse_membership(row)?);
        }
        Ok(ListResult { items, total })
    }

    pub fn delete_membership(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        store::delete_record(self.db.as_ref(), "memberships", org, id)
    }

    /// Extend a membership by its plan's duration: from the current end
    /// date while still active, from today once expired.
    pub fn renew_membership(&self, org: &str, id: &str) -> Result<Membership, ServiceError> {
        let current = self.get_membership(org, id)?;
        let plan = self.get_plan(org, &current.plan_id)?;

        let today = today_date();
        let end = parse_date(&current.end_date)?;
        let base = if days_remaining(end, today) < 0 { today } else { end };
        let new_end = base + chrono::Duration::days(plan.duration_days as i64);

        let updated = Membership {
            end_date: new_end.to_string(),
            updated_at: now_rfc3339(),
            ..current
        };
        store::update_record(
            self.db.as_ref(),
            "memberships",
            org,
            id,
            &updated,
            &membership_indexes(&updated),
        )?;
        Ok(updated)
    }

    // ── Cards ──

    pub fn membership_card(&self, org: &str, id: &str) -> Result<MembershipCard, ServiceError> {
        let membership = self.get_membership(org, id)?;
        self.assemble_card(org, membership)
    }

    pub fn list_cards(
        &self,
        org: &str,
        params: &ListParams,
        filters: &MembershipFilters,
    ) -> Result<ListResult<MembershipCard>, ServiceError> {
        let memberships = self.list_memberships(org, params, filters)?;
        let total = memberships.total;
        let mut items = Vec::with_capacity(memberships.items.len());
        for m in memberships.items {
            items.push(self.assemble_card(org, m)?);
        }
        Ok(ListResult { items, total })
    }

    fn assemble_card(&self, org: &str, m: Membership) -> Result<MembershipCard, ServiceError> {
        // A deleted customer leaves the card readable; the raw id stands
        // in for the name.
        let customer_name = self
            .customer_name(org, &m.customer_id)?
            .unwrap_or_else(|| m.customer_id.clone());
        let plan_name = match self.get_plan(org, &m.plan_id) {
            Ok(p) => p.name,
            Err(ServiceError::NotFound(_)) => m.plan_id.clone(),
            Err(e) => return Err(e),
        };
        let remaining = days_remaining(parse_date(&m.end_date)?, today_date());

        Ok(MembershipCard {
            customer_name,
            plan_name,
            days_remaining: remaining,
            expired: remaining < 0,
            membership: m,
        })
    }

    // ── Stats ──

    pub fn gym_stats(&self, org: &str) -> Result<GymStats, ServiceError> {
        let today = today();
        let week_out = (today_date() + chrono::Duration::days(7)).to_string();

        let total = store::count_records(self.db.as_ref(), "memberships", org, &[])? as usize;
        let active = self.count_where(
            "org_id = ?1 AND end_date >= ?2",
            &[Value::Text(org.to_string()), Value::Text(today.clone())],
        )?;
        let expiring_soon = self.count_where(
            "org_id = ?1 AND end_date >= ?2 AND end_date <= ?3",
            &[
                Value::Text(org.to_string()),
                Value::Text(today),
                Value::Text(week_out),
            ],
        )?;

        Ok(GymStats {
            total,
            active,
            expired: total - active,
            expiring_soon,
        })
    }

    fn count_where(&self, where_sql: &str, params: &[Value]) -> Result<usize, ServiceError> {
        let sql = format!("SELECT COUNT(*) as cnt FROM memberships WHERE {}", where_sql);
        let rows = self
            .db
            .query(&sql, params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize)
    }

    // ── Expiry scan ──

    /// Emit `membership.expiring` for memberships ending within
    /// `lead_days`, and `membership.expired` for those that lapsed within
    /// the last `lead_days`. Covers all organizations; called by the
    /// background worker.
    pub fn scan_expiry(&self, lead_days: i64) -> Result<(usize, usize), ServiceError> {
        let rows = self
            .db
            .query("SELECT data FROM memberships", &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let today = today_date();
        let mut expiring = 0;
        let mut expired = 0;

        for row in &rows {
            let m = parse_membership(row)?;
            let remaining = days_remaining(parse_date(&m.end_date)?, today);

            let event = if (0..=lead_days).contains(&remaining) {
                expiring += 1;
                "membership.expiring"
            } else if remaining < 0 && remaining >= -lead_days {
                expired += 1;
                "membership.expired"
            } else {
                continue;
            };

            let org = m.org_id.clone();
            let customer_name = self
                .customer_name(&org, &m.customer_id)?
                .unwrap_or_else(|| m.customer_id.clone());
            let plan_name = match self.get_plan(&org, &m.plan_id) {
                Ok(p) => p.name,
                Err(_) => m.plan_id.clone(),
            };

            self.events.emit(
                &org,
                event,
                json!({
                    "membershipId": m.id,
                    "customerId": m.customer_id,
                    "customerName": customer_name,
                    "planName": plan_name,
                    "endDate": m.end_date,
                    "daysRemaining": remaining,
                }),
            );
        }

        Ok((expiring, expired))
    }

    /// Look up a customer's display name in the CRM table. `None` when no
    /// such customer exists for the org.
    fn customer_name(&self, org: &str, customer_id: &str) -> Result<Option<String>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM customers WHERE id = ?1 AND org_id = ?2",
                &[Value::Text(customer_id.to_string()), Value::Text(org.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let data = row
            .get_str("data")
            .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(Some(value["name"].as_str().unwrap_or(customer_id).to_string()))
    }
}

fn parse_membership(row: &centro_sql::Row) -> Result<Membership, ServiceError> {
    let data = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
    serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))
}

fn plan_indexes(p: &Plan) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(p.name.clone())),
        ("active", Value::Integer(p.active as i64)),
        ("created_at", Value::Text(p.created_at.clone())),
        ("updated_at", Value::Text(p.updated_at.clone())),
    ]
}

fn membership_indexes(m: &Membership) -> Vec<(&'static str, Value)> {
    vec![
        ("customer_id", Value::Text(m.customer_id.clone())),
        ("plan_id", Value::Text(m.plan_id.clone())),
        ("start_date", Value::Text(m.start_date.clone())),
        ("end_date", Value::Text(m.end_date.clone())),
        ("created_at", Value::Text(m.created_at.clone())),
        ("updated_at", Value::Text(m.updated_at.clone())),
    ]
}

fn parse_date(s: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ServiceError::Validation(format!("invalid date '{}': expected YYYY-MM-DD", s)))
}

fn today_date() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn today() -> String {
    today_date().to_string()
}

#[cfg(test)]
mod tests {
    use centro_core::{MemorySink, NullSink};
    use centro_sql::SqliteStore;
    use crm::model::CreateCustomerRequest;
    use crm::service::CrmService;

    use super::*;

    fn fixtures() -> (GymService, Arc<MemorySink>, String) {
        let db: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let crm = CrmService::new(Arc::clone(&db), Arc::new(NullSink)).unwrap();
        let customer = crm
            .create_customer(
                "org1",
                CreateCustomerRequest {
                    name: "Ana Flores".into(),
                    email: None,
                    phone: None,
                    company: None,
                    city: None,
                    country: None,
                    status: Default::default(),
                },
            )
            .unwrap();

        let sink = Arc::new(MemorySink::new());
        let svc = GymService::new(db, sink.clone()).unwrap();
        (svc, sink, customer.id)
    }

    fn plan(svc: &GymService, days: u32, price: f64) -> Plan {
        svc.create_plan(
            "org1",
            CreatePlanRequest {
                name: format!("{} day pass", days),
                duration_days: days,
                price,
                currency: None,
            },
        )
        .unwrap()
    }

    fn membership_ending(
        svc: &GymService,
        customer: &str,
        plan: &Plan,
        days_from_now: i64,
    ) -> Membership {
        let end = today_date() + chrono::Duration::days(days_from_now);
        let start = end - chrono::Duration::days(plan.duration_days as i64);
        svc.create_membership(
            "org1",
            CreateMembershipRequest {
                customer_id: customer.into(),
                plan_id: plan.id.clone(),
                start_date: Some(start.to_string()),
                end_date: Some(end.to_string()),
                price_paid: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn days_remaining_signs() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(days_remaining(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(), today), 5);
        assert_eq!(days_remaining(today, today), 0);
        assert_eq!(days_remaining(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(), today), -3);
    }

    #[test]
    fn membership_defaults_follow_plan() {
        let (svc, _, customer) = fixtures();
        let p = plan(&svc, 30, 49.9);

        let m = svc
            .create_membership(
                "org1",
                CreateMembershipRequest {
                    customer_id: customer,
                    plan_id: p.id.clone(),
                    start_date: None,
                    end_date: None,
                    price_paid: None,
                },
            )
            .unwrap();

        assert_eq!(m.start_date, today());
        assert_eq!(m.end_date, (today_date() + chrono::Duration::days(30)).to_string());
        assert_eq!(m.price_paid, 49.9);
    }

    #[test]
    fn unknown_customer_or_plan_rejected() {
        let (svc, _, customer) = fixtures();
        let p = plan(&svc, 30, 10.0);

        let err = svc
            .create_membership(
                "org1",
                CreateMembershipRequest {
                    customer_id: "ghost".into(),
                    plan_id: p.id.clone(),
                    start_date: None,
                    end_date: None,
                    price_paid: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let err = svc
            .create_membership(
                "org1",
                CreateMembershipRequest {
                    customer_id: customer,
                    plan_id: "ghost".into(),
                    start_date: None,
                    end_date: None,
                    price_paid: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn card_joins_names_and_derives_expiry() {
        let (svc, _, customer) = fixtures();
        let p = plan(&svc, 30, 10.0);
        let m = membership_ending(&svc, &customer, &p, 10);

        let card = svc.membership_card("org1", &m.id).unwrap();
        assert_eq!(card.customer_name, "Ana Flores");
        assert_eq!(card.plan_name, "30 day pass");
        assert_eq!(card.days_remaining, 10);
        assert!(!card.expired);

        let lapsed = membership_ending(&svc, &customer, &p, -1);
        let card = svc.membership_card("org1", &lapsed.id).unwrap();
        assert_eq!(card.days_remaining, -1);
        assert!(card.expired);

        // Ending today is day 0, still covered.
        let today_end = membership_ending(&svc, &customer, &p, 0);
        let card = svc.membership_card("org1", &today_end.id).unwrap();
        assert_eq!(card.days_remaining, 0);
        assert!(!card.expired);
    }

    #[test]
    fn renew_extends_from_end_when_active() {
        let (svc, _, customer) = fixtures();
        let p = plan(&svc, 30, 10.0);
        let m = membership_ending(&svc, &customer, &p, 5);

        let renewed = svc.renew_membership("org1", &m.id).unwrap();
        let expected = today_date() + chrono::Duration::days(5 + 30);
        assert_eq!(renewed.end_date, expected.to_string());
    }

    #[test]
    fn renew_extends_from_today_when_expired() {
        let (svc, _, customer) = fixtures();
        let p = plan(&svc, 30, 10.0);
        let m = membership_ending(&svc, &customer, &p, -10);

        let renewed = svc.renew_membership("org1", &m.id).unwrap();
        let expected = today_date() + chrono::Duration::days(30);
        assert_eq!(renewed.end_date, expected.to_string());
    }

    #[test]
    fn list_filters_by_derived_status() {
        let (svc, _, customer) = fixtures();
        let p = plan(&svc, 30, 10.0);
        membership_ending(&svc, &customer, &p, 10);
        membership_ending(&svc, &customer, &p, -2);

        let active = svc
            .list_memberships(
                "org1",
                &ListParams::default(),
                &MembershipFilters { customer_id: None, status: Some("active".into()) },
            )
            .unwrap();
        assert_eq!(active.total, 1);

        let expired = svc
            .list_memberships(
                "org1",
                &ListParams::default(),
                &MembershipFilters { customer_id: None, status: Some("expired".into()) },
            )
            .unwrap();
        assert_eq!(expired.total, 1);

        let err = svc
            .list_memberships(
                "org1",
                &ListParams::default(),
                &MembershipFilters { customer_id: None, status: Some("paused".into()) },
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn stats_split_by_expiry() {
        let (svc, _, customer) = fixtures();
        let p = plan(&svc, 30, 10.0);
        membership_ending(&svc, &customer, &p, 2);
        membership_ending(&svc, &customer, &p, 30);
        membership_ending(&svc, &customer, &p, -1);

        let stats = svc.gym_stats("org1").unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.expiring_soon, 1);
    }

    #[test]
    fn scan_emits_expiring_and_recently_expired() {
        let (svc, sink, customer) = fixtures();
        let p = plan(&svc, 30, 10.0);
        membership_ending(&svc, &customer, &p, 3); // expiring
        membership_ending(&svc, &customer, &p, -2); // recently expired
        membership_ending(&svc, &customer, &p, -30); // long gone, silent
        membership_ending(&svc, &customer, &p, 20); // not yet in window

        let (expiring, expired) = svc.scan_expiry(7).unwrap();
        assert_eq!(expiring, 1);
        assert_eq!(expired, 1);

        let mut names = sink.names();
        names.sort_unstable();
        assert_eq!(names, vec!["membership.expired", "membership.expiring"]);

        let events = sink.events();
        let expiring_event = events.iter().find(|e| e.name == "membership.expiring").unwrap();
        assert_eq!(expiring_event.data["customerName"], "Ana Flores");
        assert_eq!(expiring_event.data["daysRemaining"], 3);
        assert_eq!(expiring_event.data["planName"], "30 day pass");
    }

    #[test]
    fn plan_with_memberships_can_not_be_deleted() {
        let (svc, _, customer) = fixtures();
        let p = plan(&svc, 30, 10.0);
        membership_ending(&svc, &customer, &p, 10);

        let err = svc.delete_plan("org1", &p.id).unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");

        let unused = plan(&svc, 90, 120.0);
        svc.delete_plan("org1", &unused.id).unwrap();
    }

    #[test]
    fn inactive_plan_not_sellable() {
        let (svc, _, customer) = fixtures();
        let p = plan(&svc, 30, 10.0);
        svc.update_plan("org1", &p.id, serde_json::json!({"active": false})).unwrap();

        let err = svc
            .create_membership(
                "org1",
                CreateMembershipRequest {
                    customer_id: customer,
                    plan_id: p.id.clone(),
                    start_date: None,
                    end_date: None,
                    price_paid: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }
}
