use std::sync::Arc;

use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::{SQLStore, Value};

use crate::model::{
    CreateEmployeeRequest, Employee, EmployeeStatus, HrmStats, TerminateRequest,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS employees (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        name TEXT,
        email TEXT,
        department TEXT,
        position TEXT,
        status TEXT,
        salary REAL,
        hire_date TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_emp_org ON employees(org_id)",
    "CREATE INDEX IF NOT EXISTS idx_emp_status ON employees(org_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_emp_dept ON employees(org_id, department)",
];

#[derive(Debug, Default, serde::Deserialize)]
pub struct EmployeeFilters {
    pub department: Option<String>,
    pub status: Option<String>,
}

/// HRM service — employee records.
pub struct HrmService {
    db: Arc<dyn SQLStore>,
}

impl HrmService {
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        for stmt in SCHEMA {
            db.exec(stmt, &[])
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        Ok(Self { db })
    }

    pub fn create_employee(
        &self,
        org: &str,
        req: CreateEmployeeRequest,
    ) -> Result<Employee, ServiceError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("employee name is required".into()));
        }
        if req.salary < 0.0 {
            return Err(ServiceError::Validation("salary can not be negative".into()));
        }

        let hire_date = match req.hire_date {
            Some(d) => parse_date(&d)?.to_string(),
            None => today(),
        };

        let id = new_id();
        let now = now_rfc3339();
        let record = Employee {
            id: id.clone(),
            org_id: org.to_string(),
            name,
            email: req.email,
            phone: req.phone,
            position: req.position,
            department: req.department,
            salary: req.salary,
            hire_date,
            status: EmployeeStatus::Active,
            termination_date: None,
            created_at: now.clone(),
            updated_at: now,
        };

        store::insert_record(
            self.db.as_ref(),
            "employees",
            org,
            &id,
            &record,
            &employee_indexes(&record),
        )?;

        Ok(record)
    }

    pub fn get_employee(&self, org: &str, id: &str) -> Result<Employee, ServiceError> {
        store::get_record(self.db.as_ref(), "employees", org, id)
    }

    pub fn list_employees(
        &self,
        org: &str,
        params: &ListParams,
        filters: &EmployeeFilters,
    ) -> Result<ListResult<Employee>, ServiceError> {
        let limit = params.limit.min(500);
        let mut f: Vec<(&str, Value)> = Vec::new();
        if let Some(ref d) = filters.department {
            f.push(("department", Value::Text(d.clone())));
        }
        if let Some(ref s) = filters.status {
            f.push(("status", Value::Text(s.clone())));
        }
        store::list_records(
            self.db.as_ref(),
            "employees",
            org,
            &f,
            params.q.as_deref(),
            limit,
            params.offset,
        )
    }

    pub fn update_employee(
        &self,
        org: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Employee, ServiceError> {
        let current = self.get_employee(org, id)?;
        let updated: Employee = store::apply_patch(&current, patch)?;

        if updated.salary < 0.0 {
            return Err(ServiceError::Validation("salary can not be negative".into()));
        }
        parse_date(&updated.hire_date)?;

        store::update_record(
            self.db.as_ref(),
            "employees",
            org,
            id,
            &updated,
            &employee_indexes(&updated),
        )?;

        Ok(updated)
    }

    pub fn delete_employee(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        store::delete_record(self.db.as_ref(), "employees", org, id)
    }

    /// Mark an employee terminated. Terminating twice is a conflict.
    pub fn terminate_employee(
        &self,
        org: &str,
        id: &str,
        req: TerminateRequest,
    ) -> Result<Employee, ServiceError> {
        let mut emp = self.get_employee(org, id)?;
        if emp.status == EmployeeStatus::Terminated {
            return Err(ServiceError::Conflict(format!(
                "employee '{}' is already terminated",
                emp.name
            )));
        }

        let date = match req.date {
            Some(d) => parse_date(&d)?.to_string(),
            None => today(),
        };

        emp.status = EmployeeStatus::Terminated;
        emp.termination_date = Some(date);
        emp.updated_at = now_rfc3339();

        store::update_record(
            self.db.as_ref(),
            "employees",
            org,
            id,
            &emp,
            &employee_indexes(&emp),
        )?;

        Ok(emp)
    }

    pub fn hrm_stats(&self, org: &str) -> Result<HrmStats, ServiceError> {
        let headcount =
            store::count_records(self.db.as_ref(), "employees", org, &[])? as usize;
        let active = store::count_records(
            self.db.as_ref(),
            "employees",
            org,
            &[("status", Value::Text("active".into()))],
        )? as usize;

        let mut by_department = std::collections::BTreeMap::new();
        let rows = self
            .db
            .query(
                "SELECT department, COUNT(*) as cnt FROM employees
                 WHERE org_id = ?1 AND status = 'active' GROUP BY department",
                &[Value::Text(org.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        for row in &rows {
            let dept = row
                .get_str("department")
                .unwrap_or("unassigned")
                .to_string();
            by_department.insert(dept, row.get_i64("cnt").unwrap_or(0) as usize);
        }

        let rows = self
            .db
            .query(
                "SELECT COALESCE(SUM(salary), 0) as payroll FROM employees
                 WHERE org_id = ?1 AND status = 'active'",
                &[Value::Text(org.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let monthly_payroll = rows.first().and_then(|r| r.get_f64("payroll")).unwrap_or(0.0);

        Ok(HrmStats {
            headcount,
            active,
            terminated: headcount - active,
            by_department,
            monthly_payroll,
        })
    }
}

fn employee_indexes(e: &Employee) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(e.name.clone())),
        (
            "email",
            e.email
                .clone()
                .map(Value::Text)
                .unwrap_or(Value::Null),
        ),
        (
            "department",
            e.department
                .clone()
                .map(Value::Text)
                .unwrap_or(Value::Null),
        ),
        (
            "position",
            e.position
                .clone()
                .map(Value::Text)
                .unwrap_or(Value::Null),
        ),
        ("status", Value::Text(e.status.as_str().to_string())),
        ("salary", Value::Real(e.salary)),
        ("hire_date", Value::Text(e.hire_date.clone())),
        ("created_at", Value::Text(e.created_at.clone())),
        ("updated_at", Value::Text(e.updated_at.clone())),
    ]
}

fn parse_date(s: &str) -> Result<chrono::NaiveDate, ServiceError> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ServiceError::Validation(format!("invalid date '{}': expected YYYY-MM-DD", s)))
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}
