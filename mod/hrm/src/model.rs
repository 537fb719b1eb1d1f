use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    Active,
    Terminated,
}

impl Default for EmployeeStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Terminated => "terminated",
        }
    }
}

/// Employee record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub org_id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// Monthly salary.
    #[serde(default)]
    pub salary: f64,

    /// ISO date (YYYY-MM-DD).
    pub hire_date: String,

    #[serde(default)]
    pub status: EmployeeStatus,

    /// ISO date set by `@terminate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub salary: f64,
    /// Defaults to today when omitted.
    #[serde(default)]
    pub hire_date: Option<String>,
}

/// Body for `@terminate`; the date defaults to today.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateRequest {
    #[serde(default)]
    pub date: Option<String>,
}

/// Per-organization workforce statistics.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HrmStats {
    pub headcount: usize,
    pub active: usize,
    pub terminated: usize,
    /// Active headcount per department; employees without a department
    /// are grouped under "unassigned".
    pub by_department: std::collections::BTreeMap<String, usize>,
    /// Sum of active monthly salaries.
    pub monthly_payroll: f64,
}
