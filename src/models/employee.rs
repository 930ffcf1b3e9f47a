use serde::{Deserialize, Serialize};

/// An employee record as returned by `/api/employees`.
#[derive(Debug, Clone, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub department: String,
    /// User id of the account that created the record.
    pub created_by: Option<i64>,
    /// ISO-8601 creation timestamp; absent on older records.
    pub created_at: Option<String>,
}

/// Body for `POST /api/employees`.
#[derive(Debug, Clone, Serialize)]
pub struct NewEmployee {
    pub name: String,
    pub department: String,
}

/// Partial body for `PUT /api/employees/<id>`; omitted fields keep their
/// current value on the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmployeeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}
