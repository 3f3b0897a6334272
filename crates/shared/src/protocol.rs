use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{domain::EmployeeId, error::ApiException};

/// Employee fields the presentation layer can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmployeeField {
    LastName,
    FirstName,
    UserPrincipalName,
    JobTitle,
    Department,
    OfficePhone,
    MobilePhone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldColumn {
    pub title: &'static str,
    pub field: EmployeeField,
}

const fn column(title: &'static str, field: EmployeeField) -> FieldColumn {
    FieldColumn { title, field }
}

/// Result table columns, in display order.
pub const SUMMARY_COLUMNS: [FieldColumn; 5] = [
    column("Last Name", EmployeeField::LastName),
    column("First Name", EmployeeField::FirstName),
    column("Username", EmployeeField::UserPrincipalName),
    column("Office Number", EmployeeField::OfficePhone),
    column("Mobile Number", EmployeeField::MobilePhone),
];

/// Rows of the employee detail dialog, in display order.
pub const DETAIL_ROWS: [FieldColumn; 7] = [
    column("Last Name", EmployeeField::LastName),
    column("First Name", EmployeeField::FirstName),
    column("Username", EmployeeField::UserPrincipalName),
    column("Job Title", EmployeeField::JobTitle),
    column("Department", EmployeeField::Department),
    column("Office Number", EmployeeField::OfficePhone),
    column("Mobile Number", EmployeeField::MobilePhone),
];

/// One row of the result table. A row without a usable `id` still renders;
/// it just cannot open the detail dialog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<EmployeeId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub user_principal_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub office_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub mobile_phone: Option<String>,
}

impl EmployeeSummary {
    pub fn value(&self, field: EmployeeField) -> Option<&str> {
        match field {
            EmployeeField::LastName => self.last_name.as_deref(),
            EmployeeField::FirstName => self.first_name.as_deref(),
            EmployeeField::UserPrincipalName => self.user_principal_name.as_deref(),
            EmployeeField::OfficePhone => self.office_phone.as_deref(),
            EmployeeField::MobilePhone => self.mobile_phone.as_deref(),
            EmployeeField::JobTitle | EmployeeField::Department => None,
        }
    }
}

/// Extended profile shown in the detail dialog. Every field is optional: a
/// sparse record renders as blank cells rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetail {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<EmployeeId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub user_principal_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub job_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub office_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub mobile_phone: Option<String>,
}

impl EmployeeDetail {
    pub fn value(&self, field: EmployeeField) -> Option<&str> {
        match field {
            EmployeeField::LastName => self.last_name.as_deref(),
            EmployeeField::FirstName => self.first_name.as_deref(),
            EmployeeField::UserPrincipalName => self.user_principal_name.as_deref(),
            EmployeeField::JobTitle => self.job_title.as_deref(),
            EmployeeField::Department => self.department.as_deref(),
            EmployeeField::OfficePhone => self.office_phone.as_deref(),
            EmployeeField::MobilePhone => self.mobile_phone.as_deref(),
        }
    }
}

/// Accepts strings, numbers and booleans for display fields; anything else
/// (null, objects, arrays) reads as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<EmployeeId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.map(EmployeeId))
}

/// Turns a raw list response into a result set.
///
/// A payload that is not a JSON array is an empty result set, not an error.
/// Every array entry becomes a row, in order; entries that are not objects
/// become blank rows.
pub fn normalize_employee_list(payload: Value) -> Vec<EmployeeSummary> {
    let entries = match payload {
        Value::Array(entries) => entries,
        other => {
            warn!(
                payload_kind = json_kind(&other),
                "directory: list payload is not an array; using empty result set"
            );
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let kind = json_kind(&entry);
            serde_json::from_value(entry).unwrap_or_else(|err| {
                warn!(
                    index,
                    entry_kind = kind,
                    error = %err,
                    "directory: list entry is not an employee object; rendering blank row"
                );
                EmployeeSummary::default()
            })
        })
        .collect()
}

/// Decodes a detail response. Anything other than a JSON object is a
/// malformed payload.
pub fn decode_employee_detail(payload: Value) -> Result<EmployeeDetail, ApiException> {
    if !payload.is_object() {
        return Err(ApiException::malformed(format!(
            "employee detail payload is {}, expected an object",
            json_kind(&payload)
        )));
    }
    serde_json::from_value(payload)
        .map_err(|err| ApiException::malformed(format!("invalid employee detail payload: {err}")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
