use super::*;
use crate::domain::{FilterCriteria, ResultLimit};
use serde_json::json;

#[test]
fn non_array_list_payloads_normalize_to_empty_result_set() {
    for payload in [
        json!(null),
        json!({ "employees": [] }),
        json!("oops"),
        json!(42),
    ] {
        assert!(normalize_employee_list(payload).is_empty());
    }
}

#[test]
fn list_payload_keeps_every_entry_in_order() {
    let employees = normalize_employee_list(json!([
        { "id": 2, "lastName": "Smith", "firstName": "Ann", "officePhone": 5551234 },
        { "lastName": "Nobody" },
        { "id": "abc-1", "lastName": "Jones", "mobilePhone": null },
        "not an object",
    ]));

    assert_eq!(employees.len(), 4);
    assert_eq!(employees[0].id, Some(EmployeeId::from(2)));
    assert_eq!(employees[0].office_phone.as_deref(), Some("5551234"));
    assert_eq!(employees[1].id, None);
    assert_eq!(employees[1].last_name.as_deref(), Some("Nobody"));
    assert_eq!(employees[2].id, Some(EmployeeId::from("abc-1")));
    assert_eq!(employees[2].mobile_phone, None);
    assert_eq!(employees[3], EmployeeSummary::default());
}

#[test]
fn list_ids_accept_any_scalar() {
    let employees = normalize_employee_list(json!([
        { "id": 1, "lastName": "A" },
        { "id": 2.0, "lastName": "B" },
        { "id": 18446744073709551615u64, "lastName": "C" },
        { "lastName": "D" },
        { "id": { "nested": true }, "lastName": "E" },
    ]));

    let ids: Vec<Option<&str>> = employees
        .iter()
        .map(|employee| employee.id.as_ref().map(EmployeeId::as_str))
        .collect();
    assert_eq!(
        ids,
        [
            Some("1"),
            Some("2.0"),
            Some("18446744073709551615"),
            None,
            None
        ]
    );
    let names: Vec<Option<&str>> = employees
        .iter()
        .map(|employee| employee.last_name.as_deref())
        .collect();
    assert_eq!(names, [Some("A"), Some("B"), Some("C"), Some("D"), Some("E")]);
}

#[test]
fn detail_ids_accept_any_scalar_or_none() {
    for (raw_id, expected) in [
        (json!(7.0), Some("7.0")),
        (json!(18446744073709551615u64), Some("18446744073709551615")),
        (json!(null), None),
        (json!([7]), None),
    ] {
        let detail = decode_employee_detail(json!({ "id": raw_id, "jobTitle": "Engineer" }))
            .expect("detail decodes");
        assert_eq!(detail.id.as_ref().map(EmployeeId::as_str), expected);
        assert_eq!(detail.job_title.as_deref(), Some("Engineer"));
    }

    let detail = decode_employee_detail(json!({ "jobTitle": "Engineer" })).expect("no id");
    assert_eq!(detail.id, None);
}

#[test]
fn summary_columns_follow_table_order() {
    let titles: Vec<&str> = SUMMARY_COLUMNS.iter().map(|c| c.title).collect();
    assert_eq!(
        titles,
        [
            "Last Name",
            "First Name",
            "Username",
            "Office Number",
            "Mobile Number"
        ]
    );
}

#[test]
fn detail_rows_include_job_title_and_department() {
    let detail = decode_employee_detail(json!({
        "id": 7,
        "lastName": "Doe",
        "firstName": "Jane",
        "userPrincipalName": "jdoe@example.com",
        "jobTitle": "Engineer",
        "department": "R&D",
    }))
    .expect("detail");

    let rendered: Vec<(&str, Option<&str>)> = DETAIL_ROWS
        .iter()
        .map(|row| (row.title, detail.value(row.field)))
        .collect();
    assert_eq!(rendered[3], ("Job Title", Some("Engineer")));
    assert_eq!(rendered[4], ("Department", Some("R&D")));
    assert_eq!(rendered[5], ("Office Number", None));
}

#[test]
fn detail_payload_must_be_an_object() {
    let err = decode_employee_detail(json!([1, 2])).expect_err("array is malformed");
    assert_eq!(err.code, crate::error::ErrorCode::MalformedPayload);
}

#[test]
fn filter_serializes_to_directory_query_names() {
    let mut filter = FilterCriteria::with_limit(ResultLimit::L50);
    filter.last_name = "Smith".into();

    assert_eq!(
        serde_json::to_value(&filter).expect("serialize"),
        json!({ "limit": 50, "lastName": "Smith", "firstName": "" })
    );
}

#[test]
fn limits_outside_the_allowed_set_are_rejected() {
    assert_eq!(ResultLimit::try_from(100), Ok(ResultLimit::L100));
    assert!(ResultLimit::try_from(30).is_err());
    assert!(serde_json::from_value::<ResultLimit>(json!(75)).is_err());
}
