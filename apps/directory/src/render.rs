//! Plain-text rendering of directory snapshots.

use client_core::{DirectorySnapshot, ModalState};
use shared::protocol::{EmployeeField, FieldColumn, DETAIL_ROWS, SUMMARY_COLUMNS};

pub fn render_filters(snapshot: &DirectorySnapshot) -> String {
    let limits: Vec<String> = snapshot
        .limits
        .iter()
        .map(|limit| {
            if *limit == snapshot.applied.limit {
                format!("[{limit}]")
            } else {
                limit.to_string()
            }
        })
        .collect();
    let mut out = format!(
        "limit: {}  last name: {:?}  first name: {:?}",
        limits.join(" "),
        snapshot.staged.last_name,
        snapshot.staged.first_name
    );
    if snapshot.staged.last_name != snapshot.applied.last_name
        || snapshot.staged.first_name != snapshot.applied.first_name
    {
        out.push_str("  (not applied; type `search`)");
    }
    out
}

/// Result table with a leading row number used by `open <row>`.
pub fn render_table(snapshot: &DirectorySnapshot) -> String {
    let rows: Vec<Vec<String>> = snapshot
        .list
        .results
        .iter()
        .enumerate()
        .map(|(index, employee)| {
            std::iter::once((index + 1).to_string())
                .chain(cells(&SUMMARY_COLUMNS, move |field| employee.value(field)))
                .collect()
        })
        .collect();
    let header: Vec<String> = std::iter::once("#".to_string())
        .chain(SUMMARY_COLUMNS.iter().map(|column| column.title.to_string()))
        .collect();

    let mut out = grid(&header, &rows);
    if snapshot.list.loading {
        out.push_str(&format!(
            "loading... ({} {} in flight)\n",
            snapshot.list.in_flight,
            if snapshot.list.in_flight == 1 { "query" } else { "queries" }
        ));
    } else if rows.is_empty() {
        out.push_str("no employees\n");
    }
    if let Some(error) = &snapshot.list.last_error {
        out.push_str(&format!("error: {}\n", error.message));
    }
    out
}

pub fn render_dialog(modal: &ModalState) -> String {
    if !modal.open {
        return String::new();
    }
    let mut out = String::from("== User Details ==\n");
    if modal.loading {
        out.push_str("loading...\n");
        return out;
    }
    let width = DETAIL_ROWS
        .iter()
        .map(|row| row.title.len())
        .max()
        .unwrap_or_default();
    for row in DETAIL_ROWS {
        let value = modal
            .detail
            .as_ref()
            .and_then(|detail| detail.value(row.field))
            .unwrap_or_default();
        out.push_str(&format!("{:<width$}  {value}\n", row.title));
    }
    if let Some(error) = &modal.last_error {
        out.push_str(&format!("error: {}\n", error.message));
    }
    out
}

fn cells<'a>(
    columns: &'a [FieldColumn],
    value: impl Fn(EmployeeField) -> Option<&'a str> + 'a,
) -> impl Iterator<Item = String> + 'a {
    columns
        .iter()
        .map(move |column| value(column.field).unwrap_or_default().to_string())
}

fn grid(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(header);
    for row in rows {
        out.push_str(&line(row.as_slice()));
    }
    out
}

#[cfg(test)]
mod tests {
    use client_core::{DirectoryState, FailureReporting, ResponseOrdering};
    use serde_json::json;
    use shared::domain::{EmployeeId, FilterField, ResultLimit};

    use super::*;

    fn state() -> DirectoryState {
        DirectoryState::new(
            ResultLimit::L50,
            ResponseOrdering::LatestRequest,
            FailureReporting::Silent,
        )
    }

    #[test]
    fn table_lists_columns_in_display_order() {
        let mut state = state();
        let ticket = state.initial_query();
        state.settle_list(
            &ticket,
            Ok(json!([{
                "id": 1,
                "lastName": "Smith",
                "firstName": "Ann",
                "userPrincipalName": "asmith@example.com",
                "officePhone": "555-0100",
            }])),
        );

        let table = render_table(&state.snapshot());
        let mut lines = table.lines();
        assert_eq!(
            lines.next().expect("header").split_whitespace().collect::<Vec<_>>(),
            ["#", "Last", "Name", "First", "Name", "Username", "Office", "Number", "Mobile", "Number"]
        );
        assert_eq!(
            lines.next().expect("row").split_whitespace().collect::<Vec<_>>(),
            ["1", "Smith", "Ann", "asmith@example.com", "555-0100"]
        );
    }

    #[test]
    fn loading_table_reports_queries_in_flight() {
        let mut state = state();
        state.initial_query();
        assert!(render_table(&state.snapshot()).contains("loading... (1 query in flight)"));

        state.confirm_search();
        assert!(render_table(&state.snapshot()).contains("loading... (2 queries in flight)"));
    }

    #[test]
    fn rows_without_id_still_render() {
        let mut state = state();
        let ticket = state.initial_query();
        state.settle_list(
            &ticket,
            Ok(json!([{ "id": 1.5, "lastName": "Float" }, { "lastName": "NoId" }])),
        );

        let table = render_table(&state.snapshot());
        assert!(table.contains("1  Float"));
        assert!(table.contains("2  NoId"));
    }

    #[test]
    fn loading_dialog_hides_rows() {
        let mut state = state();
        state.activate_row(EmployeeId::from(7));

        let dialog = render_dialog(&state.snapshot().modal);
        assert!(dialog.contains("loading..."));
        assert!(!dialog.contains("Job Title"));
    }

    #[test]
    fn settled_dialog_renders_every_detail_row() {
        let mut state = state();
        let ticket = state.activate_row(EmployeeId::from(7));
        state.settle_detail(&ticket, Ok(json!({ "jobTitle": "Engineer" })));

        let dialog = render_dialog(&state.snapshot().modal);
        let titles: Vec<&str> = dialog.lines().skip(1).map(|line| line[..13].trim()).collect();
        assert_eq!(
            titles,
            [
                "Last Name",
                "First Name",
                "Username",
                "Job Title",
                "Department",
                "Office Number",
                "Mobile Number"
            ]
        );
        assert!(dialog.contains("Engineer"));
    }

    #[test]
    fn filters_flag_unapplied_staged_text() {
        let mut state = state();
        state.stage_edit(FilterField::LastName, "Smith");

        let filters = render_filters(&state.snapshot());
        assert!(filters.contains("[50]"));
        assert!(filters.contains("not applied"));
    }
}
