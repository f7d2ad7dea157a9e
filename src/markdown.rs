use serde_json::Value;

use crate::summary::{group_label, ranked, Summary};

/// Upper bound on any rendered tool response.
pub const CHARACTER_LIMIT: usize = 25_000;

/// Caps `text` at [`CHARACTER_LIMIT`], appending a truncation marker.
pub fn truncate_if_needed(text: String) -> String {
    if text.len() <= CHARACTER_LIMIT {
        return text;
    }

    let mut cut = CHARACTER_LIMIT - 50;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}\n\n... [Output truncated at {} characters]",
        &text[..cut],
        CHARACTER_LIMIT
    )
}

/// Renders a field of a loosely-typed record for display.
///
/// Strings are shown bare, missing and null values as "-".
fn field(record: &Value, key: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn yes_no(record: &Value, key: &str) -> &'static str {
    if record.get(key).and_then(Value::as_bool).unwrap_or(false) {
        "Yes"
    } else {
        "No"
    }
}

/// Formats one timesheet record as markdown.
pub fn format_timesheet(timesheet: &Value) -> String {
    let duration = timesheet
        .get("duration")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let running = matches!(timesheet.get("end"), None | Some(Value::Null));
    let status = if running { "⏱️ RUNNING" } else { "✓ Completed" };
    let end = if running {
        "Still running...".to_string()
    } else {
        field(timesheet, "end")
    };

    let mut lines = vec![
        format!("## Timesheet #{}", field(timesheet, "id")),
        format!("**Status:** {}", status),
        format!("**Project ID:** {}", field(timesheet, "project")),
        format!("**Activity ID:** {}", field(timesheet, "activity")),
        format!("**Start:** {}", field(timesheet, "begin")),
        format!("**End:** {}", end),
        format!(
            "**Duration:** {:.2} hours ({} seconds)",
            duration as f64 / 3600.0,
            duration
        ),
        format!("**Billable:** {}", yes_no(timesheet, "billable")),
        format!("**Exported:** {}", yes_no(timesheet, "exported")),
    ];

    if let Some(description) = timesheet.get("description").and_then(Value::as_str) {
        if !description.is_empty() {
            lines.push(format!("**Description:** {}", description));
        }
    }
    if let Some(tags) = timesheet.get("tags").and_then(Value::as_array) {
        if !tags.is_empty() {
            let joined: Vec<&str> = tags.iter().filter_map(Value::as_str).collect();
            lines.push(format!("**Tags:** {}", joined.join(", ")));
        }
    }
    if let Some(rate) = timesheet.get("rate") {
        if !rate.is_null() {
            lines.push(format!("**Rate:** {}", rate));
        }
    }

    lines.join("\n")
}

/// Formats a page of timesheets as markdown, with the duration total up top.
pub fn format_timesheets(timesheets: &[Value]) -> String {
    if timesheets.is_empty() {
        return "No timesheets found.".to_string();
    }

    let total_seconds: i64 = timesheets
        .iter()
        .filter_map(|entry| entry.get("duration").and_then(Value::as_i64))
        .sum();

    let mut lines = vec![
        format!("# Timesheets ({} entries)", timesheets.len()),
        format!("**Total Duration:** {:.2} hours", total_seconds as f64 / 3600.0),
        String::new(),
    ];
    for timesheet in timesheets {
        lines.push(format_timesheet(timesheet));
        lines.push(String::new());
    }

    truncate_if_needed(lines.join("\n"))
}

pub fn format_project(project: &Value) -> String {
    let mut lines = vec![
        format!("## {} (#{})", field(project, "name"), field(project, "id")),
        format!("**Number:** {}", field(project, "number")),
        format!("**Customer ID:** {}", field(project, "customer")),
        format!("**Visible:** {}", yes_no(project, "visible")),
        format!("**Billable:** {}", yes_no(project, "billable")),
    ];
    push_optional(&mut lines, project, "color", "Color");
    push_optional(&mut lines, project, "comment", "Comment");

    lines.join("\n")
}

pub fn format_projects(projects: &[Value]) -> String {
    format_listing(projects, "No projects found.", "Projects", format_project)
}

pub fn format_activity(activity: &Value) -> String {
    // Activities without a project are global.
    let project = match activity.get("project") {
        None | Some(Value::Null) => "Global".to_string(),
        Some(value) => field_value(value),
    };

    let mut lines = vec![
        format!("## {} (#{})", field(activity, "name"), field(activity, "id")),
        format!("**Number:** {}", field(activity, "number")),
        format!("**Project ID:** {}", project),
        format!("**Visible:** {}", yes_no(activity, "visible")),
        format!("**Billable:** {}", yes_no(activity, "billable")),
    ];
    push_optional(&mut lines, activity, "color", "Color");
    push_optional(&mut lines, activity, "comment", "Comment");

    lines.join("\n")
}

pub fn format_activities(activities: &[Value]) -> String {
    format_listing(activities, "No activities found.", "Activities", format_activity)
}

pub fn format_customer(customer: &Value) -> String {
    let mut lines = vec![
        format!("## {} (#{})", field(customer, "name"), field(customer, "id")),
        format!("**Number:** {}", field(customer, "number")),
        format!("**Currency:** {}", field(customer, "currency")),
        format!("**Visible:** {}", yes_no(customer, "visible")),
        format!("**Billable:** {}", yes_no(customer, "billable")),
    ];
    push_optional(&mut lines, customer, "color", "Color");
    push_optional(&mut lines, customer, "comment", "Comment");

    lines.join("\n")
}

pub fn format_customers(customers: &[Value]) -> String {
    format_listing(customers, "No customers found.", "Customers", format_customer)
}

/// Renders the aggregated summary as a markdown report.
///
/// Groups appear in descending order of summed time; percentage lines
/// report 0% when there are no entries at all.
pub fn format_summary(summary: &Summary) -> String {
    let mut lines = vec![
        "# Timesheet Summary Report".to_string(),
        String::new(),
        "## Overview".to_string(),
        format!("**Total Entries:** {}", summary.total_entries),
        format!("**Total Time:** {:.2} hours", summary.total_hours()),
        format!(
            "**Billable Time:** {:.2} hours ({:.1}%)",
            summary.billable_hours(),
            summary.billable_percent()
        ),
        format!(
            "**Non-Billable Time:** {:.2} hours ({:.1}%)",
            summary.non_billable_hours(),
            summary.non_billable_percent()
        ),
        String::new(),
        "## By Project".to_string(),
    ];

    for (key, totals) in ranked(&summary.by_project) {
        lines.push(format!(
            "- Project #{}: {:.2} hours ({} entries)",
            group_label(key),
            totals.seconds as f64 / 3600.0,
            totals.count
        ));
    }

    lines.push(String::new());
    lines.push("## By Activity".to_string());
    for (key, totals) in ranked(&summary.by_activity) {
        lines.push(format!(
            "- Activity #{}: {:.2} hours ({} entries)",
            group_label(key),
            totals.seconds as f64 / 3600.0,
            totals.count
        ));
    }

    lines.join("\n")
}

fn format_listing(
    records: &[Value],
    empty_text: &str,
    heading: &str,
    format_one: fn(&Value) -> String,
) -> String {
    if records.is_empty() {
        return empty_text.to_string();
    }

    let mut lines = vec![format!("# {} ({} total)", heading, records.len()), String::new()];
    for record in records {
        lines.push(format_one(record));
        lines.push(String::new());
    }

    truncate_if_needed(lines.join("\n"))
}

fn push_optional(lines: &mut Vec<String>, record: &Value, key: &str, label: &str) {
    match record.get(key) {
        None | Some(Value::Null) => {}
        Some(value) => lines.push(format!("**{}:** {}", label, field_value(value))),
    }
}

fn field_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{
        format_activity, format_summary, format_timesheet, format_timesheets, truncate_if_needed,
        CHARACTER_LIMIT,
    };
    use crate::summary::Summary;

    #[test]
    fn test_truncate_short_text_untouched() {
        let text = "short".to_string();

        assert_eq!(truncate_if_needed(text.clone()), text);
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "x".repeat(CHARACTER_LIMIT + 1);

        let result = truncate_if_needed(text);

        assert!(result.len() <= CHARACTER_LIMIT);
        assert!(result.ends_with("[Output truncated at 25000 characters]"));
    }

    #[test]
    fn test_format_timesheet_completed() {
        let timesheet = json!({
            "id": 1245,
            "project": 1,
            "activity": 355,
            "begin": "2025-11-06T09:00:00+00:00",
            "end": "2025-11-06T17:00:00+00:00",
            "duration": 28800,
            "billable": true,
            "exported": false,
            "description": "Code review",
            "tags": ["review", "testing"],
        });

        let text = format_timesheet(&timesheet);

        assert!(text.contains("## Timesheet #1245"));
        assert!(text.contains("✓ Completed"));
        assert!(text.contains("**Duration:** 8.00 hours (28800 seconds)"));
        assert!(text.contains("**Billable:** Yes"));
        assert!(text.contains("**Description:** Code review"));
        assert!(text.contains("**Tags:** review, testing"));
    }

    #[test]
    fn test_format_timesheet_running() {
        let timesheet = json!({"id": 7, "project": 1, "activity": 2, "duration": 0});

        let text = format_timesheet(&timesheet);

        assert!(text.contains("⏱️ RUNNING"));
        assert!(text.contains("Still running..."));
    }

    #[test]
    fn test_format_timesheets_empty() {
        assert_eq!(format_timesheets(&[]), "No timesheets found.");
    }

    #[test]
    fn test_format_timesheets_totals_duration() {
        let timesheets = vec![
            json!({"id": 1, "duration": 3600}),
            json!({"id": 2, "duration": 1800}),
        ];

        let text = format_timesheets(&timesheets);

        assert!(text.starts_with("# Timesheets (2 entries)"));
        assert!(text.contains("**Total Duration:** 1.50 hours"));
    }

    #[test]
    fn test_format_activity_global() {
        let activity = json!({"id": 355, "name": "Code Review", "visible": true});

        let text = format_activity(&activity);

        assert!(text.contains("## Code Review (#355)"));
        assert!(text.contains("**Project ID:** Global"));
    }

    /// Groups are listed largest first and the percentages line up with
    /// the worked scenario.
    #[test]
    fn test_format_summary_report() {
        let entries: Vec<Value> = vec![
            json!({"duration": 3600, "billable": true, "project": 1, "activity": 10}),
            json!({"duration": 1800, "billable": false, "project": 1, "activity": 11}),
            json!({"duration": 7200, "billable": true, "project": 2, "activity": 10}),
        ];
        let summary = Summary::from_entries(&entries);

        let text = format_summary(&summary);

        assert!(text.contains("**Total Entries:** 3"));
        assert!(text.contains("**Total Time:** 3.50 hours"));
        assert!(text.contains("**Billable Time:** 2.50 hours (71.4%)"));
        assert!(text.contains("**Non-Billable Time:** 1.00 hours (28.6%)"));
        let project_2 = text.find("- Project #2: 2.00 hours (1 entries)").unwrap();
        let project_1 = text.find("- Project #1: 1.50 hours (2 entries)").unwrap();
        assert!(project_2 < project_1);
        assert!(text.contains("- Activity #10: 3.00 hours (2 entries)"));
        assert!(text.contains("- Activity #11: 0.50 hours (1 entries)"));
    }

    /// No entries must still render, with 0% instead of a division by zero.
    #[test]
    fn test_format_summary_empty() {
        let summary = Summary::from_entries(&[]);

        let text = format_summary(&summary);

        assert!(text.contains("**Total Entries:** 0"));
        assert!(text.contains("(0.0%)"));
    }
}
