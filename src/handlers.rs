use log::warn;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::kimai::{ApiError, KimaiApi};
use crate::markdown;
use crate::summary::Summary;
use crate::tools::{
    CreateActivityInput, CreateCustomerInput, CreateProjectInput, CreateTimesheetInput,
    DeleteTimesheetInput, Format, GetActivityInput, GetCustomerInput, GetProjectInput,
    GetTimesheetInput, GetTimesheetSummaryInput, ListActivitiesInput, ListCustomersInput,
    ListProjectsInput, ListTimesheetsInput, StartTimesheetInput, StopTimesheetInput,
    UpdateActivityInput, UpdateCustomerInput, UpdateProjectInput, UpdateTimesheetInput,
    ValidationError,
};

/// Page size for the summary tool's single fetch; larger than the listing
/// cap so one aggregation call sees a useful slice of data.
const SUMMARY_PAGE_SIZE: i64 = 1000;

/// Anything that can go wrong inside one tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Invalid arguments: {0}")]
    Arguments(#[from] serde_json::Error),
}

/// True when a rendered tool response reports a failure.
///
/// Matches both the uniform `Error: ` prefix and the `❌ Error:` form
/// used by domain refusals like stopping a completed timesheet.
pub fn is_error_text(text: &str) -> bool {
    text.starts_with("Error: ") || text.starts_with("❌ Error:")
}

/// Runs one tool invocation and renders the outcome as text.
///
/// Failures never propagate: every error is rendered with an `Error: `
/// prefix so one bad call cannot take the server down.
pub async fn call_tool(name: &str, arguments: Value, client: &dyn KimaiApi) -> String {
    match dispatch(name, arguments, client).await {
        Ok(text) => text,
        Err(err) => {
            warn!("tool '{}' failed: {}", name, err);
            format!("Error: {}", err)
        }
    }
}

async fn dispatch(name: &str, arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    match name {
        "list_timesheets" => list_timesheets(arguments, client).await,
        "get_timesheet" => get_timesheet(arguments, client).await,
        "start_timesheet" => start_timesheet(arguments, client).await,
        "stop_timesheet" => stop_timesheet(arguments, client).await,
        "create_timesheet" => create_timesheet(arguments, client).await,
        "update_timesheet" => update_timesheet(arguments, client).await,
        "delete_timesheet" => delete_timesheet(arguments, client).await,
        "list_projects" => list_projects(arguments, client).await,
        "get_project" => get_project(arguments, client).await,
        "create_project" => create_project(arguments, client).await,
        "update_project" => update_project(arguments, client).await,
        "list_activities" => list_activities(arguments, client).await,
        "get_activity" => get_activity(arguments, client).await,
        "create_activity" => create_activity(arguments, client).await,
        "update_activity" => update_activity(arguments, client).await,
        "list_customers" => list_customers(arguments, client).await,
        "get_customer" => get_customer(arguments, client).await,
        "create_customer" => create_customer(arguments, client).await,
        "update_customer" => update_customer(arguments, client).await,
        "get_timesheet_summary" => get_timesheet_summary(arguments, client).await,
        _ => Ok(format!("Unknown tool: {}", name)),
    }
}

fn parse<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    Ok(serde_json::from_value(arguments)?)
}

/// Kimai expects boolean query parameters as literal "1"/"0".
fn flag(value: bool) -> String {
    let literal = if value { "1" } else { "0" };
    literal.to_string()
}

fn push_id(params: &mut Vec<(String, String)>, key: &str, value: Option<i64>) {
    if let Some(id) = value {
        params.push((key.to_string(), id.to_string()));
    }
}

fn push_flag(params: &mut Vec<(String, String)>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        params.push((key.to_string(), flag(value)));
    }
}

fn push_text(params: &mut Vec<(String, String)>, key: &str, value: Option<String>) {
    if let Some(text) = value {
        params.push((key.to_string(), text));
    }
}

fn insert_optional(body: &mut Map<String, Value>, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        body.insert(key.to_string(), value.into());
    }
}

fn now_timestamp() -> String {
    crate::datetime::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn render_one(result: &Value, format: Format, format_one: fn(&Value) -> String) -> String {
    match format {
        Format::Markdown => format_one(result),
        Format::Json => result.to_string(),
    }
}

fn render_list(result: &Value, format: Format, format_list: fn(&[Value]) -> String) -> String {
    match format {
        Format::Markdown => format_list(result.as_array().map(Vec::as_slice).unwrap_or(&[])),
        Format::Json => markdown::truncate_if_needed(result.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Timesheets
// ---------------------------------------------------------------------------

async fn list_timesheets(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: ListTimesheetsInput = parse(arguments)?;
    input.validate()?;

    let mut params = vec![
        ("page".to_string(), input.page.to_string()),
        ("size".to_string(), input.size.to_string()),
    ];
    push_id(&mut params, "user", input.user);
    push_id(&mut params, "customer", input.customer);
    push_id(&mut params, "project", input.project);
    push_id(&mut params, "activity", input.activity);
    push_flag(&mut params, "active", input.active);
    push_flag(&mut params, "exported", input.exported);
    push_text(&mut params, "begin", input.begin);
    push_text(&mut params, "end", input.end);

    let result = client.request(Method::GET, "timesheets", params, None).await?;

    Ok(render_list(&result, input.format, markdown::format_timesheets))
}

async fn get_timesheet(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: GetTimesheetInput = parse(arguments)?;
    input.validate()?;

    let result = client
        .request(Method::GET, &format!("timesheets/{}", input.id), vec![], None)
        .await?;

    Ok(render_one(&result, input.format, markdown::format_timesheet))
}

async fn start_timesheet(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: StartTimesheetInput = parse(arguments)?;
    input.validate()?;

    let mut body = Map::new();
    body.insert("project".to_string(), json!(input.project));
    body.insert("activity".to_string(), json!(input.activity));
    body.insert("begin".to_string(), json!(now_timestamp()));
    insert_optional(&mut body, "description", input.description);
    insert_optional(&mut body, "tags", input.tags);

    let result = client
        .request(Method::POST, "timesheets", vec![], Some(Value::Object(body)))
        .await?;

    Ok(format!(
        "✓ Timesheet started successfully!\n\n{}",
        markdown::format_timesheet(&result)
    ))
}

async fn stop_timesheet(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: StopTimesheetInput = parse(arguments)?;
    input.validate()?;

    // Fetch first: stopping an already-completed entry would silently
    // rewrite its end time.
    let path = format!("timesheets/{}", input.id);
    let current = client.request(Method::GET, &path, vec![], None).await?;
    if !matches!(current.get("end"), None | Some(Value::Null)) {
        return Ok(format!(
            "❌ Error: Timesheet #{} is not running (already has an end time).",
            input.id
        ));
    }

    let body = json!({"end": now_timestamp()});
    let result = client.request(Method::PATCH, &path, vec![], Some(body)).await?;

    Ok(format!(
        "✓ Timesheet stopped successfully!\n\n{}",
        markdown::format_timesheet(&result)
    ))
}

async fn create_timesheet(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: CreateTimesheetInput = parse(arguments)?;
    input.validate()?;

    let mut body = Map::new();
    body.insert("project".to_string(), json!(input.project));
    body.insert("activity".to_string(), json!(input.activity));
    body.insert("begin".to_string(), json!(input.begin));
    insert_optional(&mut body, "end", input.end);
    insert_optional(&mut body, "description", input.description);
    insert_optional(&mut body, "tags", input.tags);

    let result = client
        .request(Method::POST, "timesheets", vec![], Some(Value::Object(body)))
        .await?;

    Ok(format!(
        "✓ Timesheet created successfully!\n\n{}",
        markdown::format_timesheet(&result)
    ))
}

async fn update_timesheet(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: UpdateTimesheetInput = parse(arguments)?;
    input.validate()?;

    let mut body = Map::new();
    insert_optional(&mut body, "begin", input.begin);
    insert_optional(&mut body, "end", input.end);
    insert_optional(&mut body, "description", input.description);
    insert_optional(&mut body, "tags", input.tags);

    let result = client
        .request(
            Method::PATCH,
            &format!("timesheets/{}", input.id),
            vec![],
            Some(Value::Object(body)),
        )
        .await?;

    Ok(format!(
        "✓ Timesheet updated successfully!\n\n{}",
        markdown::format_timesheet(&result)
    ))
}

async fn delete_timesheet(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: DeleteTimesheetInput = parse(arguments)?;
    input.validate()?;

    client
        .request(Method::DELETE, &format!("timesheets/{}", input.id), vec![], None)
        .await?;

    Ok(format!("✓ Timesheet #{} deleted successfully.", input.id))
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

async fn list_projects(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: ListProjectsInput = parse(arguments)?;
    input.validate()?;

    let mut params = vec![
        ("page".to_string(), input.page.to_string()),
        ("size".to_string(), input.size.to_string()),
    ];
    push_id(&mut params, "customer", input.customer);
    push_flag(&mut params, "visible", input.visible);

    let result = client.request(Method::GET, "projects", params, None).await?;

    Ok(render_list(&result, input.format, markdown::format_projects))
}

async fn get_project(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: GetProjectInput = parse(arguments)?;
    input.validate()?;

    let result = client
        .request(Method::GET, &format!("projects/{}", input.id), vec![], None)
        .await?;

    Ok(render_one(&result, input.format, markdown::format_project))
}

async fn create_project(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: CreateProjectInput = parse(arguments)?;
    input.validate()?;

    let mut body = Map::new();
    body.insert("name".to_string(), json!(input.name));
    body.insert("customer".to_string(), json!(input.customer));
    body.insert("visible".to_string(), json!(input.visible));
    body.insert("billable".to_string(), json!(input.billable));
    insert_optional(&mut body, "color", input.color);

    let result = client
        .request(Method::POST, "projects", vec![], Some(Value::Object(body)))
        .await?;

    Ok(format!(
        "✓ Project created successfully!\n\n{}",
        markdown::format_project(&result)
    ))
}

async fn update_project(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: UpdateProjectInput = parse(arguments)?;
    input.validate()?;

    let mut body = Map::new();
    insert_optional(&mut body, "name", input.name);
    insert_optional(&mut body, "visible", input.visible);
    insert_optional(&mut body, "billable", input.billable);
    insert_optional(&mut body, "color", input.color);

    let result = client
        .request(
            Method::PATCH,
            &format!("projects/{}", input.id),
            vec![],
            Some(Value::Object(body)),
        )
        .await?;

    Ok(format!(
        "✓ Project updated successfully!\n\n{}",
        markdown::format_project(&result)
    ))
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

async fn list_activities(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: ListActivitiesInput = parse(arguments)?;
    input.validate()?;

    let mut params = vec![
        ("page".to_string(), input.page.to_string()),
        ("size".to_string(), input.size.to_string()),
    ];
    push_id(&mut params, "project", input.project);
    push_flag(&mut params, "visible", input.visible);
    push_text(&mut params, "term", input.term);

    let result = client.request(Method::GET, "activities", params, None).await?;

    Ok(render_list(&result, input.format, markdown::format_activities))
}

async fn get_activity(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: GetActivityInput = parse(arguments)?;
    input.validate()?;

    let result = client
        .request(Method::GET, &format!("activities/{}", input.id), vec![], None)
        .await?;

    Ok(render_one(&result, input.format, markdown::format_activity))
}

async fn create_activity(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: CreateActivityInput = parse(arguments)?;
    input.validate()?;

    let mut body = Map::new();
    body.insert("name".to_string(), json!(input.name));
    body.insert("visible".to_string(), json!(input.visible));
    body.insert("billable".to_string(), json!(input.billable));
    insert_optional(&mut body, "project", input.project);
    insert_optional(&mut body, "color", input.color);

    let result = client
        .request(Method::POST, "activities", vec![], Some(Value::Object(body)))
        .await?;

    Ok(format!(
        "✓ Activity created successfully!\n\n{}",
        markdown::format_activity(&result)
    ))
}

async fn update_activity(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: UpdateActivityInput = parse(arguments)?;
    input.validate()?;

    let mut body = Map::new();
    insert_optional(&mut body, "name", input.name);
    insert_optional(&mut body, "visible", input.visible);
    insert_optional(&mut body, "billable", input.billable);
    insert_optional(&mut body, "color", input.color);

    let result = client
        .request(
            Method::PATCH,
            &format!("activities/{}", input.id),
            vec![],
            Some(Value::Object(body)),
        )
        .await?;

    Ok(format!(
        "✓ Activity updated successfully!\n\n{}",
        markdown::format_activity(&result)
    ))
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

async fn list_customers(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: ListCustomersInput = parse(arguments)?;
    input.validate()?;

    let mut params = vec![
        ("page".to_string(), input.page.to_string()),
        ("size".to_string(), input.size.to_string()),
    ];
    push_flag(&mut params, "visible", input.visible);

    let result = client.request(Method::GET, "customers", params, None).await?;

    Ok(render_list(&result, input.format, markdown::format_customers))
}

async fn get_customer(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: GetCustomerInput = parse(arguments)?;
    input.validate()?;

    let result = client
        .request(Method::GET, &format!("customers/{}", input.id), vec![], None)
        .await?;

    Ok(render_one(&result, input.format, markdown::format_customer))
}

async fn create_customer(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: CreateCustomerInput = parse(arguments)?;
    input.validate()?;

    let mut body = Map::new();
    body.insert("name".to_string(), json!(input.name));
    body.insert("currency".to_string(), json!(input.currency));
    body.insert("visible".to_string(), json!(input.visible));
    body.insert("billable".to_string(), json!(input.billable));
    insert_optional(&mut body, "color", input.color);

    let result = client
        .request(Method::POST, "customers", vec![], Some(Value::Object(body)))
        .await?;

    Ok(format!(
        "✓ Customer created successfully!\n\n{}",
        markdown::format_customer(&result)
    ))
}

async fn update_customer(arguments: Value, client: &dyn KimaiApi) -> Result<String, ToolError> {
    let input: UpdateCustomerInput = parse(arguments)?;
    input.validate()?;

    let mut body = Map::new();
    insert_optional(&mut body, "name", input.name);
    insert_optional(&mut body, "currency", input.currency);
    insert_optional(&mut body, "visible", input.visible);
    insert_optional(&mut body, "billable", input.billable);
    insert_optional(&mut body, "color", input.color);

    let result = client
        .request(
            Method::PATCH,
            &format!("customers/{}", input.id),
            vec![],
            Some(Value::Object(body)),
        )
        .await?;

    Ok(format!(
        "✓ Customer updated successfully!\n\n{}",
        markdown::format_customer(&result)
    ))
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

async fn get_timesheet_summary(
    arguments: Value,
    client: &dyn KimaiApi,
) -> Result<String, ToolError> {
    let input: GetTimesheetSummaryInput = parse(arguments)?;

    // One bounded fetch; aggregation is purely local from here on.
    let mut params = vec![("size".to_string(), SUMMARY_PAGE_SIZE.to_string())];
    push_id(&mut params, "user", input.user);
    push_id(&mut params, "customer", input.customer);
    push_id(&mut params, "project", input.project);
    push_id(&mut params, "activity", input.activity);
    push_text(&mut params, "begin", input.begin);
    push_text(&mut params, "end", input.end);

    let result = client.request(Method::GET, "timesheets", params, None).await?;
    let entries = result.as_array().map(Vec::as_slice).unwrap_or(&[]);
    let summary = Summary::from_entries(entries);

    Ok(match input.format {
        Format::Markdown => markdown::format_summary(&summary),
        Format::Json => summary.to_json().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use reqwest::Method;
    use serde_json::{json, Value};

    use super::call_tool;
    use crate::datetime::mock_datetime;
    use crate::kimai::{ApiError, MockKimaiApi};

    fn has_param(params: &[(String, String)], key: &str, value: &str) -> bool {
        params.iter().any(|(k, v)| k == key && v == value)
    }

    /// Boolean filters must reach the API as "1"/"0", not true/false.
    #[tokio::test]
    async fn test_list_timesheets_encodes_boolean_filters() {
        let mut client = MockKimaiApi::new();
        client
            .expect_request()
            .withf(|method, path, params, body| {
                *method == Method::GET
                    && path == "timesheets"
                    && has_param(params, "active", "1")
                    && has_param(params, "exported", "0")
                    && has_param(params, "page", "1")
                    && has_param(params, "size", "50")
                    && body.is_none()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!([])));

        let result = call_tool(
            "list_timesheets",
            json!({"active": true, "exported": false}),
            &client,
        )
        .await;

        assert_eq!(result, "[]");
    }

    /// Validation failures are rejected before any network call.
    #[tokio::test]
    async fn test_validation_error_short_circuits() {
        let mut client = MockKimaiApi::new();
        client.expect_request().times(0);

        let result = call_tool("list_timesheets", json!({"size": 500}), &client).await;

        assert!(result.starts_with("Error: Invalid value for 'size'"), "{}", result);
    }

    #[tokio::test]
    async fn test_unknown_argument_rejected() {
        let mut client = MockKimaiApi::new();
        client.expect_request().times(0);

        let result = call_tool("get_timesheet", json!({"id": 1, "bogus": 2}), &client).await;

        assert!(result.starts_with("Error: Invalid arguments"), "{}", result);
    }

    #[tokio::test]
    async fn test_get_timesheet_markdown() {
        let mut client = MockKimaiApi::new();
        client
            .expect_request()
            .withf(|method, path, _, _| *method == Method::GET && path == "timesheets/1245")
            .times(1)
            .returning(|_, _, _, _| {
                Ok(json!({"id": 1245, "duration": 3600, "end": "2025-11-06T17:00:00+00:00"}))
            });

        let result = call_tool(
            "get_timesheet",
            json!({"id": 1245, "format": "markdown"}),
            &client,
        )
        .await;

        assert!(result.contains("## Timesheet #1245"));
        assert!(result.contains("✓ Completed"));
    }

    #[tokio::test]
    async fn test_start_timesheet_posts_current_time() {
        mock_datetime::set_mock_time(
            DateTime::parse_from_rfc3339("2025-11-06T09:00:00+00:00")
                .unwrap()
                .to_utc(),
        );

        let mut client = MockKimaiApi::new();
        client
            .expect_request()
            .withf(|method, path, _, body| {
                let body = body.as_ref().unwrap();
                *method == Method::POST
                    && path == "timesheets"
                    && body["project"] == json!(1)
                    && body["activity"] == json!(355)
                    && body["begin"] == json!("2025-11-06T09:00:00Z")
                    && body.get("description").is_none()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": 9, "duration": 0})));

        let result = call_tool(
            "start_timesheet",
            json!({"project": 1, "activity": 355}),
            &client,
        )
        .await;

        mock_datetime::clear_mock_time();
        assert!(result.starts_with("✓ Timesheet started successfully!"), "{}", result);
    }

    /// Stopping an entry that already has an end time refuses without a PATCH.
    #[tokio::test]
    async fn test_stop_timesheet_already_completed() {
        let mut client = MockKimaiApi::new();
        client
            .expect_request()
            .withf(|method, _, _, _| *method == Method::GET)
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": 5, "end": "2025-11-06T17:00:00+00:00"})));

        let result = call_tool("stop_timesheet", json!({"id": 5}), &client).await;

        assert!(result.contains("not running"), "{}", result);
    }

    #[tokio::test]
    async fn test_stop_timesheet_running() {
        mock_datetime::set_mock_time(
            DateTime::parse_from_rfc3339("2025-11-06T17:30:00+00:00")
                .unwrap()
                .to_utc(),
        );

        let mut client = MockKimaiApi::new();
        client
            .expect_request()
            .withf(|method, path, _, _| *method == Method::GET && path == "timesheets/5")
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": 5, "end": null})));
        client
            .expect_request()
            .withf(|method, path, _, body| {
                *method == Method::PATCH
                    && path == "timesheets/5"
                    && body.as_ref().unwrap()["end"] == json!("2025-11-06T17:30:00Z")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": 5, "duration": 1800, "end": "2025-11-06T17:30:00Z"})));

        let result = call_tool("stop_timesheet", json!({"id": 5}), &client).await;

        mock_datetime::clear_mock_time();
        assert!(result.starts_with("✓ Timesheet stopped successfully!"), "{}", result);
    }

    #[tokio::test]
    async fn test_delete_timesheet() {
        let mut client = MockKimaiApi::new();
        client
            .expect_request()
            .withf(|method, path, _, _| *method == Method::DELETE && path == "timesheets/5")
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"success": true})));

        let result = call_tool("delete_timesheet", json!({"id": 5}), &client).await;

        assert_eq!(result, "✓ Timesheet #5 deleted successfully.");
    }

    #[tokio::test]
    async fn test_create_project_body() {
        let mut client = MockKimaiApi::new();
        client
            .expect_request()
            .withf(|method, path, _, body| {
                let body = body.as_ref().unwrap();
                *method == Method::POST
                    && path == "projects"
                    && body["name"] == json!("Website")
                    && body["customer"] == json!(1)
                    && body["visible"] == json!(true)
                    && body["billable"] == json!(true)
                    && body["color"] == json!("#008000")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": 3, "name": "Website", "customer": 1})));

        let result = call_tool(
            "create_project",
            json!({"name": "Website", "customer": 1, "color": "#008000"}),
            &client,
        )
        .await;

        assert!(result.starts_with("✓ Project created successfully!"), "{}", result);
    }

    /// API failures surface as text with the uniform error prefix.
    #[tokio::test]
    async fn test_api_error_rendered() {
        let mut client = MockKimaiApi::new();
        client.expect_request().times(1).returning(|_, _, _, _| {
            Err(ApiError::Status {
                code: 404,
                detail: "Not found".to_string(),
            })
        });

        let result = call_tool("get_timesheet", json!({"id": 999}), &client).await;

        assert!(result.starts_with("Error: Kimai API error (404): Not found"), "{}", result);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let client = MockKimaiApi::new();

        let result = call_tool("bogus_tool", json!({}), &client).await;

        assert_eq!(result, "Unknown tool: bogus_tool");
    }

    /// The summary path fetches one oversized page and aggregates locally.
    #[tokio::test]
    async fn test_summary_markdown() {
        let mut client = MockKimaiApi::new();
        client
            .expect_request()
            .withf(|method, path, params, _| {
                *method == Method::GET
                    && path == "timesheets"
                    && has_param(params, "size", "1000")
                    && has_param(params, "project", "1")
            })
            .times(1)
            .returning(|_, _, _, _| {
                Ok(json!([
                    {"duration": 3600, "billable": true, "project": 1, "activity": 10},
                    {"duration": 1800, "billable": false, "project": 1, "activity": 11},
                    {"duration": 7200, "billable": true, "project": 2, "activity": 10},
                ]))
            });

        let result = call_tool("get_timesheet_summary", json!({"project": 1}), &client).await;

        assert!(result.contains("# Timesheet Summary Report"));
        assert!(result.contains("**Total Time:** 3.50 hours"));
        assert!(result.contains("- Project #2: 2.00 hours (1 entries)"));
    }

    #[tokio::test]
    async fn test_summary_json() {
        let mut client = MockKimaiApi::new();
        client.expect_request().times(1).returning(|_, _, _, _| {
            Ok(json!([
                {"duration": 3600, "billable": true, "project": 1, "activity": 10},
                {"duration": 1800, "billable": false, "activity": 11},
            ]))
        });

        let result = call_tool("get_timesheet_summary", json!({"format": "json"}), &client).await;

        let value: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(value["total_entries"], json!(2));
        assert_eq!(value["total_hours"], json!(1.5));
        assert_eq!(value["billable_hours"], json!(1.0));
        assert_eq!(value["non_billable_hours"], json!(0.5));
        assert_eq!(value["by_project"]["none"]["count"], json!(1));
    }
}
