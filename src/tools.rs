use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

const MAX_NAME_LENGTH: usize = 150;
const MAX_DESCRIPTION_LENGTH: usize = 1000;
const MAX_TERM_LENGTH: usize = 200;

/// A tool input rejected before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid value for '{field}': {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Response format selector shared by the read tools.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Markdown,
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_markdown() -> Format {
    Format::Markdown
}

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    "USD".to_string()
}

fn require_positive(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be a positive integer"))
    }
}

fn require_page_and_size(page: i64, size: i64) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::new("page", "must be at least 1"));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(ValidationError::new(
            "size",
            format!("must be between 1 and {}", MAX_PAGE_SIZE),
        ));
    }
    Ok(())
}

fn require_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", MAX_NAME_LENGTH),
        ));
    }
    Ok(())
}

fn require_max_length(
    field: &'static str,
    value: &Option<String>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(text) if text.chars().count() > max => Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max),
        )),
        _ => Ok(()),
    }
}

/// Colors must be hex `#RRGGBB`, matching what Kimai stores.
fn require_color(value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        None => Ok(()),
        Some(color) => {
            let hex = color.strip_prefix('#');
            let valid = matches!(hex, Some(digits)
                if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()));
            if valid {
                Ok(())
            } else {
                Err(ValidationError::new(
                    "color",
                    "must be a hex color code like '#008000'",
                ))
            }
        }
    }
}

fn require_currency(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() == 3 {
        Ok(())
    } else {
        Err(ValidationError::new(
            "currency",
            "must be a 3-letter currency code",
        ))
    }
}

// ---------------------------------------------------------------------------
// Timesheet inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListTimesheetsInput {
    pub user: Option<i64>,
    pub customer: Option<i64>,
    pub project: Option<i64>,
    pub activity: Option<i64>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    pub active: Option<bool>,
    pub exported: Option<bool>,
    pub begin: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub format: Format,
}

impl ListTimesheetsInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_page_and_size(self.page, self.size)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetTimesheetInput {
    pub id: i64,
    #[serde(default)]
    pub format: Format,
}

impl GetTimesheetInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartTimesheetInput {
    pub project: i64,
    pub activity: i64,
    pub description: Option<String>,
    pub tags: Option<String>,
}

impl StartTimesheetInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("project", self.project)?;
        require_positive("activity", self.activity)?;
        require_max_length("description", &self.description, MAX_DESCRIPTION_LENGTH)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StopTimesheetInput {
    pub id: i64,
}

impl StopTimesheetInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTimesheetInput {
    pub project: i64,
    pub activity: i64,
    pub begin: String,
    pub end: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

impl CreateTimesheetInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("project", self.project)?;
        require_positive("activity", self.activity)?;
        require_max_length("description", &self.description, MAX_DESCRIPTION_LENGTH)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTimesheetInput {
    pub id: i64,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

impl UpdateTimesheetInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)?;
        require_max_length("description", &self.description, MAX_DESCRIPTION_LENGTH)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteTimesheetInput {
    pub id: i64,
}

impl DeleteTimesheetInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)
    }
}

// ---------------------------------------------------------------------------
// Project inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListProjectsInput {
    pub customer: Option<i64>,
    pub visible: Option<bool>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    #[serde(default)]
    pub format: Format,
}

impl ListProjectsInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_page_and_size(self.page, self.size)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetProjectInput {
    pub id: i64,
    #[serde(default)]
    pub format: Format,
}

impl GetProjectInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectInput {
    pub name: String,
    pub customer: i64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub billable: bool,
    pub color: Option<String>,
}

impl CreateProjectInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name("name", &self.name)?;
        require_positive("customer", self.customer)?;
        require_color(&self.color)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProjectInput {
    pub id: i64,
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub billable: Option<bool>,
    pub color: Option<String>,
}

impl UpdateProjectInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)?;
        if let Some(name) = &self.name {
            require_name("name", name)?;
        }
        require_color(&self.color)
    }
}

// ---------------------------------------------------------------------------
// Activity inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListActivitiesInput {
    pub project: Option<i64>,
    pub visible: Option<bool>,
    pub term: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    #[serde(default)]
    pub format: Format,
}

impl ListActivitiesInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_page_and_size(self.page, self.size)?;
        require_max_length("term", &self.term, MAX_TERM_LENGTH)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetActivityInput {
    pub id: i64,
    #[serde(default)]
    pub format: Format,
}

impl GetActivityInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateActivityInput {
    pub name: String,
    pub project: Option<i64>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub billable: bool,
    pub color: Option<String>,
}

impl CreateActivityInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name("name", &self.name)?;
        if let Some(project) = self.project {
            require_positive("project", project)?;
        }
        require_color(&self.color)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateActivityInput {
    pub id: i64,
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub billable: Option<bool>,
    pub color: Option<String>,
}

impl UpdateActivityInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)?;
        if let Some(name) = &self.name {
            require_name("name", name)?;
        }
        require_color(&self.color)
    }
}

// ---------------------------------------------------------------------------
// Customer inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListCustomersInput {
    pub visible: Option<bool>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    #[serde(default)]
    pub format: Format,
}

impl ListCustomersInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_page_and_size(self.page, self.size)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetCustomerInput {
    pub id: i64,
    #[serde(default)]
    pub format: Format,
}

impl GetCustomerInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomerInput {
    pub name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub billable: bool,
    pub color: Option<String>,
}

impl CreateCustomerInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name("name", &self.name)?;
        require_currency(&self.currency)?;
        require_color(&self.color)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCustomerInput {
    pub id: i64,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub visible: Option<bool>,
    pub billable: Option<bool>,
    pub color: Option<String>,
}

impl UpdateCustomerInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("id", self.id)?;
        if let Some(name) = &self.name {
            require_name("name", name)?;
        }
        if let Some(currency) = &self.currency {
            require_currency(currency)?;
        }
        require_color(&self.color)
    }
}

// ---------------------------------------------------------------------------
// Reporting input
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetTimesheetSummaryInput {
    pub user: Option<i64>,
    pub customer: Option<i64>,
    pub project: Option<i64>,
    pub activity: Option<i64>,
    pub begin: Option<String>,
    pub end: Option<String>,
    #[serde(default = "default_markdown")]
    pub format: Format,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

fn id_property(description: &str) -> Value {
    json!({"type": "integer", "minimum": 1, "description": description})
}

fn page_properties() -> Value {
    json!({
        "page": {"type": "integer", "minimum": 1, "default": 1,
                 "description": "Page number for pagination (1-based)."},
        "size": {"type": "integer", "minimum": 1, "maximum": MAX_PAGE_SIZE,
                 "default": DEFAULT_PAGE_SIZE,
                 "description": "Number of results per page."},
    })
}

fn format_property(default: &str) -> Value {
    json!({
        "type": "string",
        "enum": ["json", "markdown"],
        "default": default,
        "description": "Response format: 'json' for structured data or 'markdown' for human-readable text.",
    })
}

fn color_property() -> Value {
    json!({
        "type": "string",
        "pattern": "^#[0-9a-fA-F]{6}$",
        "description": "Hex color code. Example: '#008000'.",
    })
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

/// Merges the shared pagination properties into a tool's property set.
fn merge(base: Value, extra: Value) -> Value {
    let mut map = match base {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    if let Value::Object(extra) = extra {
        map.extend(extra);
    }
    Value::Object(map)
}

/// The `tools/list` catalog: every tool with its JSON schema.
pub fn tool_catalog() -> Value {
    json!([
        {
            "name": "list_timesheets",
            "description": "List timesheet entries with optional filtering by user, customer, project, activity, date range, running state and export status. Supports pagination.",
            "inputSchema": object_schema(merge(json!({
                "user": {"type": "integer", "description": "Filter by user ID."},
                "customer": {"type": "integer", "description": "Filter by customer ID."},
                "project": {"type": "integer", "description": "Filter by project ID."},
                "activity": {"type": "integer", "description": "Filter by activity ID."},
                "active": {"type": "boolean", "description": "Filter for active (running) timesheets only."},
                "exported": {"type": "boolean", "description": "Filter by export status."},
                "begin": {"type": "string", "description": "Filter entries starting from this datetime (ISO 8601)."},
                "end": {"type": "string", "description": "Filter entries until this datetime (ISO 8601)."},
                "format": format_property("json"),
            }), page_properties()), &[]),
        },
        {
            "name": "get_timesheet",
            "description": "Get detailed information about a specific timesheet entry, including metadata, rates and tags.",
            "inputSchema": object_schema(json!({
                "id": id_property("Timesheet ID."),
                "format": format_property("json"),
            }), &["id"]),
        },
        {
            "name": "start_timesheet",
            "description": "Start tracking time for a project and activity. Creates a running timesheet beginning now; stop it later with stop_timesheet.",
            "inputSchema": object_schema(json!({
                "project": id_property("Project ID to track time for."),
                "activity": id_property("Activity ID to track."),
                "description": {"type": "string", "maxLength": 1000, "description": "Optional description of the work."},
                "tags": {"type": "string", "description": "Comma-separated tags."},
            }), &["project", "activity"]),
        },
        {
            "name": "stop_timesheet",
            "description": "Stop a currently running timesheet entry. The timesheet must not already have an end time.",
            "inputSchema": object_schema(json!({
                "id": id_property("Timesheet ID to stop."),
            }), &["id"]),
        },
        {
            "name": "create_timesheet",
            "description": "Create a complete timesheet entry with explicit start and end times. Omit the end time to create a running entry.",
            "inputSchema": object_schema(json!({
                "project": id_property("Project ID."),
                "activity": id_property("Activity ID."),
                "begin": {"type": "string", "description": "Start datetime in ISO 8601 format."},
                "end": {"type": "string", "description": "End datetime in ISO 8601 format. Omit for a running entry."},
                "description": {"type": "string", "maxLength": 1000, "description": "Work description."},
                "tags": {"type": "string", "description": "Comma-separated tags."},
            }), &["project", "activity", "begin"]),
        },
        {
            "name": "update_timesheet",
            "description": "Update an existing timesheet entry. Only the provided fields change.",
            "inputSchema": object_schema(json!({
                "id": id_property("Timesheet ID to update."),
                "begin": {"type": "string", "description": "New start datetime (ISO 8601)."},
                "end": {"type": "string", "description": "New end datetime (ISO 8601)."},
                "description": {"type": "string", "maxLength": 1000, "description": "Updated description."},
                "tags": {"type": "string", "description": "Updated tags (comma-separated)."},
            }), &["id"]),
        },
        {
            "name": "delete_timesheet",
            "description": "Delete a timesheet entry permanently. This action cannot be undone.",
            "inputSchema": object_schema(json!({
                "id": id_property("Timesheet ID to delete."),
            }), &["id"]),
        },
        {
            "name": "list_projects",
            "description": "List projects with optional filtering by customer and visibility. Use it to discover project IDs for timesheet operations.",
            "inputSchema": object_schema(merge(json!({
                "customer": {"type": "integer", "description": "Filter by customer ID."},
                "visible": {"type": "boolean", "description": "Filter by visibility status."},
                "format": format_property("json"),
            }), page_properties()), &[]),
        },
        {
            "name": "get_project",
            "description": "Get detailed information about a specific project.",
            "inputSchema": object_schema(json!({
                "id": id_property("Project ID."),
                "format": format_property("json"),
            }), &["id"]),
        },
        {
            "name": "create_project",
            "description": "Create a new project under a customer. The project becomes available immediately for timesheet entries.",
            "inputSchema": object_schema(json!({
                "name": {"type": "string", "minLength": 1, "maxLength": 150, "description": "Project name."},
                "customer": id_property("Customer ID."),
                "visible": {"type": "boolean", "default": true, "description": "Whether the project is visible."},
                "billable": {"type": "boolean", "default": true, "description": "Whether the project is billable."},
                "color": color_property(),
            }), &["name", "customer"]),
        },
        {
            "name": "update_project",
            "description": "Update an existing project's name, visibility, billable status or color. Only the provided fields change.",
            "inputSchema": object_schema(json!({
                "id": id_property("Project ID to update."),
                "name": {"type": "string", "minLength": 1, "maxLength": 150, "description": "Updated project name."},
                "visible": {"type": "boolean", "description": "Updated visibility status."},
                "billable": {"type": "boolean", "description": "Updated billable status."},
                "color": color_property(),
            }), &["id"]),
        },
        {
            "name": "list_activities",
            "description": "List activities with optional filtering by project, visibility and search term. Activities without a project are global.",
            "inputSchema": object_schema(merge(json!({
                "project": {"type": "integer", "description": "Filter by project ID."},
                "visible": {"type": "boolean", "description": "Filter by visibility."},
                "term": {"type": "string", "maxLength": 200, "description": "Search term to filter activities by name."},
                "format": format_property("json"),
            }), page_properties()), &[]),
        },
        {
            "name": "get_activity",
            "description": "Get detailed information about a specific activity.",
            "inputSchema": object_schema(json!({
                "id": id_property("Activity ID."),
                "format": format_property("json"),
            }), &["id"]),
        },
        {
            "name": "create_activity",
            "description": "Create a new activity, either bound to one project or global (available for all projects) when the project is omitted.",
            "inputSchema": object_schema(json!({
                "name": {"type": "string", "minLength": 1, "maxLength": 150, "description": "Activity name."},
                "project": {"type": "integer", "minimum": 1, "description": "Project ID (omit for a global activity)."},
                "visible": {"type": "boolean", "default": true, "description": "Whether the activity is visible."},
                "billable": {"type": "boolean", "default": true, "description": "Whether the activity is billable."},
                "color": color_property(),
            }), &["name"]),
        },
        {
            "name": "update_activity",
            "description": "Update an existing activity's name, visibility, billable status or color. Only the provided fields change.",
            "inputSchema": object_schema(json!({
                "id": id_property("Activity ID to update."),
                "name": {"type": "string", "minLength": 1, "maxLength": 150, "description": "Updated activity name."},
                "visible": {"type": "boolean", "description": "Updated visibility status."},
                "billable": {"type": "boolean", "description": "Updated billable status."},
                "color": color_property(),
            }), &["id"]),
        },
        {
            "name": "list_customers",
            "description": "List customers with optional visibility filtering. Use it to find customer IDs for project creation.",
            "inputSchema": object_schema(merge(json!({
                "visible": {"type": "boolean", "description": "Filter by visibility."},
                "format": format_property("json"),
            }), page_properties()), &[]),
        },
        {
            "name": "get_customer",
            "description": "Get detailed information about a specific customer.",
            "inputSchema": object_schema(json!({
                "id": id_property("Customer ID."),
                "format": format_property("json"),
            }), &["id"]),
        },
        {
            "name": "create_customer",
            "description": "Create a new customer with billing configuration. The customer becomes immediately available for project creation.",
            "inputSchema": object_schema(json!({
                "name": {"type": "string", "minLength": 1, "maxLength": 150, "description": "Customer name."},
                "currency": {"type": "string", "minLength": 3, "maxLength": 3, "default": "USD", "description": "3-letter currency code."},
                "visible": {"type": "boolean", "default": true, "description": "Whether the customer is visible."},
                "billable": {"type": "boolean", "default": true, "description": "Whether the customer is billable."},
                "color": color_property(),
            }), &["name"]),
        },
        {
            "name": "update_customer",
            "description": "Update an existing customer's name, currency, visibility, billable status or color. Only the provided fields change.",
            "inputSchema": object_schema(json!({
                "id": id_property("Customer ID to update."),
                "name": {"type": "string", "minLength": 1, "maxLength": 150, "description": "Updated customer name."},
                "currency": {"type": "string", "minLength": 3, "maxLength": 3, "description": "Updated currency code."},
                "visible": {"type": "boolean", "description": "Updated visibility status."},
                "billable": {"type": "boolean", "description": "Updated billable status."},
                "color": color_property(),
            }), &["id"]),
        },
        {
            "name": "get_timesheet_summary",
            "description": "Generate a summary report of timesheet data: total, billable and non-billable hours plus a breakdown by project and activity. Filters match list_timesheets.",
            "inputSchema": object_schema(json!({
                "user": {"type": "integer", "description": "Filter by user ID."},
                "customer": {"type": "integer", "description": "Filter by customer ID."},
                "project": {"type": "integer", "description": "Filter by project ID."},
                "activity": {"type": "integer", "description": "Filter by activity ID."},
                "begin": {"type": "string", "description": "Start date for the report (ISO 8601)."},
                "end": {"type": "string", "description": "End date for the report (ISO 8601)."},
                "format": format_property("markdown"),
            }), &[]),
        },
    ])
}
