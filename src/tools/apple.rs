//! Apple MCP tools.
//!
//! Real execution needs a native macOS host, which the server does not
//! have. Every variant validates its arguments, logs the call and returns a
//! placeholder result with `success: false`.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Tool, ToolError};

/// One variant per Apple capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppleTool {
    SendMessage,
    Notes,
    Contacts,
    Email,
    Reminders,
    Calendar,
    WebSearch,
    Maps,
}

impl AppleTool {
    pub const ALL: [AppleTool; 8] = [
        AppleTool::SendMessage,
        AppleTool::Notes,
        AppleTool::Contacts,
        AppleTool::Email,
        AppleTool::Reminders,
        AppleTool::Calendar,
        AppleTool::WebSearch,
        AppleTool::Maps,
    ];

    /// Registry key.
    pub fn key(self) -> &'static str {
        match self {
            AppleTool::SendMessage => "sendMessage",
            AppleTool::Notes => "notes",
            AppleTool::Contacts => "contacts",
            AppleTool::Email => "email",
            AppleTool::Reminders => "reminders",
            AppleTool::Calendar => "calendar",
            AppleTool::WebSearch => "webSearch",
            AppleTool::Maps => "maps",
        }
    }

    /// Name of the native MCP tool this variant stands in for.
    pub fn native_name(self) -> &'static str {
        match self {
            AppleTool::SendMessage => "MESSAGE_TOOL",
            AppleTool::Notes => "NOTES_TOOL",
            AppleTool::Contacts => "CONTACTS_TOOL",
            AppleTool::Email => "EMAIL_TOOL",
            AppleTool::Reminders => "REMINDER_TOOL",
            AppleTool::Calendar => "CALENDAR_TOOL",
            AppleTool::WebSearch => "WEB_SEARCH_TOOL",
            AppleTool::Maps => "MAPS_TOOL",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            AppleTool::SendMessage => "Send a message using Apple Messages app",
            AppleTool::Notes => "Search, list, or create notes in Apple Notes app",
            AppleTool::Contacts => "Search contacts in Apple Contacts app",
            AppleTool::Email => "Send, search, or schedule emails",
            AppleTool::Reminders => "List, search, or create reminders",
            AppleTool::Calendar => "Search, list, or create calendar events",
            AppleTool::WebSearch => "Search the web using DuckDuckGo",
            AppleTool::Maps => {
                "Search locations, get directions, and manage guides in Apple Maps"
            }
        }
    }

    fn schema(self) -> Value {
        match self {
            AppleTool::SendMessage => object(
                json!({
                    "recipient": string("The recipient's name or phone number"),
                    "message": string("The message to send"),
                }),
                &["recipient", "message"],
            ),
            AppleTool::Notes => object(
                json!({
                    "operation": operation(&["search", "list", "create"]),
                    "query": string("Search query for notes"),
                    "limit": number("Maximum number of notes to return"),
                    "title": string("Title for the new note"),
                    "body": string("Body content for the new note"),
                    "folder": string("Folder to create the note in"),
                }),
                &["operation"],
            ),
            AppleTool::Contacts => object(
                json!({ "query": string("Search query for contacts") }),
                &["query"],
            ),
            AppleTool::Email => object(
                json!({
                    "operation": operation(&["send", "search", "schedule", "list-scheduled"]),
                    "to": strings("Recipients of the email"),
                    "cc": strings("CC recipients"),
                    "bcc": strings("BCC recipients"),
                    "subject": string("Email subject"),
                    "body": string("Email body"),
                    "attachments": strings("File paths to attach"),
                    "query": string("Search query for emails"),
                    "mailbox": string("Mailbox to search in"),
                    "limit": number("Maximum number of results"),
                    "scheduleDate": string("Date to schedule the email"),
                }),
                &["operation"],
            ),
            AppleTool::Reminders => object(
                json!({
                    "operation": operation(&["list", "search", "create"]),
                    "query": string("Search query for reminders"),
                    "title": string("Title for the new reminder"),
                    "notes": string("Notes for the reminder"),
                    "dueDate": string("Due date for the reminder"),
                }),
                &["operation"],
            ),
            AppleTool::Calendar => object(
                json!({
                    "operation": operation(&["search", "list", "create"]),
                    "query": string("Search query for events"),
                    "startDate": string("Start date for search or event"),
                    "endDate": string("End date for search or event"),
                    "title": string("Title for the new event"),
                    "location": string("Location for the event"),
                    "notes": string("Notes for the event"),
                }),
                &["operation"],
            ),
            AppleTool::WebSearch => object(
                json!({
                    "query": string("Search query"),
                    "maxResults": number("Maximum number of results"),
                }),
                &["query"],
            ),
            AppleTool::Maps => object(
                json!({
                    "operation": operation(&[
                        "search",
                        "directions",
                        "save-favorite",
                        "drop-pin",
                        "create-guide",
                        "list-guides",
                        "add-to-guide",
                    ]),
                    "query": string("Location search query"),
                    "from": string("Starting location for directions"),
                    "to": string("Destination for directions"),
                    "transportType": {
                        "type": "string",
                        "enum": ["driving", "walking", "transit"],
                        "description": "Type of transportation"
                    },
                    "location": string("Location to save or pin"),
                    "guideName": string("Name of the guide"),
                    "placeId": string("ID of the place to add to guide"),
                }),
                &["operation"],
            ),
        }
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn strings(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

fn number(description: &str) -> Value {
    json!({ "type": "number", "description": description })
}

fn operation(values: &[&str]) -> Value {
    json!({
        "type": "string",
        "enum": values,
        "description": "The operation to perform"
    })
}

#[async_trait]
impl Tool for AppleTool {
    fn name(&self) -> &str {
        self.key()
    }

    fn description(&self) -> &str {
        self.describe()
    }

    fn parameters_schema(&self) -> Value {
        self.schema()
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        super::validate_arguments(&self.schema(), &args)?;

        tracing::info!(tool = self.native_name(), params = %args, "Apple MCP tool call (not executed)");

        Ok(json!({
            "success": false,
            "message": format!(
                "Apple MCP tool '{}' would be executed with the provided parameters. \
                 Note: Apple MCP tools require a native macOS environment to function.",
                self.native_name()
            ),
            "params": args,
        }))
    }
}
