//! Static tool catalog: display metadata and auth requirements, grouped by provider.
//!
//! The catalog is read-only and built once at startup. It is used for the
//! settings surface and for cross-referencing the enabled-map; execution
//! lives in the tool registry.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// How a tool authenticates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    ApiKey,
    Oauth,
    Custom,
}

/// Input kind of a credential field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Password,
    /// Masked unless explicitly revealed.
    Secret,
}

/// A named credential field collected for a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AuthField {
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    #[serde(rename = "type")]
    pub auth_type: AuthType,
    pub fields: Vec<AuthField>,
}

impl AuthConfig {
    pub fn field(&self, key: &str) -> Option<&AuthField> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Display metadata for one tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_config: Option<AuthConfig>,
}

impl ToolDescriptor {
    /// A tool that needs no credentials, disabled by default.
    pub fn open(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            enabled: false,
            requires_auth: Some(false),
            auth_config: None,
        }
    }

    /// A tool that collects credentials through `auth_config`.
    pub fn with_auth(mut self, auth_config: AuthConfig) -> Self {
        self.requires_auth = Some(true);
        self.auth_config = Some(auth_config);
        self
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth.unwrap_or(false)
    }
}

/// A group of related tools sharing a credential scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolProvider {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Duplicate tool id in catalog: {0}")]
    DuplicateToolId(String),

    #[error("Tool '{0}' requires auth but has no auth config")]
    MissingAuthConfig(String),
}

/// The full, immutable set of providers.
#[derive(Debug, Clone)]
pub struct Catalog {
    providers: Vec<ToolProvider>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate tool ids and auth tools without fields.
    pub fn new(providers: Vec<ToolProvider>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for tool in providers.iter().flat_map(|p| p.tools.iter()) {
            if !seen.insert(tool.id.as_str()) {
                return Err(CatalogError::DuplicateToolId(tool.id.clone()));
            }
            if tool.requires_auth() && tool.auth_config.is_none() {
                return Err(CatalogError::MissingAuthConfig(tool.id.clone()));
            }
        }
        Ok(Self { providers })
    }

    /// The catalog shipped with the server, checked like any other.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(vec![apple_provider()])
    }

    pub fn providers(&self) -> &[ToolProvider] {
        &self.providers
    }

    /// All tools in provider order.
    pub fn tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.providers.iter().flat_map(|p| p.tools.iter())
    }

    pub fn find_tool(&self, id: &str) -> Option<&ToolDescriptor> {
        self.tools().find(|t| t.id == id)
    }
}

fn apple_provider() -> ToolProvider {
    ToolProvider {
        id: "apple-mcp".to_string(),
        name: "Apple MCP Tools".to_string(),
        description: "Collection of Apple-native tools for messaging, notes, calendar, and more"
            .to_string(),
        icon: Some("🍎".to_string()),
        tools: vec![
            ToolDescriptor::open(
                "apple-messages",
                "Messages",
                "Send and read messages using Apple Messages app",
            ),
            ToolDescriptor::open(
                "apple-notes",
                "Notes",
                "List, search, read, and create notes in Apple Notes app",
            ),
            ToolDescriptor::open(
                "apple-contacts",
                "Contacts",
                "Search contacts for sending messages",
            ),
            ToolDescriptor::open(
                "apple-emails",
                "Emails",
                "Send, search, and schedule emails with attachments",
            ),
            ToolDescriptor::open(
                "apple-reminders",
                "Reminders",
                "List, search, and create reminders with due dates",
            ),
            ToolDescriptor::open(
                "apple-calendar",
                "Calendar",
                "Search, list, and create calendar events",
            ),
            ToolDescriptor::open(
                "apple-web-search",
                "Web Search",
                "Search the web using DuckDuckGo",
            ),
            ToolDescriptor::open(
                "apple-maps",
                "Maps",
                "Search locations, get directions, and manage guides",
            ),
        ],
    }
}
