//! Catalog id → registry key table.
//!
//! Catalog ids (`apple-messages`) and registry keys (`sendMessage`) are two
//! separate namespaces. The table joining them is checked once at startup so
//! a mismatch fails loudly instead of silently dropping a tool per request.

use std::collections::HashSet;

use super::apple::AppleTool;
use super::catalog::Catalog;
use super::ToolRegistry;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("Catalog tool '{0}' has no registry binding")]
    Unbound(String),

    #[error("Binding for '{0}' does not match any catalog tool")]
    UnknownCatalogId(String),

    #[error("Binding '{id}' points at unregistered tool '{key}'")]
    UnregisteredKey { id: String, key: String },

    #[error("Catalog id '{0}' is bound more than once")]
    DuplicateBinding(String),
}

/// Result of resolving a list of enabled catalog ids.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Registry keys to offer, in request order without duplicates.
    pub keys: Vec<String>,
    /// Requested ids with no binding.
    pub unknown: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ToolBindings {
    entries: Vec<(String, String)>,
}

impl ToolBindings {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Bindings for the built-in Apple provider.
    pub fn builtin() -> Self {
        Self::new([
            ("apple-messages", AppleTool::SendMessage),
            ("apple-notes", AppleTool::Notes),
            ("apple-contacts", AppleTool::Contacts),
            ("apple-emails", AppleTool::Email),
            ("apple-reminders", AppleTool::Reminders),
            ("apple-calendar", AppleTool::Calendar),
            ("apple-web-search", AppleTool::WebSearch),
            ("apple-maps", AppleTool::Maps),
        ]
        .into_iter()
        .map(|(id, tool)| (id.to_string(), tool.key().to_string())))
    }

    pub fn key_for(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(bound, _)| bound == id)
            .map(|(_, key)| key.as_str())
    }

    /// Check that every catalog tool is bound exactly once to a registered tool.
    pub fn validate(&self, catalog: &Catalog, registry: &ToolRegistry) -> Result<(), BindingError> {
        let mut seen = HashSet::new();
        for (id, key) in &self.entries {
            if !seen.insert(id.as_str()) {
                return Err(BindingError::DuplicateBinding(id.clone()));
            }
            if catalog.find_tool(id).is_none() {
                return Err(BindingError::UnknownCatalogId(id.clone()));
            }
            if !registry.contains(key) {
                return Err(BindingError::UnregisteredKey {
                    id: id.clone(),
                    key: key.clone(),
                });
            }
        }

        if let Some(tool) = catalog.tools().find(|t| !seen.contains(t.id.as_str())) {
            return Err(BindingError::Unbound(tool.id.clone()));
        }

        Ok(())
    }

    /// Map enabled catalog ids to registry keys.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Resolution {
        let mut resolution = Resolution::default();
        for id in ids.iter().map(AsRef::as_ref) {
            match self.key_for(id) {
                Some(key) => {
                    if !resolution.keys.iter().any(|k| k == key) {
                        resolution.keys.push(key.to_string());
                    }
                }
                None => resolution.unknown.push(id.to_string()),
            }
        }
        resolution
    }
}

impl Default for ToolBindings {
    fn default() -> Self {
        Self::builtin()
    }
}
