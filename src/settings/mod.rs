//! Tool settings storage.
//!
//! Holds the enabled-map (tool id → bool) and the credentials list
//! (one record per tool id) on top of a pluggable [`StorageBackend`].
//! Both blobs are read once at load time and rewritten in full on every
//! mutation. A mutation reaches the in-memory view only after the backend
//! accepted it, so the view always matches what a restart would load.
//! Persistence failures are logged here and reported as a `false` return.

mod storage;

pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::tools::catalog::{Catalog, ToolDescriptor};

/// Storage key of the enabled-map blob.
pub const ENABLED_TOOLS_KEY: &str = "mcp-tools-config";
/// Storage key of the credentials list blob.
pub const CREDENTIALS_KEY: &str = "mcp-tools-credentials";

/// Tool id → enabled flag.
pub type EnabledToolsMap = BTreeMap<String, bool>;

/// Stored credentials for one tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCredentials {
    pub tool_id: String,
    pub credentials: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct SettingsState {
    enabled: EnabledToolsMap,
    credentials: Vec<ToolCredentials>,
}

/// Enabled-map and credentials store over an injected backend.
pub struct SettingsStore {
    state: RwLock<SettingsState>,
    backend: Arc<dyn StorageBackend>,
    catalog: Arc<Catalog>,
}

impl SettingsStore {
    /// Create an empty store. Call [`SettingsStore::load`] to read persisted state.
    pub fn new(backend: Arc<dyn StorageBackend>, catalog: Arc<Catalog>) -> Self {
        Self {
            state: RwLock::new(SettingsState::default()),
            backend,
            catalog,
        }
    }

    /// Create a store and load persisted state from the backend.
    pub async fn open(backend: Arc<dyn StorageBackend>, catalog: Arc<Catalog>) -> Self {
        let store = Self::new(backend, catalog);
        store.load().await;
        store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Read both blobs. A failure on one leaves only that piece at its empty default.
    pub async fn load(&self) {
        let enabled = self
            .read_blob::<EnabledToolsMap>(ENABLED_TOOLS_KEY)
            .unwrap_or_default();
        let credentials = self
            .read_blob::<Vec<ToolCredentials>>(CREDENTIALS_KEY)
            .unwrap_or_default();

        tracing::info!(
            enabled = enabled.values().filter(|v| **v).count(),
            credentials = credentials.len(),
            "Loaded tool settings"
        );

        let mut state = self.state.write().await;
        state.enabled = enabled;
        state.credentials = credentials;
    }

    fn read_blob<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read settings blob, using defaults");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to parse settings blob, using defaults");
                None
            }
        }
    }

    /// Persist `value` under `key`, logging any failure.
    fn write_blob<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|json| self.backend.set(key, &json));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to persist settings blob");
                false
            }
        }
    }

    /// Snapshot of the enabled-map.
    pub async fn enabled_tools(&self) -> EnabledToolsMap {
        self.state.read().await.enabled.clone()
    }

    pub async fn is_enabled(&self, tool_id: &str) -> bool {
        self.state
            .read()
            .await
            .enabled
            .get(tool_id)
            .copied()
            .unwrap_or(false)
    }

    /// Flip the flag for `tool_id` (absent counts as disabled) and persist the map.
    ///
    /// Returns the effective state: unchanged if the map could not be persisted.
    pub async fn toggle_tool(&self, tool_id: &str) -> bool {
        let mut state = self.state.write().await;
        let current = state.enabled.get(tool_id).copied().unwrap_or(false);

        let mut enabled = state.enabled.clone();
        enabled.insert(tool_id.to_string(), !current);
        if !self.write_blob(ENABLED_TOOLS_KEY, &enabled) {
            return current;
        }
        state.enabled = enabled;

        tracing::debug!(tool_id, enabled = !current, "Toggled tool");
        !current
    }

    /// Replace the credentials record for `tool_id`.
    ///
    /// Returns `false`, leaving the stored record untouched, if the list could not be persisted.
    pub async fn save_credentials(&self, tool_id: &str, credentials: HashMap<String, String>) -> bool {
        let mut state = self.state.write().await;
        let mut records: Vec<ToolCredentials> = state
            .credentials
            .iter()
            .filter(|c| c.tool_id != tool_id)
            .cloned()
            .collect();
        records.push(ToolCredentials {
            tool_id: tool_id.to_string(),
            credentials,
        });

        if !self.write_blob(CREDENTIALS_KEY, &records) {
            return false;
        }
        state.credentials = records;
        true
    }

    /// Stored fields for `tool_id`, or an empty map.
    pub async fn get_credentials(&self, tool_id: &str) -> HashMap<String, String> {
        self.state
            .read()
            .await
            .credentials
            .iter()
            .find(|c| c.tool_id == tool_id)
            .map(|c| c.credentials.clone())
            .unwrap_or_default()
    }

    pub async fn has_credentials(&self, tool_id: &str) -> bool {
        self.state
            .read()
            .await
            .credentials
            .iter()
            .any(|c| c.tool_id == tool_id)
    }

    /// Snapshot of every credentials record.
    pub async fn credentials(&self) -> Vec<ToolCredentials> {
        self.state.read().await.credentials.clone()
    }

    /// Erase the persisted credentials blob, then the in-memory list.
    ///
    /// Returns `false`, keeping every record, if the blob could not be removed.
    pub async fn clear_all_credentials(&self) -> bool {
        let mut state = self.state.write().await;
        if let Err(e) = self.backend.remove(CREDENTIALS_KEY) {
            tracing::error!(error = %e, "Failed to clear stored credentials");
            return false;
        }
        state.credentials.clear();
        true
    }

    /// Catalog tools whose id is enabled, in catalog order, marked `enabled: true`.
    pub async fn list_enabled_tool_configs(&self) -> Vec<ToolDescriptor> {
        let state = self.state.read().await;
        self.catalog
            .tools()
            .filter(|tool| state.enabled.get(&tool.id).copied().unwrap_or(false))
            .map(|tool| ToolDescriptor {
                enabled: true,
                ..tool.clone()
            })
            .collect()
    }
}

/// Shared settings store wrapped in Arc for concurrent access.
pub type SharedSettingsStore = Arc<SettingsStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn memory_store() -> (Arc<MemoryStorage>, SettingsStore) {
        let backend = Arc::new(MemoryStorage::new());
        let store = SettingsStore::new(backend.clone(), Arc::new(Catalog::builtin().unwrap()));
        (backend, store)
    }

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_double_toggle_restores_map() {
        let (_, store) = memory_store();
        store.toggle_tool("apple-notes").await;
        let before = store.enabled_tools().await;

        assert!(store.toggle_tool("apple-maps").await);
        assert!(!store.toggle_tool("apple-maps").await);

        let after = store.enabled_tools().await;
        assert_eq!(after.get("apple-notes"), before.get("apple-notes"));
        assert_eq!(after.get("apple-maps"), Some(&false));
        assert!(!store.is_enabled("apple-maps").await);
    }

    #[tokio::test]
    async fn test_save_credentials_replaces_record() {
        let (backend, store) = memory_store();
        store.save_credentials("tool", fields(&[("a", "1")])).await;
        store.save_credentials("tool", fields(&[("b", "2")])).await;

        let all = store.credentials().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].credentials, fields(&[("b", "2")]));
        assert_eq!(store.get_credentials("tool").await, fields(&[("b", "2")]));

        let persisted: Vec<ToolCredentials> =
            serde_json::from_str(&backend.raw(CREDENTIALS_KEY).unwrap()).unwrap();
        assert_eq!(persisted, all);
    }

    #[tokio::test]
    async fn test_get_credentials_missing_is_empty() {
        let (_, store) = memory_store();
        assert!(store.get_credentials("nothing-here").await.is_empty());
        assert!(!store.has_credentials("nothing-here").await);
    }

    #[tokio::test]
    async fn test_list_enabled_tool_configs() {
        let (_, store) = memory_store();
        store.toggle_tool("apple-maps").await;
        store.toggle_tool("apple-messages").await;
        store.toggle_tool("not-in-catalog").await;

        let ids: Vec<String> = store
            .list_enabled_tool_configs()
            .await
            .into_iter()
            .map(|t| {
                assert!(t.enabled);
                t.id
            })
            .collect();
        // Catalog order, unknown ids ignored
        assert_eq!(ids, vec!["apple-messages", "apple-maps"]);

        store.toggle_tool("apple-maps").await;
        let ids: Vec<String> = store
            .list_enabled_tool_configs()
            .await
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["apple-messages"]);
    }

    #[tokio::test]
    async fn test_corrupt_blob_does_not_block_other() {
        let backend = Arc::new(
            MemoryStorage::new()
                .with_entry(ENABLED_TOOLS_KEY, r#"{"apple-notes":true}"#)
                .with_entry(CREDENTIALS_KEY, "{not json"),
        );
        let store = SettingsStore::open(backend, Arc::new(Catalog::builtin().unwrap())).await;

        assert!(store.is_enabled("apple-notes").await);
        assert!(store.credentials().await.is_empty());

        let backend = Arc::new(
            MemoryStorage::new()
                .with_entry(ENABLED_TOOLS_KEY, "[1, 2")
                .with_entry(
                    CREDENTIALS_KEY,
                    r#"[{"toolId":"x","credentials":{"k":"v"}}]"#,
                ),
        );
        let store = SettingsStore::open(backend, Arc::new(Catalog::builtin().unwrap())).await;

        assert!(store.enabled_tools().await.is_empty());
        assert_eq!(store.get_credentials("x").await, fields(&[("k", "v")]));
    }

    #[tokio::test]
    async fn test_failed_writes_leave_state_unchanged() {
        let (backend, store) = memory_store();
        assert!(store.save_credentials("tool", fields(&[("a", "1")])).await);
        backend.fail_writes(true);

        assert!(!store.toggle_tool("apple-notes").await);
        assert!(!store.is_enabled("apple-notes").await);
        assert!(backend.raw(ENABLED_TOOLS_KEY).is_none());

        assert!(!store.save_credentials("tool", fields(&[("b", "2")])).await);
        assert!(!store.save_credentials("other", fields(&[("c", "3")])).await);
        assert_eq!(store.get_credentials("tool").await, fields(&[("a", "1")]));
        assert!(!store.has_credentials("other").await);

        assert!(!store.clear_all_credentials().await);
        assert_eq!(store.credentials().await.len(), 1);
        assert!(backend.raw(CREDENTIALS_KEY).is_some());

        backend.fail_writes(false);
        assert!(store.toggle_tool("apple-notes").await);
        assert!(store.clear_all_credentials().await);
        assert!(store.credentials().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_credentials_removes_blob() {
        let (backend, store) = memory_store();
        store.save_credentials("tool", fields(&[("a", "1")])).await;
        assert!(backend.raw(CREDENTIALS_KEY).is_some());

        store.clear_all_credentials().await;
        assert!(backend.raw(CREDENTIALS_KEY).is_none());
        assert!(store.get_credentials("tool").await.is_empty());
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let temp = tempdir().unwrap();
        let catalog = Arc::new(Catalog::builtin().unwrap());

        let store = SettingsStore::open(
            Arc::new(FileStorage::new(temp.path())),
            Arc::clone(&catalog),
        )
        .await;
        store.toggle_tool("apple-calendar").await;
        store
            .save_credentials("apple-calendar", fields(&[("account", "me")]))
            .await;

        let reopened = SettingsStore::open(Arc::new(FileStorage::new(temp.path())), catalog).await;
        assert!(reopened.is_enabled("apple-calendar").await);
        assert_eq!(
            reopened.get_credentials("apple-calendar").await,
            fields(&[("account", "me")])
        );
    }
}
