//! Session storage collaborators
//!
//! Defines the contract between the session wrapper and the host session
//! engine, plus an in-memory implementation for tests and single-process use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Contract between the session wrapper and the host session engine.
///
/// Implementations own identity token handling, persistence, and the
/// serialization of concurrent writers to one logical session. The wrapper
/// brackets every mapping access between [`open`](SessionStore::open) and
/// [`close`](SessionStore::close).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resume or create the logical session and rotate its identity.
    ///
    /// Identity rotation on every open is part of the contract (session
    /// fixation defense). Idempotent within one logical call.
    async fn open(&self) -> Result<(), StoreError>;

    /// Persist pending changes and release the session for later calls.
    async fn close(&self) -> Result<(), StoreError>;

    /// Tear the session down: clear all stored data, revoke any
    /// client-visible identity token, issue a fresh identity, then terminate
    /// and persist.
    ///
    /// The fresh identity is issued before the final teardown, so an
    /// interrupted teardown never leaves the old token pointing at live
    /// data. Must work without a prior [`open`](SessionStore::open).
    async fn destroy(&self) -> Result<(), StoreError>;

    /// Read a value from the session mapping.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write a value into the session mapping.
    async fn insert(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove a key from the session mapping. Absent keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug)]
struct MemoryState {
    values: HashMap<String, Value>,
    session_id: String,
    open: bool,
    generation: u64,
}

impl MemoryState {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            session_id: generate_session_id(),
            open: false,
            generation: 0,
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::Connection("Session store is not open".to_string()))
        }
    }
}

/// In-memory [`SessionStore`] for tests and single-process use.
///
/// Enforces the open/close bracket: mapping access outside an open session
/// fails with [`StoreError::Connection`]. Clones share the same underlying
/// session.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::new())),
        }
    }

    /// Current session identity.
    pub async fn session_id(&self) -> String {
        self.state.read().await.session_id.clone()
    }

    /// Number of identity rotations performed so far.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Whether an open/close bracket is currently active.
    pub async fn is_open(&self) -> bool {
        self.state.read().await.open
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.state.read().await.values.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.values.is_empty()
    }

    /// Read a stored value without opening the store. Test support.
    pub async fn peek(&self, key: &str) -> Option<Value> {
        self.state.read().await.values.get(key).cloned()
    }

    /// Write a value without opening the store. Test support.
    pub async fn seed(&self, key: &str, value: Value) {
        self.state.write().await.values.insert(key.to_string(), value);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn open(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.session_id = generate_session_id();
        state.generation += 1;
        state.open = true;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.open = false;
        Ok(())
    }

    async fn destroy(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.values.clear();
        state.session_id = generate_session_id();
        state.generation += 1;
        state.open = false;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let state = self.state.read().await;
        state.ensure_open()?;
        Ok(state.values.get(key).cloned())
    }

    async fn insert(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        state.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        state.values.remove(key);
        Ok(())
    }
}

fn generate_session_id() -> String {
    format!("sess_{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_open_rotates_identity() {
        let store = MemoryStore::new();
        let initial_id = store.session_id().await;

        store.open().await.unwrap();
        assert_ne!(store.session_id().await, initial_id);
        assert_eq!(store.generation().await, 1);
        assert!(store.is_open().await);
    }

    #[tokio::test]
    async fn test_mapping_requires_open_bracket() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("key").await,
            Err(StoreError::Connection(_))
        ));

        store.open().await.unwrap();
        store.insert("key", json!("value")).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some(json!("value")));
        store.close().await.unwrap();

        assert!(matches!(
            store.insert("key", json!("other")).await,
            Err(StoreError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_ok() {
        let store = MemoryStore::new();
        store.open().await.unwrap();
        store.remove("missing").await.unwrap();
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_destroy_clears_values_and_rotates() {
        let store = MemoryStore::new();
        store.open().await.unwrap();
        store.insert("key", json!(1)).await.unwrap();
        store.close().await.unwrap();
        let old_id = store.session_id().await;

        store.destroy().await.unwrap();
        assert!(store.is_empty().await);
        assert_ne!(store.session_id().await, old_id);
        assert!(!store.is_open().await);
    }

    #[tokio::test]
    async fn test_seed_and_peek_bypass_bracket() {
        let store = MemoryStore::new();
        store.seed("key", json!(42)).await;
        assert_eq!(store.peek("key").await, Some(json!(42)));
        assert_eq!(store.len().await, 1);
    }
}
