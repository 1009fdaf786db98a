//! One-shot flash messages
//!
//! Buffers categorized user-facing messages either locally (instance scope)
//! or inside the session store, each retrievable exactly once by key or in
//! bulk. The session-backed half survives into later requests.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::session::Session;
use crate::store::SessionStore;

/// Flash message categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlashCategory {
    Info,
    Success,
    Warning,
    Error,
}

impl FlashCategory {
    /// All categories, in display order.
    pub const ALL: [FlashCategory; 4] = [
        FlashCategory::Info,
        FlashCategory::Success,
        FlashCategory::Warning,
        FlashCategory::Error,
    ];

    /// Well-known session key for the category's session-backed messages.
    ///
    /// Applications must not store unrelated values under these keys.
    #[must_use]
    pub fn session_key(self) -> &'static str {
        match self {
            FlashCategory::Info => "flash_infos",
            FlashCategory::Success => "flash_successes",
            FlashCategory::Warning => "flash_warnings",
            FlashCategory::Error => "flash_errors",
        }
    }
}

impl fmt::Display for FlashCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlashCategory::Info => "info",
            FlashCategory::Success => "success",
            FlashCategory::Warning => "warning",
            FlashCategory::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// One category's message collection.
///
/// Keyed messages live in an unordered map; keyless messages form an
/// ordered sequence. Used for both the local and the session-backed halves
/// and as the [`retrieve_all`](FlashMessages::retrieve_all) result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashBag {
    #[serde(default)]
    keyed: HashMap<String, String>,
    #[serde(default)]
    sequence: Vec<String>,
}

impl FlashBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a keyed message for a non-empty key, overwriting any earlier
    /// message under the same key; append to the keyless sequence otherwise.
    pub fn set(&mut self, key: &str, message: impl Into<String>) {
        if key.is_empty() {
            self.sequence.push(message.into());
        } else {
            self.keyed.insert(key.to_string(), message.into());
        }
    }

    /// Remove and return a keyed message. Keyless entries are unreachable
    /// by key.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.keyed.remove(key)
    }

    /// Layer `other` onto this bag: keyed collisions resolve to `other`'s
    /// message, keyless entries append after the existing sequence.
    pub fn merge(&mut self, other: FlashBag) {
        self.keyed.extend(other.keyed);
        self.sequence.extend(other.sequence);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keyed.get(key).map(String::as_str)
    }

    /// Keyless messages in append order.
    #[must_use]
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keyed.len() + self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyed.is_empty() && self.sequence.is_empty()
    }

    /// Every message in the bag, keyed entries first.
    pub fn messages(&self) -> impl Iterator<Item = &str> + '_ {
        self.keyed
            .values()
            .map(String::as_str)
            .chain(self.sequence.iter().map(String::as_str))
    }
}

/// Short-lived, categorized user-facing messages.
///
/// Messages are buffered either locally (instance scope) or inside the
/// session store under the category's well-known key, and every message is
/// retrievable exactly once. Construction reads nothing; each
/// session-backed access goes through a freshly constructed [`Session`]
/// with the default timer configuration.
pub struct FlashMessages {
    session_store: Arc<dyn SessionStore>,
    infos: FlashBag,
    successes: FlashBag,
    warnings: FlashBag,
    errors: FlashBag,
}

impl FlashMessages {
    #[must_use]
    pub fn new(session_store: Arc<dyn SessionStore>) -> Self {
        Self {
            session_store,
            infos: FlashBag::new(),
            successes: FlashBag::new(),
            warnings: FlashBag::new(),
            errors: FlashBag::new(),
        }
    }

    /// Buffer a message locally.
    ///
    /// A non-empty key sets (overwriting an earlier message under the same
    /// key); an empty key appends to the keyless sequence, retrievable only
    /// through [`retrieve_all`](FlashMessages::retrieve_all).
    pub fn store(&mut self, category: FlashCategory, key: &str, message: impl Into<String>) {
        self.local_bag_mut(category).set(key, message);
    }

    /// Buffer a message inside the session store, following the same
    /// keyed-set-or-append rule as [`store`](FlashMessages::store).
    pub async fn store_in_session(
        &self,
        category: FlashCategory,
        key: &str,
        message: impl Into<String>,
    ) -> Result<()> {
        let session = self.session();
        let mut bag = read_session_bag(&session, category).await?;
        bag.set(key, message);
        session.write(category.session_key(), &bag).await
    }

    /// Remove and return the message stored under `key`, if any.
    ///
    /// A local hit wins and leaves any session-backed copy untouched;
    /// otherwise the session-backed bag is consulted and written back
    /// without the returned entry, preserving its other keys. Keyless
    /// messages are never matched.
    pub async fn retrieve_one(
        &mut self,
        category: FlashCategory,
        key: &str,
    ) -> Result<Option<String>> {
        if let Some(message) = self.local_bag_mut(category).remove(key) {
            return Ok(Some(message));
        }

        let session = self.session();
        let mut bag = read_session_bag(&session, category).await?;
        match bag.remove(key) {
            Some(message) => {
                session.write(category.session_key(), &bag).await?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    /// Drain every message of the category from both halves.
    ///
    /// The local bag is cleared and the well-known session key deleted
    /// regardless of content; the two halves merge with session-backed
    /// entries layered on top, so they win keyed collisions and their
    /// keyless entries follow the local ones. An empty merge reads as
    /// `None`.
    pub async fn retrieve_all(&mut self, category: FlashCategory) -> Result<Option<FlashBag>> {
        let mut merged = std::mem::take(self.local_bag_mut(category));

        let session = self.session();
        let session_bag = read_session_bag(&session, category).await?;
        session.remove(category.session_key()).await?;
        merged.merge(session_bag);

        if merged.is_empty() {
            Ok(None)
        } else {
            Ok(Some(merged))
        }
    }

    fn session(&self) -> Session {
        Session::new(Arc::clone(&self.session_store))
    }

    fn local_bag_mut(&mut self, category: FlashCategory) -> &mut FlashBag {
        match category {
            FlashCategory::Info => &mut self.infos,
            FlashCategory::Success => &mut self.successes,
            FlashCategory::Warning => &mut self.warnings,
            FlashCategory::Error => &mut self.errors,
        }
    }
}

/// Read a category's session-backed bag. Absent or undecodable payloads
/// read as an empty bag, never as an error.
async fn read_session_bag(session: &Session, category: FlashCategory) -> Result<FlashBag> {
    match session.read(category.session_key()).await? {
        Some(value) => Ok(serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(category = %category, error = %err, "Undecodable flash payload, treating as empty");
            FlashBag::new()
        })),
        None => Ok(FlashBag::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_session_keys_are_well_known() {
        assert_eq!(FlashCategory::Info.session_key(), "flash_infos");
        assert_eq!(FlashCategory::Success.session_key(), "flash_successes");
        assert_eq!(FlashCategory::Warning.session_key(), "flash_warnings");
        assert_eq!(FlashCategory::Error.session_key(), "flash_errors");
    }

    #[test]
    fn test_category_display() {
        let rendered: Vec<String> = FlashCategory::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["info", "success", "warning", "error"]);
    }

    #[test]
    fn test_bag_keyed_set_overwrites() {
        let mut bag = FlashBag::new();
        bag.set("greeting", "hello");
        bag.set("greeting", "hello again");

        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("greeting"), Some("hello again"));
    }

    #[test]
    fn test_bag_empty_key_appends_independent_entries() {
        let mut bag = FlashBag::new();
        bag.set("", "first");
        bag.set("", "second");

        assert_eq!(bag.len(), 2);
        assert_eq!(bag.sequence(), ["first", "second"]);
        assert_eq!(bag.remove(""), None);
    }

    #[test]
    fn test_bag_merge_prefers_other_on_collision() {
        let mut local = FlashBag::new();
        local.set("shared", "local");
        local.set("", "local_seq");

        let mut session = FlashBag::new();
        session.set("shared", "session");
        session.set("", "session_seq");

        local.merge(session);
        assert_eq!(local.get("shared"), Some("session"));
        assert_eq!(local.sequence(), ["local_seq", "session_seq"]);
        assert_eq!(local.len(), 3);
        assert_eq!(local.messages().count(), 3);
    }

    #[test]
    fn test_bag_decodes_partial_payload() {
        let bag: FlashBag = serde_json::from_value(json!({
            "keyed": { "k": "message" }
        }))
        .unwrap();

        assert_eq!(bag.get("k"), Some("message"));
        assert!(bag.sequence().is_empty());
    }
}
