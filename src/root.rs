//! API root discovery document and its time-bounded cache.

use crate::error::BindError;
use crate::http::{Method, RequestPipeline};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// One discovery entry: either a URL template for an operation or the
/// ordered path-parameter names of a resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RootEntry {
    Template(String),
    Identifiers(Vec<String>),
}

/// The discovery document: logical operation name -> entry. Immutable
/// once fetched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiRoot {
    entries: HashMap<String, RootEntry>,
}

impl ApiRoot {
    pub fn template(&self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(RootEntry::Template(template)) => Some(template.clone()),
            _ => None,
        }
    }

    pub fn identifiers(&self, key: &str) -> Option<Vec<String>> {
        match self.entries.get(key) {
            Some(RootEntry::Identifiers(names)) => Some(names.clone()),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: RootEntry) {
        self.entries.insert(key.into(), entry);
    }
}

/// Session-scoped string store backing the cache. Injected so tests (or a
/// file-backed session) can swap the implementation.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn clear(&self);
}

/// In-memory store; entries live for the process lifetime.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

/// Store key for the serialized document.
pub const ROOT_KEY: &str = "API_ROOT";
/// Store key for the last-fetch timestamp (epoch millis).
pub const TIMESTAMP_KEY: &str = "API_TIMESTAMP";

const MAX_AGE_MS: i64 = 60 * 60 * 1000;

/// Resolves the discovery document: in-memory copy first, then the
/// session store while the last fetch is under an hour old, then an
/// unauthenticated fetch persisted back to the store.
pub struct ApiRootCache {
    store: Arc<dyn SessionStore>,
    cached: RwLock<Option<ApiRoot>>,
}

impl ApiRootCache {
    pub fn new(store: Arc<dyn SessionStore>) -> ApiRootCache {
        ApiRootCache {
            store,
            cached: RwLock::new(None),
        }
    }

    pub async fn resolve(
        &self,
        pipeline: &RequestPipeline,
        root_url: &str,
    ) -> Result<ApiRoot, BindError> {
        if let Ok(cached) = self.cached.read() {
            if let Some(root) = cached.as_ref() {
                return Ok(root.clone());
            }
        }

        let last_fetch = self
            .store
            .get(TIMESTAMP_KEY)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        let now = chrono::Utc::now().timestamp_millis();

        let root = if now - last_fetch >= MAX_AGE_MS {
            tracing::info!(url = %root_url, "refreshing api root");
            let envelope = pipeline
                .execute_unauthenticated(Method::Get, root_url, None)
                .await;
            let data = envelope.data.ok_or(BindError::RootDocumentMissing)?;
            let root: ApiRoot =
                serde_json::from_value(data).map_err(|_| BindError::RootDocumentMissing)?;
            let serialized =
                serde_json::to_string(&root).map_err(|_| BindError::RootDocumentMissing)?;
            self.store.set(ROOT_KEY, &serialized);
            self.store.set(TIMESTAMP_KEY, &now.to_string());
            root
        } else {
            // The store claims freshness; an empty or missing document
            // here is a broken cache, not a recoverable miss.
            let raw = self
                .store
                .get(ROOT_KEY)
                .filter(|s| !s.is_empty())
                .ok_or(BindError::RootStoreMissing)?;
            tracing::debug!("api root loaded from session store");
            serde_json::from_str(&raw).map_err(|_| BindError::RootStoreMissing)?
        };

        if let Ok(mut cached) = self.cached.write() {
            *cached = Some(root.clone());
        }
        Ok(root)
    }
}
