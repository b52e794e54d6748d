//! Process-lifetime verification key cache.
//!
//! # Purpose
//! Holds the remote key set in memory so signature verification never waits on
//! the network after the first decision.
//!
//! # Concurrency model
//! Population goes through `tokio::sync::OnceCell`, so concurrent first
//! callers share a single in-flight fetch and at most one fetch is ever
//! outstanding. A failed fetch leaves the cell empty; the next caller retries.
//! Once populated, entries live until the process exits (no refresh API).

use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Source of the remote key set, injected by the embedding service.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch_key_set(&self) -> AuthResult<KeySet>;
}

/// Immutable key-id to verification-key mapping.
#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl std::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // DecodingKey is not Debug; expose only the key ids, never material.
        f.debug_struct("KeySet")
            .field("kids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KeySet {
    pub fn new(keys: HashMap<String, DecodingKey>) -> Self {
        Self { keys }
    }

    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub struct KeyCache {
    source: Arc<dyn KeySetSource>,
    cell: OnceCell<Arc<KeySet>>,
}

impl KeyCache {
    pub fn new(source: Arc<dyn KeySetSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Returns the cached key set, fetching it on first use.
    pub async fn get(&self) -> AuthResult<Arc<KeySet>> {
        let keys = self
            .cell
            .get_or_try_init(|| async {
                let keys = self.source.fetch_key_set().await?;
                Ok::<_, AuthError>(Arc::new(keys))
            })
            .await?;
        Ok(keys.clone())
    }
}
