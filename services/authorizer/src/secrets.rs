use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use warden_authz::{ApiKeyIdentity, ApiKeySecretResolver, AuthError, AuthResult, derive_secret};

/// One provisioned api-key record. The private key stays inside the store;
/// the signing secret is derived from it on every lookup and never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyRecord {
    pub id: String,
    pub private_key: String,
}

/// Api-key secret store backed by a JSON file keyed by api key.
#[derive(Debug, Clone, Default)]
pub struct FileSecretStore {
    records: HashMap<String, ApiKeyRecord>,
}

impl FileSecretStore {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read api key store: {path}"))?;
        let records: HashMap<String, ApiKeyRecord> =
            serde_json::from_str(&contents).with_context(|| "parse api key store json")?;
        tracing::info!(keys = records.len(), "loaded api key store");
        Ok(Self { records })
    }

    pub fn from_records(records: HashMap<String, ApiKeyRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ApiKeySecretResolver for FileSecretStore {
    async fn resolve(&self, api_key: &str) -> AuthResult<ApiKeyIdentity> {
        let record = self
            .records
            .get(api_key)
            .ok_or_else(|| AuthError::UnknownApiKey(api_key.to_string()))?;
        Ok(ApiKeyIdentity {
            id: record.id.clone(),
            api_key: api_key.to_string(),
            secret: derive_secret(api_key, &record.private_key),
        })
    }
}
