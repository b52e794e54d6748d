use async_trait::async_trait;
use warden_authz::{AuthError, AuthResult, Jwks, KeySet, KeySetSource};

/// Fetches the issuer's published key set over HTTP.
///
/// The cache in front of this source calls it at most once per successful
/// process lifetime, so no TTL or conditional-request logic lives here.
pub struct HttpKeySetSource {
    url: String,
    client: reqwest::Client,
}

impl HttpKeySetSource {
    pub fn new(issuer_url: &str) -> Self {
        Self {
            url: format!(
                "{}/.well-known/jwks.json",
                issuer_url.trim_end_matches('/')
            ),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch_key_set(&self) -> AuthResult<KeySet> {
        tracing::info!(url = %self.url, "fetching key set");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::KeyFetchFailed(format!("fetch key set: {err}")))?
            .error_for_status()
            .map_err(|err| AuthError::KeyFetchFailed(format!("key set status: {err}")))?;
        let jwks: Jwks = response
            .json()
            .await
            .map_err(|err| AuthError::KeyFetchFailed(format!("decode key set: {err}")))?;
        jwks.verification_keys()
    }
}
