//! HMAC signed-request verification for partner API keys.
//!
//! # Purpose
//! Verifies `XEALTH apikey:signature` authorization headers by recomputing the
//! canonical string-to-sign over the request and comparing digests, and signs
//! outbound requests the same way for client use.
//!
//! # Key invariants
//! - Per-key secrets are derived, never stored: HMAC of the api key under a
//!   provisioning private key, base64-encoded.
//! - Digest comparison is constant-time.
//! - The Date header must be RFC 3339, not in the future, and no older than
//!   the configured window (five minutes by default).

use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;

pub const SIGNED_SCHEME: &str = "XEALTH";

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

type HmacSha256 = Hmac<Sha256>;

/// Parsed `SCHEME apikey:signature` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeader {
    pub api_key: String,
    pub signature: String,
}

pub fn parse_signed_header(value: &str) -> AuthResult<SignedHeader> {
    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() != 2 {
        return Err(AuthError::MalformedCredential(
            "auth header should split into two parts on space".to_string(),
        ));
    }
    if parts[0] != SIGNED_SCHEME {
        return Err(AuthError::MalformedCredential(format!(
            "auth header should start with {SIGNED_SCHEME}"
        )));
    }
    let credentials: Vec<&str> = parts[1].split(':').collect();
    if credentials.len() != 2 {
        return Err(AuthError::MalformedCredential(
            "credentials should split into two parts on colon".to_string(),
        ));
    }
    Ok(SignedHeader {
        api_key: credentials[0].to_string(),
        signature: credentials[1].to_string(),
    })
}

/// Derives the signing secret for an api key from the provisioning private
/// key. Deterministic; runs at provisioning time and again at verification
/// time, so the secret itself never has to be transmitted or stored.
pub fn derive_secret(api_key: &str, private_key: &str) -> String {
    hmac_base64(private_key.as_bytes(), api_key.as_bytes())
}

/// Signs a canonical string with a derived secret.
pub fn sign(string_to_sign: &str, secret: &str) -> String {
    hmac_base64(secret.as_bytes(), string_to_sign.as_bytes())
}

fn hmac_base64(key: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts keys of any length");
    mac.update(message);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// The request components covered by the signature.
#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub host: String,
    pub accept: String,
    pub date: String,
}

impl CanonicalRequest {
    /// Newline-joined canonical form: METHOD, path (with query if present),
    /// host, accept, date.
    pub fn string_to_sign(&self) -> String {
        let full_path = match self.query.as_deref() {
            Some(query) if !query.is_empty() => format!("{}?{}", self.path, query),
            _ => self.path.clone(),
        };
        [
            self.method.to_uppercase(),
            full_path,
            self.host.clone(),
            self.accept.clone(),
            self.date.clone(),
        ]
        .join("\n")
    }
}

/// Resolved identity behind an api key.
#[derive(Debug, Clone)]
pub struct ApiKeyIdentity {
    pub id: String,
    pub api_key: String,
    pub secret: String,
}

/// Secret-store lookup for api keys, injected by the embedding service.
#[async_trait]
pub trait ApiKeySecretResolver: Send + Sync {
    async fn resolve(&self, api_key: &str) -> AuthResult<ApiKeyIdentity>;
}

pub struct SignedRequestVerifier {
    resolver: Arc<dyn ApiKeySecretResolver>,
    max_age: Duration,
}

impl SignedRequestVerifier {
    pub fn new(resolver: Arc<dyn ApiKeySecretResolver>) -> Self {
        Self::with_max_age(resolver, DEFAULT_MAX_AGE)
    }

    pub fn with_max_age(resolver: Arc<dyn ApiKeySecretResolver>, max_age: Duration) -> Self {
        Self { resolver, max_age }
    }

    /// Verifies a signed request and returns the key's identity.
    pub async fn verify(
        &self,
        authorization: &str,
        request: &CanonicalRequest,
    ) -> AuthResult<ApiKeyIdentity> {
        self.verify_at(authorization, request, Utc::now()).await
    }

    async fn verify_at(
        &self,
        authorization: &str,
        request: &CanonicalRequest,
        now: DateTime<Utc>,
    ) -> AuthResult<ApiKeyIdentity> {
        let header = parse_signed_header(authorization)?;
        let identity = self.resolver.resolve(&header.api_key).await?;
        check_date(&request.date, now, self.max_age)?;

        let ours = sign(&request.string_to_sign(), &identity.secret);
        if ours.as_bytes().ct_eq(header.signature.as_bytes()).unwrap_u8() != 1 {
            return Err(AuthError::SignatureInvalid);
        }
        Ok(identity)
    }
}

fn check_date(value: &str, now: DateTime<Utc>, max_age: Duration) -> AuthResult<()> {
    let given = DateTime::parse_from_rfc3339(value)
        .map_err(|err| AuthError::MalformedCredential(format!("invalid date header: {err}")))?
        .with_timezone(&Utc);

    let age = now.signed_duration_since(given);
    if age < chrono::Duration::zero() {
        return Err(AuthError::ClockSkewRejected(value.to_string()));
    }
    if age > chrono::Duration::seconds(max_age.as_secs() as i64) {
        return Err(AuthError::CredentialExpired(value.to_string()));
    }
    Ok(())
}

/// An outbound request about to be signed.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub host: String,
    pub accept: String,
}

/// Headers a client must attach to a signed outbound request.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub authorization: String,
    pub date: String,
    pub accept: String,
}

/// Stamps and signs an outbound request.
pub fn sign_outbound(api_key: &str, secret: &str, request: &OutboundRequest) -> SignedHeaders {
    sign_outbound_at(api_key, secret, request, Utc::now())
}

fn sign_outbound_at(
    api_key: &str,
    secret: &str,
    request: &OutboundRequest,
    now: DateTime<Utc>,
) -> SignedHeaders {
    let date = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let canonical = CanonicalRequest {
        method: request.method.clone(),
        path: request.path.clone(),
        query: request.query.clone(),
        host: request.host.clone(),
        accept: request.accept.clone(),
        date: date.clone(),
    };
    let signature = sign(&canonical.string_to_sign(), secret);
    SignedHeaders {
        authorization: format!("{SIGNED_SCHEME} {api_key}:{signature}"),
        date,
        accept: request.accept.clone(),
    }
}
