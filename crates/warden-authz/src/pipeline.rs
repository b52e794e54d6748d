//! The authorization decision pipeline.
//!
//! # Purpose
//! Orchestrates credential verification, permission derivation, and policy
//! compilation into a single `decide` call the gateway invokes per request.
//!
//! # Key invariants
//! - `decide` never fails: every internal error collapses into the wildcard
//!   deny document scoped to the requested resource.
//! - The credential scheme picks the verification path; nothing is retried
//!   within one invocation.

use crate::policy::{
    ApiOptions, Effect, Policy, PolicyBuilder, deny_document, single_statement_document,
};
use crate::resource::MethodArn;
use crate::scopes::ScopePolicy;
use crate::signed::{CanonicalRequest, SIGNED_SCHEME, SignedRequestVerifier};
use crate::token::BearerVerifier;
use crate::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The request context handed over by the gateway.
///
/// Only `method_arn` is always required; the signed-request fields stay unset
/// on bearer-token traffic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub method_arn: String,
    #[serde(default)]
    pub authorization: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub accept: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl AuthRequest {
    fn canonical(&self) -> AuthResult<CanonicalRequest> {
        Ok(CanonicalRequest {
            method: required(&self.method, "method")?,
            path: required(&self.path, "path")?,
            query: self.query.clone(),
            host: required(&self.host, "host")?,
            accept: required(&self.accept, "accept")?,
            date: required(&self.date, "date")?,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> AuthResult<String> {
    value
        .clone()
        .ok_or_else(|| AuthError::MalformedCredential(format!("missing request field: {name}")))
}

pub struct Authorizer {
    bearer: BearerVerifier,
    signed: SignedRequestVerifier,
    scopes: ScopePolicy,
    region: String,
}

impl Authorizer {
    pub fn new(
        bearer: BearerVerifier,
        signed: SignedRequestVerifier,
        scopes: ScopePolicy,
        region: impl Into<String>,
    ) -> Self {
        Self {
            bearer,
            signed,
            scopes,
            region: region.into(),
        }
    }

    /// Makes the authorization decision for one request.
    ///
    /// Never fails past this boundary: any verification or compilation error
    /// is logged and converted into the deny document.
    pub async fn decide(&self, request: &AuthRequest) -> Policy {
        match self.evaluate(request).await {
            Ok(policy) => policy,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    method_arn = %request.method_arn,
                    "authorization denied"
                );
                deny_document(&request.method_arn)
            }
        }
    }

    async fn evaluate(&self, request: &AuthRequest) -> AuthResult<Policy> {
        let authorization = request.authorization.as_deref().ok_or_else(|| {
            AuthError::MalformedCredential("missing authorization header".to_string())
        })?;

        let is_signed = authorization.split(' ').next() == Some(SIGNED_SCHEME);
        if is_signed {
            self.evaluate_signed(request, authorization).await
        } else {
            self.evaluate_bearer(request, authorization).await
        }
    }

    /// A valid request signature alone authorizes the requested resource; the
    /// key's identity travels back to the integration as response context.
    async fn evaluate_signed(
        &self,
        request: &AuthRequest,
        authorization: &str,
    ) -> AuthResult<Policy> {
        let canonical = request.canonical()?;
        let identity = self.signed.verify(authorization, &canonical).await?;

        let mut context = HashMap::new();
        context.insert("apiKey".to_string(), identity.api_key);
        Ok(single_statement_document(
            &identity.id,
            Effect::Allow,
            &request.method_arn,
            context,
        ))
    }

    /// Bearer tokens authorize scope-derived grants on the requested API
    /// stage; the principal is the token subject.
    async fn evaluate_bearer(
        &self,
        request: &AuthRequest,
        authorization: &str,
    ) -> AuthResult<Policy> {
        let claims = self.bearer.verify(authorization).await?;
        let arn = MethodArn::parse(&request.method_arn)?;

        let builder = PolicyBuilder::new(
            &claims.sub,
            &arn.account,
            ApiOptions {
                region: Some(self.region.clone()),
                api_id: Some(arn.api_id),
                stage: Some(arn.stage),
            },
        );
        let builder = self.scopes.apply(&claims.scope, builder)?;
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyCache, KeySet, KeySetSource};
    use crate::signed::{
        ApiKeyIdentity, ApiKeySecretResolver, OutboundRequest, derive_secret, sign_outbound,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    const METHOD_ARN: &str =
        "arn:aws:execute-api:us-west-2:958019638877:f4inwdzg90/dev/GET/orders";

    struct EmptyKeys;

    #[async_trait]
    impl KeySetSource for EmptyKeys {
        async fn fetch_key_set(&self) -> AuthResult<KeySet> {
            Ok(KeySet::default())
        }
    }

    struct OneKey;

    #[async_trait]
    impl ApiKeySecretResolver for OneKey {
        async fn resolve(&self, api_key: &str) -> AuthResult<ApiKeyIdentity> {
            if api_key != "key-1" {
                return Err(AuthError::UnknownApiKey(api_key.to_string()));
            }
            Ok(ApiKeyIdentity {
                id: "partner-42".to_string(),
                api_key: api_key.to_string(),
                secret: derive_secret(api_key, "provisioning-private-key"),
            })
        }
    }

    fn authorizer() -> Authorizer {
        Authorizer::new(
            BearerVerifier::new(
                "https://issuer.example/pool-1",
                Arc::new(KeyCache::new(Arc::new(EmptyKeys))),
            ),
            SignedRequestVerifier::new(Arc::new(OneKey)),
            ScopePolicy::new("orders-api"),
            "us-west-2",
        )
    }

    fn signed_request() -> AuthRequest {
        let outbound = OutboundRequest {
            method: "GET".to_string(),
            path: "/dev/orders".to_string(),
            query: Some("limit=1".to_string()),
            host: "f4inwdzg90.execute-api.us-west-2.amazonaws.com".to_string(),
            accept: "application/json".to_string(),
        };
        let secret = derive_secret("key-1", "provisioning-private-key");
        let headers = sign_outbound("key-1", &secret, &outbound);
        AuthRequest {
            method_arn: METHOD_ARN.to_string(),
            authorization: Some(headers.authorization),
            method: Some(outbound.method),
            path: Some(outbound.path),
            query: outbound.query,
            host: Some(outbound.host),
            accept: Some(outbound.accept),
            date: Some(headers.date),
        }
    }

    fn assert_denied(policy: &Policy) {
        assert_eq!(policy.principal_id, "*");
        let statements = &policy.policy_document.statements;
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].effect, Effect::Deny);
        assert_eq!(statements[0].resources, vec![METHOD_ARN]);
    }

    #[tokio::test]
    async fn missing_authorization_denies() {
        let request = AuthRequest {
            method_arn: METHOD_ARN.to_string(),
            ..AuthRequest::default()
        };
        let policy = authorizer().decide(&request).await;
        assert_denied(&policy);
    }

    #[tokio::test]
    async fn garbage_bearer_credential_denies() {
        let request = AuthRequest {
            method_arn: METHOD_ARN.to_string(),
            authorization: Some("Bearer not.a.token".to_string()),
            ..AuthRequest::default()
        };
        let policy = authorizer().decide(&request).await;
        assert_denied(&policy);
    }

    #[tokio::test]
    async fn valid_signed_request_allows_the_resource() {
        let policy = authorizer().decide(&signed_request()).await;

        assert_eq!(policy.principal_id, "partner-42");
        assert_eq!(policy.context.get("apiKey").map(String::as_str), Some("key-1"));
        let statements = &policy.policy_document.statements;
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].effect, Effect::Allow);
        assert_eq!(statements[0].resources, vec![METHOD_ARN]);
    }

    #[tokio::test]
    async fn tampered_signed_request_denies() {
        let mut request = signed_request();
        request.path = Some("/dev/admin".to_string());
        let policy = authorizer().decide(&request).await;
        assert_denied(&policy);
    }

    #[tokio::test]
    async fn signed_request_missing_fields_denies() {
        let mut request = signed_request();
        request.host = None;
        let policy = authorizer().decide(&request).await;
        assert_denied(&policy);
    }

    #[tokio::test]
    async fn unknown_api_key_denies() {
        let mut request = signed_request();
        request.authorization = request
            .authorization
            .take()
            .map(|auth| auth.replace("key-1", "key-9"));
        let policy = authorizer().decide(&request).await;
        assert_denied(&policy);
    }
}
