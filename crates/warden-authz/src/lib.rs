//! Edge authorization primitives for the warden authorizer service.
//!
//! # Purpose
//! Centralizes the decision engine: resource-identifier codec, verification
//! key cache, bearer-token and signed-request verifiers, scope-derived
//! permission grants, and the policy compiler.
//!
//! # How it fits
//! The authorizer service injects concrete key-set and secret-store sources
//! and exposes [`Authorizer::decide`] to its gateway; this crate performs no
//! network I/O of its own.
//!
//! # Key invariants
//! - Every verification or compilation failure collapses into a deny document
//!   at the [`Authorizer::decide`] boundary; no error kind crosses it.
//! - The key cache populates once per process through a single shared fetch.
//!
//! # Examples
//! ```rust
//! use warden_authz::{ApiOptions, HttpVerb, PolicyBuilder};
//!
//! let policy = PolicyBuilder::new("user-1", "958019638877", ApiOptions::default())
//!     .allow(HttpVerb::Get, "/orders")
//!     .and_then(PolicyBuilder::build)
//!     .expect("compile policy");
//! assert_eq!(policy.principal_id, "user-1");
//! ```

mod errors;
mod jwks;
mod keys;
mod pipeline;
mod policy;
mod resource;
mod scopes;
mod signed;
mod token;

pub use errors::{AuthError, AuthResult};
pub use jwks::{Jwk, Jwks, KeyUse};
pub use keys::{KeyCache, KeySet, KeySetSource};
pub use pipeline::{AuthRequest, Authorizer};
pub use policy::{
    ApiOptions, Condition, Effect, INVOKE_ACTION, POLICY_VERSION, Policy, PolicyBuilder,
    PolicyDocument, Statement, deny_document, single_statement_document,
};
pub use resource::{HttpVerb, MethodArn, method_arn};
pub use scopes::ScopePolicy;
pub use signed::{
    ApiKeyIdentity, ApiKeySecretResolver, CanonicalRequest, DEFAULT_MAX_AGE, OutboundRequest,
    SIGNED_SCHEME, SignedHeader, SignedHeaders, SignedRequestVerifier, derive_secret,
    parse_signed_header, sign, sign_outbound,
};
pub use token::{ACCESS_TOKEN_USE, AccessClaims, BearerVerifier, extract_bearer_token};
