use crate::policy::PolicyBuilder;
use crate::resource::HttpVerb;
use crate::{AuthError, AuthResult};

const WRITE_VERBS: [HttpVerb; 3] = [HttpVerb::Post, HttpVerb::Delete, HttpVerb::Patch];

/// Maps a verified token's scope string to concrete grants.
///
/// Scope identifiers are namespaced under the resource server id: `{id}/rw`
/// unlocks writes, `{id}/ro` adds nothing beyond the baseline read grant.
/// Anything else is a hard failure; an unrecognized scope is a provisioning
/// bug and must not be silently ignored.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    read_write: String,
    read_only: String,
}

impl ScopePolicy {
    pub fn new(resource_server_id: &str) -> Self {
        Self {
            read_write: format!("{resource_server_id}/rw"),
            read_only: format!("{resource_server_id}/ro"),
        }
    }

    /// Adds the grants implied by a scope string to the builder.
    pub fn apply(&self, scope: &str, builder: PolicyBuilder) -> AuthResult<PolicyBuilder> {
        // Any authenticated caller can list orders.
        let mut builder = builder.allow(HttpVerb::Get, "/orders")?;

        for token in scope.split_whitespace() {
            if token == self.read_write {
                for verb in WRITE_VERBS {
                    builder = builder.allow(verb, "/orders/*")?;
                }
            } else if token == self.read_only {
                // Covered by the baseline grant.
            } else {
                return Err(AuthError::UnsupportedScope(token.to_string()));
            }
        }
        Ok(builder)
    }
}
