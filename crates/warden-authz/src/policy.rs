//! Policy document model and the grant compiler.
//!
//! # Purpose
//! Accumulates per-method allow/deny grants and compiles them into the
//! smallest equivalent statement list the gateway will enforce.
//!
//! # Key invariants
//! - Unconditional grants for one effect merge into a single statement whose
//!   resource list keeps first-seen order with duplicates collapsed.
//! - Grants carrying conditions always compile to their own statement;
//!   conditions are opaque and pass through untouched.
//! - A document with zero statements is a build error, never an empty Allow.

use crate::resource::{HttpVerb, method_arn};
use crate::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Opaque condition payload. The compiler never inspects these; they are
/// attached to the grant's statement exactly as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(pub serde_json::Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Resource")]
    pub resources: Vec<String>,
    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statements: Vec<Statement>,
}

/// The response handed back to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
}

/// Stage coordinates for composed resource identifiers; unset fields widen to
/// `*`.
#[derive(Debug, Clone, Default)]
pub struct ApiOptions {
    pub region: Option<String>,
    pub api_id: Option<String>,
    pub stage: Option<String>,
}

#[derive(Debug, Clone)]
struct Grant {
    resource_arn: String,
    conditions: Vec<Condition>,
}

/// Accumulates grants and compiles the final policy.
///
/// The builder is a value: every grant method consumes it and returns the
/// extended accumulator, so a partially-built policy can never be shared and
/// mutated behind the caller's back.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    principal: String,
    account: String,
    region: String,
    api_id: String,
    stage: String,
    allow: Vec<Grant>,
    deny: Vec<Grant>,
}

impl PolicyBuilder {
    pub fn new(
        principal: impl Into<String>,
        account: impl Into<String>,
        options: ApiOptions,
    ) -> Self {
        Self {
            principal: principal.into(),
            account: account.into(),
            region: options.region.unwrap_or_else(|| "*".to_string()),
            api_id: options.api_id.unwrap_or_else(|| "*".to_string()),
            stage: options.stage.unwrap_or_else(|| "*".to_string()),
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }

    pub fn allow(self, verb: HttpVerb, resource: &str) -> AuthResult<Self> {
        self.grant(Effect::Allow, verb, resource, Vec::new())
    }

    pub fn deny(self, verb: HttpVerb, resource: &str) -> AuthResult<Self> {
        self.grant(Effect::Deny, verb, resource, Vec::new())
    }

    pub fn allow_with_conditions(
        self,
        verb: HttpVerb,
        resource: &str,
        conditions: Vec<Condition>,
    ) -> AuthResult<Self> {
        self.grant(Effect::Allow, verb, resource, conditions)
    }

    pub fn deny_with_conditions(
        self,
        verb: HttpVerb,
        resource: &str,
        conditions: Vec<Condition>,
    ) -> AuthResult<Self> {
        self.grant(Effect::Deny, verb, resource, conditions)
    }

    pub fn allow_all(self) -> AuthResult<Self> {
        self.grant(Effect::Allow, HttpVerb::Any, "*", Vec::new())
    }

    pub fn deny_all(self) -> AuthResult<Self> {
        self.grant(Effect::Deny, HttpVerb::Any, "*", Vec::new())
    }

    fn grant(
        mut self,
        effect: Effect,
        verb: HttpVerb,
        resource: &str,
        conditions: Vec<Condition>,
    ) -> AuthResult<Self> {
        let resource_arn = method_arn(
            &self.region,
            &self.account,
            &self.api_id,
            &self.stage,
            verb,
            resource,
        )?;
        let grant = Grant {
            resource_arn,
            conditions,
        };
        match effect {
            Effect::Allow => self.allow.push(grant),
            Effect::Deny => self.deny.push(grant),
        }
        Ok(self)
    }

    /// Compiles the accumulated grants into the final policy.
    ///
    /// # Errors
    /// - [`AuthError::EmptyPolicy`] when no grant was added at all.
    pub fn build(self) -> AuthResult<Policy> {
        let mut statements = Vec::new();
        statements.extend(statements_for_effect(Effect::Allow, &self.allow));
        statements.extend(statements_for_effect(Effect::Deny, &self.deny));
        if statements.is_empty() {
            return Err(AuthError::EmptyPolicy);
        }
        Ok(Policy {
            principal_id: self.principal,
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statements,
            },
            context: HashMap::new(),
        })
    }
}

fn statements_for_effect(effect: Effect, grants: &[Grant]) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut merged: Vec<String> = Vec::new();

    for grant in grants {
        if grant.conditions.is_empty() {
            if !merged.contains(&grant.resource_arn) {
                merged.push(grant.resource_arn.clone());
            }
        } else {
            statements.push(Statement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resources: vec![grant.resource_arn.clone()],
                conditions: Some(grant.conditions.clone()),
            });
        }
    }

    if !merged.is_empty() {
        statements.push(Statement {
            action: INVOKE_ACTION.to_string(),
            effect,
            resources: merged,
            conditions: None,
        });
    }

    statements
}

/// The fail-closed terminal document: wildcard principal, one Deny statement
/// covering only the requested resource.
pub fn deny_document(method_arn: &str) -> Policy {
    single_statement_document("*", Effect::Deny, method_arn, HashMap::new())
}

/// A document with exactly one unconditional statement on one resource.
pub fn single_statement_document(
    principal: &str,
    effect: Effect,
    resource: &str,
    context: HashMap<String, String>,
) -> Policy {
    Policy {
        principal_id: principal.to_string(),
        policy_document: PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statements: vec![Statement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resources: vec![resource.to_string()],
                conditions: None,
            }],
        },
        context,
    }
}
