//! Method ARN codec for API Gateway style resource identifiers.
//!
//! # Purpose
//! Parses and composes the `arn:aws:execute-api:…` identifiers that name one
//! verb+path on one deployed API stage.
//!
//! # Key invariants
//! - `MethodArn::parse` inverts `MethodArn::to_arn` for any value this module
//!   composed itself.
//! - Resource paths fed to [`method_arn`] are restricted to `[A-Za-z0-9./*-]`.

use crate::{AuthError, AuthResult};

const ARN_PREFIX: &str = "arn:aws:execute-api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Head,
    Delete,
    Options,
    Any,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Head => "HEAD",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Options => "OPTIONS",
            HttpVerb::Any => "*",
        }
    }
}

impl std::fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpVerb {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "GET" => Ok(HttpVerb::Get),
            "POST" => Ok(HttpVerb::Post),
            "PUT" => Ok(HttpVerb::Put),
            "PATCH" => Ok(HttpVerb::Patch),
            "HEAD" => Ok(HttpVerb::Head),
            "DELETE" => Ok(HttpVerb::Delete),
            "OPTIONS" => Ok(HttpVerb::Options),
            "*" => Ok(HttpVerb::Any),
            _ => Err(()),
        }
    }
}

/// One API Gateway method identifier, decomposed.
///
/// Layout: `arn:aws:execute-api:{region}:{account}:{api_id}/{stage}/{verb}/{path}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodArn {
    pub region: String,
    pub account: String,
    pub api_id: String,
    pub stage: String,
    pub verb: HttpVerb,
    pub path: String,
}

impl MethodArn {
    /// Splits a method ARN into its components.
    ///
    /// The prefix and suffix separate on the last `:`; the account is the
    /// final prefix token and the region the one before it. The suffix holds
    /// api-id, stage, and verb, with every remaining `/` segment rejoined as
    /// the path (which may be empty).
    pub fn parse(arn: &str) -> AuthResult<Self> {
        let malformed = || AuthError::MalformedResource(arn.to_string());

        let (prefix, suffix) = arn.rsplit_once(':').ok_or_else(malformed)?;
        let (rest, account) = prefix.rsplit_once(':').ok_or_else(malformed)?;
        let (_, region) = rest.rsplit_once(':').ok_or_else(malformed)?;

        let mut segments = suffix.split('/');
        let api_id = segments.next().ok_or_else(malformed)?;
        let stage = segments.next().ok_or_else(malformed)?;
        let verb = segments
            .next()
            .ok_or_else(malformed)?
            .parse::<HttpVerb>()
            .map_err(|_| malformed())?;
        let path = segments.collect::<Vec<_>>().join("/");

        Ok(Self {
            region: region.to_string(),
            account: account.to_string(),
            api_id: api_id.to_string(),
            stage: stage.to_string(),
            verb,
            path,
        })
    }

    /// Composes the canonical ARN string back from the components.
    pub fn to_arn(&self) -> String {
        format!(
            "{ARN_PREFIX}:{}:{}:{}/{}/{}/{}",
            self.region, self.account, self.api_id, self.stage, self.verb, self.path
        )
    }
}

impl std::fmt::Display for MethodArn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_arn())
    }
}

/// Builds the method ARN for one verb+resource grant.
///
/// A single leading `/` on the resource is dropped before composition.
///
/// # Errors
/// - [`AuthError::InvalidResourcePath`] if the resource is empty or contains
///   characters outside `[A-Za-z0-9./*-]`.
pub fn method_arn(
    region: &str,
    account: &str,
    api_id: &str,
    stage: &str,
    verb: HttpVerb,
    resource: &str,
) -> AuthResult<String> {
    if !valid_resource_path(resource) {
        return Err(AuthError::InvalidResourcePath(resource.to_string()));
    }
    let path = resource.strip_prefix('/').unwrap_or(resource);
    Ok(format!(
        "{ARN_PREFIX}:{region}:{account}:{api_id}/{stage}/{}/{path}",
        verb.as_str()
    ))
}

fn valid_resource_path(resource: &str) -> bool {
    !resource.is_empty()
        && resource
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '*' | '-'))
}
