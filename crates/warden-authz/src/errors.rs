use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed credential: {0}")]
    MalformedCredential(String),
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("unknown key id: {0}")]
    UnknownKeyId(String),
    #[error("unknown api key: {0}")]
    UnknownApiKey(String),
    #[error("signature mismatch")]
    SignatureInvalid,
    #[error("issuer mismatch: expected {expected}")]
    IssuerMismatch { expected: String },
    #[error("wrong token type: expected {expected}, got {actual}")]
    WrongTokenType { expected: String, actual: String },
    #[error("timestamp is in the future: {0}")]
    ClockSkewRejected(String),
    #[error("credential expired: {0}")]
    CredentialExpired(String),
    #[error("unsupported scope: {0}")]
    UnsupportedScope(String),
    #[error("invalid resource path: {0}")]
    InvalidResourcePath(String),
    #[error("policy has no statements")]
    EmptyPolicy,
    #[error("malformed resource identifier: {0}")]
    MalformedResource(String),
    #[error("key set fetch failed: {0}")]
    KeyFetchFailed(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthError::MalformedCredential("bad".to_string()),
            AuthError::MalformedToken("bad".to_string()),
            AuthError::UnknownKeyId("kid".to_string()),
            AuthError::UnknownApiKey("key".to_string()),
            AuthError::SignatureInvalid,
            AuthError::IssuerMismatch {
                expected: "https://issuer".to_string(),
            },
            AuthError::WrongTokenType {
                expected: "access".to_string(),
                actual: "id".to_string(),
            },
            AuthError::ClockSkewRejected("2030-01-01T00:00:00Z".to_string()),
            AuthError::CredentialExpired("2019-01-01T00:00:00Z".to_string()),
            AuthError::UnsupportedScope("orders/admin".to_string()),
            AuthError::InvalidResourcePath("/orders?x=1".to_string()),
            AuthError::EmptyPolicy,
            AuthError::MalformedResource("not-an-arn".to_string()),
            AuthError::KeyFetchFailed("connection refused".to_string()),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }
}
