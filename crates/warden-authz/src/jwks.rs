use crate::keys::KeySet;
use crate::{AuthError, AuthResult};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyUse {
    Sig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub use_field: KeyUse,
    pub n: String,
    pub e: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Converts the published key set into verification keys, keyed by kid.
    ///
    /// Non-RSA entries are skipped; an RSA entry with undecodable components
    /// fails the whole conversion, since serving a partial key set would turn
    /// key-id lookups into false negatives.
    pub fn verification_keys(&self) -> AuthResult<KeySet> {
        let mut keys = HashMap::new();
        for key in &self.keys {
            if key.kty != "RSA" {
                continue;
            }
            let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e).map_err(|err| {
                AuthError::KeyFetchFailed(format!("bad components for key {}: {err}", key.kid))
            })?;
            keys.insert(key.kid.clone(), decoding_key);
        }
        Ok(KeySet::new(keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn rsa_jwk(kid: &str) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: kid.to_string(),
            alg: "RS256".to_string(),
            use_field: KeyUse::Sig,
            n: URL_SAFE_NO_PAD.encode([1, 2, 3]),
            e: URL_SAFE_NO_PAD.encode([1, 0, 1]),
        }
    }

    #[test]
    fn jwks_roundtrip() {
        let jwks = Jwks {
            keys: vec![rsa_jwk("k1")],
        };

        let serialized = serde_json::to_string(&jwks).expect("serialize");
        let decoded: Jwks = serde_json::from_str(&serialized).expect("deserialize");
        assert_eq!(decoded.keys.len(), 1);
        assert_eq!(decoded.keys[0].kid, "k1");
    }

    #[test]
    fn verification_keys_by_kid() {
        let jwks = Jwks {
            keys: vec![rsa_jwk("k1"), rsa_jwk("k2")],
        };
        let keys = jwks.verification_keys().expect("convert");
        assert_eq!(keys.len(), 2);
        assert!(keys.get("k1").is_some());
        assert!(keys.get("missing").is_none());
    }

    #[test]
    fn verification_keys_skip_non_rsa() {
        let mut ec = rsa_jwk("ec1");
        ec.kty = "EC".to_string();
        let jwks = Jwks {
            keys: vec![ec, rsa_jwk("k1")],
        };
        let keys = jwks.verification_keys().expect("convert");
        assert_eq!(keys.len(), 1);
        assert!(keys.get("ec1").is_none());
    }

    #[test]
    fn verification_keys_reject_invalid_components() {
        let mut bad = rsa_jwk("k1");
        bad.n = "not-base64".to_string();
        let jwks = Jwks { keys: vec![bad] };
        let err = jwks.verification_keys().expect_err("bad components");
        assert!(matches!(err, AuthError::KeyFetchFailed(_)));
    }
}
