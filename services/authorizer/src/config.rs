use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_SIGNED_MAX_AGE_SECS: u64 = 5 * 60;

// Authorizer service configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct AuthorizerConfig {
    // HTTP listener bind address.
    pub bind_addr: SocketAddr,
    // Region stamped into composed resource identifiers.
    pub region: String,
    // Issuer expected in bearer tokens; also hosts the well-known key set.
    pub issuer_url: String,
    // Resource server id that scope identifiers are namespaced under.
    pub resource_server_id: String,
    // JSON file with provisioned api-key records; unset means no signed
    // request traffic is expected.
    pub api_keys_path: Option<String>,
    // Maximum accepted age of a signed request's Date header.
    pub signed_max_age: Duration,
}

#[derive(Debug, Deserialize)]
struct AuthorizerConfigOverride {
    bind_addr: Option<String>,
    region: Option<String>,
    issuer_url: Option<String>,
    resource_server_id: Option<String>,
    api_keys_path: Option<String>,
    signed_max_age_secs: Option<u64>,
}

impl AuthorizerConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("WARDEN_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse WARDEN_BIND")?;
        let region = std::env::var("WARDEN_REGION").unwrap_or_else(|_| "us-west-2".to_string());
        let issuer_url =
            std::env::var("WARDEN_ISSUER_URL").with_context(|| "WARDEN_ISSUER_URL is required")?;
        let resource_server_id = std::env::var("WARDEN_RESOURCE_SERVER_ID")
            .with_context(|| "WARDEN_RESOURCE_SERVER_ID is required")?;
        let api_keys_path = std::env::var("WARDEN_API_KEYS_PATH").ok();
        let signed_max_age_secs = std::env::var("WARDEN_SIGNED_MAX_AGE_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_SIGNED_MAX_AGE_SECS);
        Ok(Self {
            bind_addr,
            region,
            issuer_url,
            resource_server_id,
            api_keys_path,
            signed_max_age: Duration::from_secs(signed_max_age_secs),
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("WARDEN_CONFIG") {
            // YAML overrides allow ops-friendly config files.
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read WARDEN_CONFIG: {path}"))?;
            let override_cfg: AuthorizerConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse authorizer config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.region {
                config.region = value;
            }
            if let Some(value) = override_cfg.issuer_url {
                config.issuer_url = value;
            }
            if let Some(value) = override_cfg.resource_server_id {
                config.resource_server_id = value;
            }
            if let Some(value) = override_cfg.api_keys_path {
                config.api_keys_path = Some(value);
            }
            if let Some(value) = override_cfg.signed_max_age_secs {
                if value > 0 {
                    config.signed_max_age = Duration::from_secs(value);
                }
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            std::env::set_var(key, value);
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            std::env::remove_var(key);
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn from_env_applies_defaults() {
        let _g1 = EnvGuard::set("WARDEN_ISSUER_URL", "https://issuer.example/pool-1");
        let _g2 = EnvGuard::set("WARDEN_RESOURCE_SERVER_ID", "orders-api");
        let _g3 = EnvGuard::unset("WARDEN_BIND");
        let _g4 = EnvGuard::unset("WARDEN_REGION");
        let _g5 = EnvGuard::unset("WARDEN_API_KEYS_PATH");
        let _g6 = EnvGuard::unset("WARDEN_SIGNED_MAX_AGE_SECS");
        let _g7 = EnvGuard::unset("WARDEN_CONFIG");

        let config = AuthorizerConfig::from_env().expect("config");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.issuer_url, "https://issuer.example/pool-1");
        assert!(config.api_keys_path.is_none());
        assert_eq!(config.signed_max_age, Duration::from_secs(300));
    }

    #[test]
    #[serial]
    fn from_env_requires_issuer() {
        let _g1 = EnvGuard::unset("WARDEN_ISSUER_URL");
        let _g2 = EnvGuard::set("WARDEN_RESOURCE_SERVER_ID", "orders-api");

        assert!(AuthorizerConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides() {
        let _g1 = EnvGuard::set("WARDEN_ISSUER_URL", "https://issuer.example/pool-1");
        let _g2 = EnvGuard::set("WARDEN_RESOURCE_SERVER_ID", "orders-api");
        let _g3 = EnvGuard::set("WARDEN_BIND", "127.0.0.1:9999");
        let _g4 = EnvGuard::set("WARDEN_REGION", "eu-central-1");
        let _g5 = EnvGuard::set("WARDEN_SIGNED_MAX_AGE_SECS", "60");
        let _g6 = EnvGuard::unset("WARDEN_CONFIG");

        let config = AuthorizerConfig::from_env().expect("config");
        assert_eq!(config.bind_addr.port(), 9999);
        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.signed_max_age, Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn yaml_overrides_env() {
        let _g1 = EnvGuard::set("WARDEN_ISSUER_URL", "https://issuer.example/pool-1");
        let _g2 = EnvGuard::set("WARDEN_RESOURCE_SERVER_ID", "orders-api");

        let dir = std::env::temp_dir().join("warden-config-test");
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("override.yaml");
        fs::write(&path, "region: ap-southeast-2\nsigned_max_age_secs: 120\n")
            .expect("write override");
        let _g3 = EnvGuard::set("WARDEN_CONFIG", path.to_str().expect("utf8 path"));

        let config = AuthorizerConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.signed_max_age, Duration::from_secs(120));
    }
}
