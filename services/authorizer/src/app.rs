use crate::config::AuthorizerConfig;
use crate::fetch::HttpKeySetSource;
use crate::secrets::FileSecretStore;
use anyhow::Result;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use warden_authz::{
    AuthRequest, Authorizer, BearerVerifier, KeyCache, Policy, ScopePolicy, SignedRequestVerifier,
};

#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<Authorizer>,
}

/// Builds the decision engine from configuration.
pub fn build_state(config: &AuthorizerConfig) -> Result<AppState> {
    let key_cache = Arc::new(KeyCache::new(Arc::new(HttpKeySetSource::new(
        &config.issuer_url,
    ))));
    let secrets = match &config.api_keys_path {
        Some(path) => FileSecretStore::load(path)?,
        None => FileSecretStore::default(),
    };
    let authorizer = Authorizer::new(
        BearerVerifier::new(config.issuer_url.clone(), key_cache),
        SignedRequestVerifier::with_max_age(Arc::new(secrets), config.signed_max_age),
        ScopePolicy::new(&config.resource_server_id),
        config.region.clone(),
    );
    Ok(AppState {
        authorizer: Arc::new(authorizer),
    })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/authorize", post(authorize))
        .route("/live", get(|| async { "ok" }))
        .with_state(state)
}

async fn authorize(State(state): State<AppState>, Json(request): Json<AuthRequest>) -> Json<Policy> {
    Json(state.authorizer.decide(&request).await)
}
