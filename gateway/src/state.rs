//! Shared handler state.

use std::sync::Arc;

use smallbank_ledger::LedgerEngine;

use crate::auth::{Credentials, TokenService};
use crate::config::AuthConfig;
use crate::metrics::{Metrics, SharedMetrics};

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LedgerEngine>,
    pub tokens: Arc<TokenService>,
    pub credentials: Arc<Credentials>,
    pub metrics: SharedMetrics,
}

impl AppState {
    pub fn new(engine: Arc<LedgerEngine>, auth: &AuthConfig) -> Self {
        Self {
            engine,
            tokens: Arc::new(TokenService::new(&auth.jwt_secret, auth.token_ttl)),
            credentials: Arc::new(Credentials::from(auth)),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
