// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::{AuthError, BearerVerifier};
use crate::blockchain::{ChainClient, ChainError};
use crate::config::AppConfig;
use crate::indexer::IndexerClient;
use crate::relay::PaymasterClient;
use crate::store::CredentialStore;

/// Failures while assembling the application state at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("HTTP client initialization failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chain client initialization failed: {0}")]
    Chain(#[from] ChainError),

    #[error("Auth initialization failed: {0}")]
    Auth(#[from] AuthError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<RwLock<CredentialStore>>,
    pub bearer: Arc<BearerVerifier>,
    pub paymaster: PaymasterClient,
    pub chain: ChainClient,
    pub indexer: IndexerClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, StateError> {
        Self::with_store(config, CredentialStore::new())
    }

    pub fn with_store(config: AppConfig, store: CredentialStore) -> Result<Self, StateError> {
        let bearer = BearerVerifier::new(&config.service_api_secret)?;
        let paymaster = PaymasterClient::new(&config.relay, &config.timeouts)?;
        let chain = ChainClient::new(config.rpc_url.clone(), &config.timeouts)?;
        let indexer = IndexerClient::new(config.indexer_base_url.clone(), &config.timeouts)?;

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(store)),
            bearer: Arc::new(bearer),
            paymaster,
            chain,
            indexer,
        })
    }
}
