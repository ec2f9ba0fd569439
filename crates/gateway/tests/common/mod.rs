//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use gg_domain::config::Config;
use gg_domain::error::Error;
use gg_gateway::state::AppState;
use gg_providers::InferenceClient;

#[path = "../../src/test_support.rs"]
mod test_support;

pub use test_support::{MockClient, Step};

pub fn upstream_failure() -> Error {
    Error::Provider {
        provider: "mock".into(),
        message: "HTTP 503 - overloaded".into(),
    }
}

/// Default config with the static directory pointed somewhere empty.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.static_dir = "/nonexistent/geminiguard-static".into();
    config
}

pub fn state_with(client: Arc<MockClient>, config: Config) -> AppState {
    AppState::new(Arc::new(config), Some(client as Arc<dyn InferenceClient>))
}
