//! Runtime configuration
//!
//! One RPC endpoint plus the retry parameters. Endpoint resolution order:
//! CLI flag, then the `STAKETALLY_RPC_URL` environment variable, then the
//! public default endpoint.

use std::env;
use std::time::Duration;

use crate::constants::{DEFAULT_RPC_URL, RPC_URL_ENV};
use crate::retry::RetrySettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub retry: RetrySettings,
}

impl Config {
    pub fn resolve(cli_rpc_url: Option<String>, max_attempts: u32, retry_delay_ms: u64) -> Self {
        let rpc_url = cli_rpc_url
            .or_else(|| env::var(RPC_URL_ENV).ok())
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        Self {
            rpc_url,
            retry: RetrySettings {
                max_attempts,
                initial_delay: Duration::from_millis(retry_delay_ms),
            },
        }
    }
}
