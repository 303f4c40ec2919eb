//! Ledger RPC collaborator
//!
//! The pipeline consumes exactly three ledger methods: account lookup,
//! program-account scan with filters, and paginated signature listing. They
//! are exposed through the `LedgerRpc` trait so the production JSON-RPC
//! client can be swapped for a scripted double in tests; callers hold an
//! `Arc<dyn LedgerRpc>` injected at startup.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{COMMITMENT_LEVEL, RPC_TIMEOUT_SECS};
use crate::error::{TallyError, TallyResult};
use crate::logger::{self, LogTag};

/// Filter type for getProgramAccounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcFilterType {
    /// Filter by exact account data size
    DataSize(u64),
    /// Filter by memcmp - offset and base58 encoded bytes
    Memcmp { offset: usize, bytes: String },
}

impl RpcFilterType {
    fn to_json(&self) -> serde_json::Value {
        match self {
            RpcFilterType::DataSize(size) => json!({ "dataSize": size }),
            RpcFilterType::Memcmp { offset, bytes } => json!({
                "memcmp": { "offset": offset, "bytes": bytes }
            }),
        }
    }
}

/// Owning program and balance of an account, from getAccountInfo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub owner: Pubkey,
    pub lamports: u64,
}

/// One account returned by a getProgramAccounts scan
#[derive(Debug, Clone)]
pub struct ProgramAccount {
    pub pubkey: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

/// One entry of getSignaturesForAddress, newest-first on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureRecord {
    pub signature: String,
    pub slot: u64,
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default, rename = "blockTime")]
    pub block_time: Option<i64>,
    #[serde(default, rename = "confirmationStatus")]
    pub confirmation_status: Option<String>,
}

/// The ledger methods this tool consumes
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Look up an account's owning program and balance.
    ///
    /// Returns `None` when the account does not exist at the queried
    /// commitment level.
    async fn get_account_summary(&self, address: &Pubkey) -> TallyResult<Option<AccountSummary>>;

    /// Scan a program's account space with server-side filters.
    ///
    /// An empty result is a successful scan, not a failure. Result order is
    /// whatever the node returns.
    async fn get_program_accounts(
        &self,
        program: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> TallyResult<Vec<ProgramAccount>>;

    /// List up to `limit` transaction signatures for an address, newest
    /// first. `before` is the exclusive upper-bound cursor for pagination.
    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
        before: Option<&str>,
    ) -> TallyResult<Vec<SignatureRecord>>;
}

// =============================================================================
// JSON-RPC CLIENT
// =============================================================================

/// Production `LedgerRpc` backed by an HTTP JSON-RPC endpoint
pub struct HttpLedgerClient {
    http: reqwest::Client,
    url: String,
}

impl HttpLedgerClient {
    pub fn new(url: &str) -> TallyResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(RPC_TIMEOUT_SECS))
            .build()
            .map_err(|e| TallyError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC call and return the `result` payload.
    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> TallyResult<serde_json::Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        logger::debug(LogTag::Rpc, &format!("calling {} on {}", method, self.url));

        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| TallyError::Network(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(TallyError::Http(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TallyError::Parse(format!("{} response is not JSON: {}", method, e)))?;

        if let Some(err) = body.get("error") {
            return Err(TallyError::Rpc(format!("{} error: {}", method, err)));
        }

        body.get("result")
            .cloned()
            .ok_or_else(|| TallyError::Parse(format!("{} response missing result", method)))
    }
}

#[async_trait]
impl LedgerRpc for HttpLedgerClient {
    async fn get_account_summary(&self, address: &Pubkey) -> TallyResult<Option<AccountSummary>> {
        let params = json!([
            address.to_string(),
            { "encoding": "jsonParsed", "commitment": COMMITMENT_LEVEL }
        ]);

        let result = self.rpc_call("getAccountInfo", params).await?;
        parse_account_summary(result.get("value").unwrap_or(&serde_json::Value::Null))
    }

    async fn get_program_accounts(
        &self,
        program: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> TallyResult<Vec<ProgramAccount>> {
        let filter_json: Vec<serde_json::Value> = filters.iter().map(|f| f.to_json()).collect();
        let params = json!([
            program.to_string(),
            {
                "encoding": "base64",
                "commitment": COMMITMENT_LEVEL,
                "filters": filter_json,
            }
        ]);

        let result = self.rpc_call("getProgramAccounts", params).await?;
        parse_program_accounts(result)
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
        before: Option<&str>,
    ) -> TallyResult<Vec<SignatureRecord>> {
        let mut config = serde_json::Map::new();
        config.insert("limit".to_string(), json!(limit));
        config.insert("commitment".to_string(), json!(COMMITMENT_LEVEL));
        if let Some(cursor) = before {
            config.insert("before".to_string(), json!(cursor));
        }

        let params = json!([address.to_string(), serde_json::Value::Object(config)]);

        let result = self.rpc_call("getSignaturesForAddress", params).await?;
        parse_signature_records(result)
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

fn parse_pubkey(raw: &str, what: &str) -> TallyResult<Pubkey> {
    Pubkey::from_str(raw)
        .map_err(|e| TallyError::Parse(format!("invalid {} pubkey '{}': {}", what, raw, e)))
}

fn parse_account_summary(value: &serde_json::Value) -> TallyResult<Option<AccountSummary>> {
    if value.is_null() {
        return Ok(None);
    }

    let owner_raw = value
        .get("owner")
        .and_then(|o| o.as_str())
        .ok_or_else(|| TallyError::Parse("account value missing owner".to_string()))?;
    let lamports = value
        .get("lamports")
        .and_then(|l| l.as_u64())
        .ok_or_else(|| TallyError::Parse("account value missing lamports".to_string()))?;

    Ok(Some(AccountSummary {
        owner: parse_pubkey(owner_raw, "owner")?,
        lamports,
    }))
}

#[derive(Debug, Deserialize)]
struct KeyedAccountWire {
    pubkey: String,
    account: AccountWire,
}

#[derive(Debug, Deserialize)]
struct AccountWire {
    lamports: u64,
    data: serde_json::Value,
}

fn parse_program_accounts(result: serde_json::Value) -> TallyResult<Vec<ProgramAccount>> {
    let wires: Vec<KeyedAccountWire> = serde_json::from_value(result)
        .map_err(|e| TallyError::Parse(format!("malformed getProgramAccounts result: {}", e)))?;

    let mut accounts = Vec::with_capacity(wires.len());
    for wire in wires {
        accounts.push(ProgramAccount {
            pubkey: parse_pubkey(&wire.pubkey, "account")?,
            lamports: wire.account.lamports,
            data: decode_account_data(&wire.account.data)?,
        });
    }
    Ok(accounts)
}

/// Decode the `data` field of an account payload. Base64 arrives as a
/// `[content, "base64"]` pair.
fn decode_account_data(value: &serde_json::Value) -> TallyResult<Vec<u8>> {
    if let Some(pair) = value.as_array() {
        let content = pair
            .first()
            .and_then(|c| c.as_str())
            .ok_or_else(|| TallyError::Parse("account data pair missing content".to_string()))?;
        return general_purpose::STANDARD
            .decode(content)
            .map_err(|e| TallyError::Parse(format!("invalid base64 account data: {}", e)));
    }

    Err(TallyError::Parse(format!(
        "unexpected account data encoding: {}",
        value
    )))
}

fn parse_signature_records(result: serde_json::Value) -> TallyResult<Vec<SignatureRecord>> {
    serde_json::from_value(result).map_err(|e| {
        TallyError::Parse(format!("malformed getSignaturesForAddress result: {}", e))
    })
}
