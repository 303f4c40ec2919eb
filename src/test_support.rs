//! Scripted ledger double for unit tests
//!
//! Implements `LedgerRpc` over in-memory fixtures: account owners, stake
//! account sets keyed by authority, and queued signature pages consumed one
//! per call. Also records call counts and pagination cursors so tests can
//! assert on the exact request sequence.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::stake::program as stake_program;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use crate::constants::{STAKE_ACCOUNT_DATA_SIZE, STAKE_WITHDRAW_AUTHORITY_OFFSET};
use crate::error::{TallyError, TallyResult};
use crate::rpc::{AccountSummary, LedgerRpc, ProgramAccount, RpcFilterType, SignatureRecord};

#[derive(Default)]
pub struct ScriptedLedger {
    owners: Mutex<HashMap<Pubkey, Pubkey>>,
    failing_lookups: Mutex<HashSet<Pubkey>>,
    stake_sets: Mutex<HashMap<Pubkey, Vec<Pubkey>>>,
    signature_pages: Mutex<HashMap<Pubkey, VecDeque<Vec<SignatureRecord>>>>,
    signature_counters: Mutex<HashMap<Pubkey, usize>>,
    signature_calls: Mutex<HashMap<Pubkey, usize>>,
    signature_cursors: Mutex<HashMap<Pubkey, Vec<Option<String>>>>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the owning program reported for an address.
    pub fn set_owner(&self, address: &Pubkey, owner: Pubkey) {
        self.owners.lock().unwrap().insert(*address, owner);
    }

    /// Make every account lookup for this address fail with an RPC error.
    pub fn fail_account_lookups(&self, address: &Pubkey) {
        self.failing_lookups.lock().unwrap().insert(*address);
    }

    /// Script one stake account controlled by `authority`.
    pub fn add_stake_account(&self, authority: &Pubkey, stake_pubkey: Pubkey) {
        self.stake_sets
            .lock()
            .unwrap()
            .entry(*authority)
            .or_default()
            .push(stake_pubkey);
    }

    /// Queue signature pages of the given sizes for an address. Signatures
    /// are named `sig-<n>` with a per-address running counter, so cursors are
    /// distinguishable across pages.
    pub fn push_signature_pages(&self, address: &Pubkey, page_sizes: &[usize]) {
        let mut counters = self.signature_counters.lock().unwrap();
        let counter = counters.entry(*address).or_insert(0);

        let mut pages = self.signature_pages.lock().unwrap();
        let queue = pages.entry(*address).or_default();

        for size in page_sizes {
            let mut page = Vec::with_capacity(*size);
            for _ in 0..*size {
                page.push(SignatureRecord {
                    signature: format!("sig-{}", counter),
                    slot: 1_000_000 - *counter as u64,
                    err: None,
                    memo: None,
                    block_time: None,
                    confirmation_status: Some("confirmed".to_string()),
                });
                *counter += 1;
            }
            queue.push_back(page);
        }
    }

    pub fn signature_calls_for(&self, address: &Pubkey) -> usize {
        self.signature_calls
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    pub fn signature_cursors_for(&self, address: &Pubkey) -> Vec<Option<String>> {
        self.signature_cursors
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    /// Recover the authority a scan is filtering on, enforcing the expected
    /// filter shape along the way.
    fn authority_from_filters(filters: &[RpcFilterType]) -> TallyResult<Pubkey> {
        let has_size_filter = filters
            .iter()
            .any(|f| *f == RpcFilterType::DataSize(STAKE_ACCOUNT_DATA_SIZE));
        if !has_size_filter {
            return Err(TallyError::Rpc(
                "scripted ledger expected a 200-byte dataSize filter".to_string(),
            ));
        }

        for filter in filters {
            if let RpcFilterType::Memcmp { offset, bytes } = filter {
                if *offset != STAKE_WITHDRAW_AUTHORITY_OFFSET {
                    return Err(TallyError::Rpc(format!(
                        "scripted ledger expected offset {}, got {}",
                        STAKE_WITHDRAW_AUTHORITY_OFFSET, offset
                    )));
                }
                let raw = bs58::decode(bytes)
                    .into_vec()
                    .map_err(|e| TallyError::Rpc(format!("bad memcmp bytes: {}", e)))?;
                return Pubkey::try_from(raw.as_slice())
                    .map_err(|_| TallyError::Rpc("bad memcmp pubkey length".to_string()));
            }
        }

        Err(TallyError::Rpc(
            "scripted ledger expected a memcmp filter".to_string(),
        ))
    }
}

#[async_trait]
impl LedgerRpc for ScriptedLedger {
    async fn get_account_summary(&self, address: &Pubkey) -> TallyResult<Option<AccountSummary>> {
        if self.failing_lookups.lock().unwrap().contains(address) {
            return Err(TallyError::Rpc(format!(
                "scripted failure for {}",
                address
            )));
        }

        Ok(self
            .owners
            .lock()
            .unwrap()
            .get(address)
            .map(|owner| AccountSummary {
                owner: *owner,
                lamports: 1,
            }))
    }

    async fn get_program_accounts(
        &self,
        program: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> TallyResult<Vec<ProgramAccount>> {
        if *program != stake_program::id() {
            return Ok(Vec::new());
        }

        let authority = Self::authority_from_filters(&filters)?;
        let stake_pubkeys = self
            .stake_sets
            .lock()
            .unwrap()
            .get(&authority)
            .cloned()
            .unwrap_or_default();

        Ok(stake_pubkeys
            .into_iter()
            .map(|pubkey| ProgramAccount {
                pubkey,
                lamports: 1_000_000,
                data: vec![0u8; STAKE_ACCOUNT_DATA_SIZE as usize],
            })
            .collect())
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        _limit: usize,
        before: Option<&str>,
    ) -> TallyResult<Vec<SignatureRecord>> {
        *self
            .signature_calls
            .lock()
            .unwrap()
            .entry(*address)
            .or_insert(0) += 1;
        self.signature_cursors
            .lock()
            .unwrap()
            .entry(*address)
            .or_default()
            .push(before.map(|s| s.to_string()));

        Ok(self
            .signature_pages
            .lock()
            .unwrap()
            .get_mut(address)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_default())
    }
}
