//! Stake account discovery
//!
//! Scans the stake program's account space for accounts controlled by a given
//! authority: fixed 200-byte record size, withdraw authority at offset 44
//! matching the authority's raw key bytes. This is a filter predicate over
//! the scan, not a stake-state decode.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::stake::program as stake_program;
use std::sync::Arc;

use crate::constants::{STAKE_ACCOUNT_DATA_SIZE, STAKE_WITHDRAW_AUTHORITY_OFFSET};
use crate::error::TallyResult;
use crate::logger::{self, LogTag};
use crate::retry::{with_retry, RetrySettings};
use crate::rpc::{LedgerRpc, ProgramAccount, RpcFilterType};

/// A stake account discovered for an authority: its own address plus the raw
/// fields the scan returned. Only the identity matters downstream.
#[derive(Debug, Clone)]
pub struct StakeAccountRecord {
    pub pubkey: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

impl From<ProgramAccount> for StakeAccountRecord {
    fn from(account: ProgramAccount) -> Self {
        Self {
            pubkey: account.pubkey,
            lamports: account.lamports,
            data: account.data,
        }
    }
}

/// Build the scan filters for one authority.
fn authority_filters(authority: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::DataSize(STAKE_ACCOUNT_DATA_SIZE),
        RpcFilterType::Memcmp {
            offset: STAKE_WITHDRAW_AUTHORITY_OFFSET,
            bytes: bs58::encode(authority.to_bytes()).into_string(),
        },
    ]
}

/// Find every stake account whose withdraw authority equals `authority`.
///
/// An empty result means "no stake accounts", which is a success. The scan is
/// retried as one unit on transient failure.
pub async fn find_stake_accounts(
    rpc: &Arc<dyn LedgerRpc>,
    authority: &Pubkey,
    retry: &RetrySettings,
) -> TallyResult<Vec<StakeAccountRecord>> {
    let program = stake_program::id();
    let accounts = with_retry("stake account scan", retry, || {
        rpc.get_program_accounts(&program, authority_filters(authority))
    })
    .await?;

    logger::debug(
        LogTag::Stake,
        &format!(
            "found {} stake account(s) for authority {}",
            accounts.len(),
            authority
        ),
    );

    Ok(accounts.into_iter().map(StakeAccountRecord::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLedger;

    #[test]
    fn test_authority_filters_shape() {
        let authority = Pubkey::new_unique();
        let filters = authority_filters(&authority);

        assert_eq!(filters[0], RpcFilterType::DataSize(200));
        match &filters[1] {
            RpcFilterType::Memcmp { offset, bytes } => {
                assert_eq!(*offset, 44);
                let decoded = bs58::decode(bytes).into_vec().unwrap();
                assert_eq!(decoded, authority.to_bytes());
            }
            other => panic!("expected memcmp filter, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolves_scripted_stake_accounts() {
        let authority = Pubkey::new_unique();
        let stake_pubkey = Pubkey::new_unique();

        let ledger = ScriptedLedger::new();
        ledger.add_stake_account(&authority, stake_pubkey);
        let rpc: Arc<dyn LedgerRpc> = Arc::new(ledger);

        let records = find_stake_accounts(&rpc, &authority, &RetrySettings::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pubkey, stake_pubkey);
    }

    #[tokio::test]
    async fn test_empty_scan_is_success() {
        let rpc: Arc<dyn LedgerRpc> = Arc::new(ScriptedLedger::new());
        let records = find_stake_accounts(&rpc, &Pubkey::new_unique(), &RetrySettings::default())
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
