//! Account classification
//!
//! Two independent signals per address, each computed exactly once:
//! whether the account itself is owned by the stake program, and whether any
//! stake accounts name it as their withdraw authority. The pair maps through
//! a four-way decision table; the resolved stake accounts are returned with
//! the kind so no caller ever repeats the scan.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::stake::program as stake_program;
use std::sync::Arc;

use crate::error::TallyResult;
use crate::logger::{self, LogTag};
use crate::retry::{with_retry, RetrySettings};
use crate::rpc::LedgerRpc;
use crate::stake::{find_stake_accounts, StakeAccountRecord};

/// Classification result for one address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    /// The account itself is owned by the stake program
    StakeAccount,
    /// Not a stake account, but controls at least one
    AuthorityAccount,
    /// Neither signal
    NormalAccount,
    /// Both signals at once - no coherent account looks like this, so it is
    /// surfaced instead of being counted under either branch
    Indeterminate,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::StakeAccount => "stake account",
            AccountKind::AuthorityAccount => "authority account",
            AccountKind::NormalAccount => "normal account",
            AccountKind::Indeterminate => "indeterminate",
        }
    }
}

/// Kind plus the stake accounts discovered while computing it
#[derive(Debug, Clone)]
pub struct Classification {
    pub kind: AccountKind,
    pub stake_accounts: Vec<StakeAccountRecord>,
}

/// Map the two signals through the decision table.
fn decide(is_stake_account: bool, has_associated_stake_accounts: bool) -> AccountKind {
    match (is_stake_account, has_associated_stake_accounts) {
        (true, true) => AccountKind::Indeterminate,
        (true, false) => AccountKind::StakeAccount,
        (false, true) => AccountKind::AuthorityAccount,
        (false, false) => AccountKind::NormalAccount,
    }
}

/// Classify one address. RPC failures propagate from the retry layer; no
/// additional retries are added here.
pub async fn classify_address(
    rpc: &Arc<dyn LedgerRpc>,
    address: &Pubkey,
    retry: &RetrySettings,
) -> TallyResult<Classification> {
    let summary = with_retry("account lookup", retry, || {
        rpc.get_account_summary(address)
    })
    .await?;

    let is_stake_account = summary
        .map(|s| s.owner == stake_program::id())
        .unwrap_or(false);

    let stake_accounts = find_stake_accounts(rpc, address, retry).await?;
    let kind = decide(is_stake_account, !stake_accounts.is_empty());

    logger::debug(
        LogTag::Classifier,
        &format!(
            "{} classified as {} ({} associated stake account(s))",
            address,
            kind.as_str(),
            stake_accounts.len()
        ),
    );

    Ok(Classification {
        kind,
        stake_accounts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLedger;

    fn into_rpc(ledger: ScriptedLedger) -> Arc<dyn LedgerRpc> {
        Arc::new(ledger)
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(decide(true, false), AccountKind::StakeAccount);
        assert_eq!(decide(false, true), AccountKind::AuthorityAccount);
        assert_eq!(decide(false, false), AccountKind::NormalAccount);
        assert_eq!(decide(true, true), AccountKind::Indeterminate);
    }

    #[tokio::test]
    async fn test_stake_owned_account_is_stake_account() {
        let address = Pubkey::new_unique();
        let ledger = ScriptedLedger::new();
        ledger.set_owner(&address, stake_program::id());

        let classification =
            classify_address(&into_rpc(ledger), &address, &RetrySettings::default())
                .await
                .unwrap();
        assert_eq!(classification.kind, AccountKind::StakeAccount);
        assert!(classification.stake_accounts.is_empty());
    }

    #[tokio::test]
    async fn test_authority_account_keeps_resolved_records() {
        let address = Pubkey::new_unique();
        let stake_pubkey = Pubkey::new_unique();
        let ledger = ScriptedLedger::new();
        ledger.set_owner(&address, solana_sdk::system_program::id());
        ledger.add_stake_account(&address, stake_pubkey);

        let classification =
            classify_address(&into_rpc(ledger), &address, &RetrySettings::default())
                .await
                .unwrap();
        assert_eq!(classification.kind, AccountKind::AuthorityAccount);
        assert_eq!(classification.stake_accounts.len(), 1);
        assert_eq!(classification.stake_accounts[0].pubkey, stake_pubkey);
    }

    #[tokio::test]
    async fn test_missing_account_without_stakes_is_normal() {
        let classification = classify_address(
            &into_rpc(ScriptedLedger::new()),
            &Pubkey::new_unique(),
            &RetrySettings::default(),
        )
        .await
        .unwrap();
        assert_eq!(classification.kind, AccountKind::NormalAccount);
    }

    #[tokio::test]
    async fn test_conflicting_signals_are_indeterminate() {
        let address = Pubkey::new_unique();
        let ledger = ScriptedLedger::new();
        ledger.set_owner(&address, stake_program::id());
        ledger.add_stake_account(&address, Pubkey::new_unique());

        let classification =
            classify_address(&into_rpc(ledger), &address, &RetrySettings::default())
                .await
                .unwrap();
        assert_eq!(classification.kind, AccountKind::Indeterminate);
    }
}
