//! Transaction count aggregation
//!
//! Drives the full pipeline for each address in turn: classify, fetch the
//! relevant signature histories, and fold everything into a single total.
//! Failures are isolated per address - each one becomes an explicit outcome
//! value instead of aborting the run, and the final total is a reduction
//! over the outcome list.

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::classifier::{classify_address, AccountKind};
use crate::error::TallyResult;
use crate::history::fetch_signature_history;
use crate::logger::{self, LogTag};
use crate::retry::RetrySettings;
use crate::rpc::LedgerRpc;

/// What happened to one address
#[derive(Debug, Clone)]
pub enum AddressOutcome {
    /// Counted: its own history plus any associated stake accounts' histories
    Counted {
        address: Pubkey,
        kind: AccountKind,
        own_signatures: usize,
        stake_signatures: usize,
    },
    /// Conflicting classification signals; contributes zero
    Indeterminate { address: Pubkey },
    /// Retries exhausted somewhere in this address's unit of work
    Failed { address: Pubkey, reason: String },
}

impl AddressOutcome {
    /// This outcome's contribution to the run total.
    pub fn contribution(&self) -> u64 {
        match self {
            AddressOutcome::Counted {
                own_signatures,
                stake_signatures,
                ..
            } => (*own_signatures + *stake_signatures) as u64,
            AddressOutcome::Indeterminate { .. } => 0,
            AddressOutcome::Failed { .. } => 0,
        }
    }
}

/// Result of a full run
#[derive(Debug)]
pub struct TallySummary {
    pub outcomes: Vec<AddressOutcome>,
    pub total: u64,
}

/// Process every address sequentially and reduce the outcomes to a total.
pub async fn tally_addresses(
    rpc: &Arc<dyn LedgerRpc>,
    addresses: &[Pubkey],
    retry: &RetrySettings,
) -> TallySummary {
    let mut outcomes = Vec::with_capacity(addresses.len());

    for (index, address) in addresses.iter().enumerate() {
        logger::info(
            LogTag::Tally,
            &format!("processing {} ({}/{})", address, index + 1, addresses.len()),
        );

        let outcome = match process_address(rpc, address, retry).await {
            Ok(outcome) => outcome,
            Err(e) => {
                logger::error(
                    LogTag::Tally,
                    &format!("skipping {} after exhausted retries: {}", address, e),
                );
                AddressOutcome::Failed {
                    address: *address,
                    reason: e.to_string(),
                }
            }
        };

        report_outcome(&outcome);
        outcomes.push(outcome);
    }

    let total = outcomes.iter().map(AddressOutcome::contribution).sum();
    TallySummary { outcomes, total }
}

/// One address's unit of work. Any error escaping here is caught by the
/// caller and turned into a `Failed` outcome.
async fn process_address(
    rpc: &Arc<dyn LedgerRpc>,
    address: &Pubkey,
    retry: &RetrySettings,
) -> TallyResult<AddressOutcome> {
    let classification = classify_address(rpc, address, retry).await?;

    if classification.kind == AccountKind::Indeterminate {
        return Ok(AddressOutcome::Indeterminate { address: *address });
    }

    let own_signatures = fetch_signature_history(rpc, address, retry).await?.len();

    let mut stake_signatures = 0usize;
    if classification.kind == AccountKind::AuthorityAccount {
        for record in &classification.stake_accounts {
            stake_signatures += fetch_signature_history(rpc, &record.pubkey, retry)
                .await?
                .len();
        }
    }

    Ok(AddressOutcome::Counted {
        address: *address,
        kind: classification.kind,
        own_signatures,
        stake_signatures,
    })
}

fn report_outcome(outcome: &AddressOutcome) {
    match outcome {
        AddressOutcome::Counted {
            address,
            kind,
            own_signatures,
            stake_signatures,
        } => {
            logger::info(
                LogTag::Tally,
                &format!(
                    "{} ({}): {} own + {} stake = {} transaction(s)",
                    address,
                    kind.as_str(),
                    own_signatures,
                    stake_signatures,
                    own_signatures + stake_signatures
                ),
            );
        }
        AddressOutcome::Indeterminate { address } => {
            logger::warning(
                LogTag::Tally,
                &format!(
                    "{} reports as a stake account with its own stake accounts; skipping to avoid double counting",
                    address
                ),
            );
        }
        AddressOutcome::Failed { address, reason } => {
            logger::warning(LogTag::Tally, &format!("{} skipped: {}", address, reason));
        }
    }
}
