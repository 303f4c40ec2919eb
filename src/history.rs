//! Signature history retrieval
//!
//! Walks an address's complete signature history backward with cursor-based
//! pagination: pages of up to 1000 newest-first records, `before` set to the
//! oldest signature of the previous page, stopping on the first page shorter
//! than the limit (including an empty one). The loop always terminates -
//! once the true end of history is reached the node returns a short page,
//! even when the total is an exact multiple of the page size.
//!
//! The whole multi-page walk is one retryable unit: a mid-pagination failure
//! restarts the fetch from the beginning rather than resuming a cursor.

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::constants::SIGNATURE_PAGE_LIMIT;
use crate::error::TallyResult;
use crate::logger::{self, LogTag};
use crate::retry::{with_retry, RetrySettings};
use crate::rpc::{LedgerRpc, SignatureRecord};

/// Fetch the complete signature history for one address.
pub async fn fetch_signature_history(
    rpc: &Arc<dyn LedgerRpc>,
    address: &Pubkey,
    retry: &RetrySettings,
) -> TallyResult<Vec<SignatureRecord>> {
    let history = with_retry("signature history", retry, || collect_pages(rpc, address)).await?;

    logger::debug(
        LogTag::History,
        &format!("{} has {} signature(s)", address, history.len()),
    );

    Ok(history)
}

async fn collect_pages(
    rpc: &Arc<dyn LedgerRpc>,
    address: &Pubkey,
) -> TallyResult<Vec<SignatureRecord>> {
    let mut history: Vec<SignatureRecord> = Vec::new();
    let mut before: Option<String> = None;

    loop {
        let batch = rpc
            .get_signatures_for_address(address, SIGNATURE_PAGE_LIMIT, before.as_deref())
            .await?;

        let batch_len = batch.len();
        before = batch.last().map(|record| record.signature.clone());
        history.extend(batch);

        if batch_len < SIGNATURE_PAGE_LIMIT {
            return Ok(history);
        }

        logger::debug(
            LogTag::History,
            &format!(
                "{}: full page of {}, continuing before {}",
                address,
                batch_len,
                before.as_deref().unwrap_or("-")
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLedger;

    #[tokio::test]
    async fn test_pagination_concatenates_until_short_page() {
        let address = Pubkey::new_unique();
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.push_signature_pages(&address, &[1000, 1000, 200]);
        let rpc: Arc<dyn LedgerRpc> = ledger.clone();

        let history = fetch_signature_history(&rpc, &address, &RetrySettings::default())
            .await
            .unwrap();

        assert_eq!(history.len(), 2200);
        assert_eq!(ledger.signature_calls_for(&address), 3);
    }

    #[tokio::test]
    async fn test_terminates_on_exact_page_multiple() {
        let address = Pubkey::new_unique();
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.push_signature_pages(&address, &[1000, 0]);
        let rpc: Arc<dyn LedgerRpc> = ledger.clone();

        let history = fetch_signature_history(&rpc, &address, &RetrySettings::default())
            .await
            .unwrap();

        assert_eq!(history.len(), 1000);
        assert_eq!(ledger.signature_calls_for(&address), 2);
    }

    #[tokio::test]
    async fn test_empty_history() {
        let address = Pubkey::new_unique();
        let rpc: Arc<dyn LedgerRpc> = Arc::new(ScriptedLedger::new());

        let history = fetch_signature_history(&rpc, &address, &RetrySettings::default())
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_cursor_follows_oldest_signature() {
        let address = Pubkey::new_unique();
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.push_signature_pages(&address, &[1000, 5]);
        let rpc: Arc<dyn LedgerRpc> = ledger.clone();

        fetch_signature_history(&rpc, &address, &RetrySettings::default())
            .await
            .unwrap();

        let cursors = ledger.signature_cursors_for(&address);
        assert_eq!(cursors[0], None);
        // second request resumes before the last record of the first page
        assert_eq!(cursors[1].as_deref(), Some("sig-999"));
    }
}
