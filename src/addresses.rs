//! Address list loading
//!
//! Reads a newline-delimited address file into a validated, deduplicated set.
//! Lines are trimmed, blanks skipped, and candidates checked syntactically
//! with `Pubkey::from_str`; invalid lines are reported and dropped without
//! aborting the load. The read-and-validate pass as a whole is retried so a
//! transient I/O failure does not kill the run before it starts.

use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use crate::error::{TallyError, TallyResult};
use crate::logger::{self, LogTag};
use crate::retry::{with_retry, RetrySettings};

/// Load the address set from a file. Failure here, after retries, is the only
/// fatal error in the pipeline.
pub async fn load_addresses(path: &Path, retry: &RetrySettings) -> TallyResult<Vec<Pubkey>> {
    let addresses = with_retry("address file read", retry, || read_and_validate(path)).await?;

    logger::info(
        LogTag::Loader,
        &format!(
            "loaded {} unique valid address(es) from {}",
            addresses.len(),
            path.display()
        ),
    );

    Ok(addresses)
}

async fn read_and_validate(path: &Path) -> TallyResult<Vec<Pubkey>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TallyError::Input(format!("failed to read {}: {}", path.display(), e)))?;

    Ok(validate_lines(&content))
}

/// Trim, validate and deduplicate raw address lines. Validation failures are
/// permanent: logged and discarded, never retried.
fn validate_lines(content: &str) -> Vec<Pubkey> {
    let mut seen: HashSet<Pubkey> = HashSet::new();
    let mut addresses = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match Pubkey::from_str(line) {
            Ok(address) => {
                if seen.insert(address) {
                    addresses.push(address);
                } else {
                    logger::debug(
                        LogTag::Loader,
                        &format!("line {}: duplicate address {}", index + 1, line),
                    );
                }
            }
            Err(e) => {
                logger::warning(
                    LogTag::Loader,
                    &format!("line {}: dropping invalid address '{}': {}", index + 1, line, e),
                );
            }
        }
    }

    addresses
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ADDR_A: &str = "So11111111111111111111111111111111111111112";
    const ADDR_B: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    #[test]
    fn test_duplicates_collapse() {
        let content = format!("{}\n{}\n{}\n", ADDR_A, ADDR_A, ADDR_B);
        let addresses = validate_lines(&content);
        assert_eq!(addresses.len(), 2);
    }

    #[test]
    fn test_invalid_line_is_dropped_without_aborting() {
        let content = format!("{}\nnot-an-address\n{}\n", ADDR_A, ADDR_B);
        let addresses = validate_lines(&content);
        assert_eq!(
            addresses,
            vec![
                Pubkey::from_str(ADDR_A).unwrap(),
                Pubkey::from_str(ADDR_B).unwrap()
            ]
        );
    }

    #[test]
    fn test_blank_lines_and_whitespace_ignored() {
        let content = format!("\n  {}  \n\n\t\n{}\n", ADDR_A, ADDR_B);
        let addresses = validate_lines(&content);
        assert_eq!(addresses.len(), 2);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", ADDR_A).unwrap();
        writeln!(file, "{}", ADDR_B).unwrap();

        let addresses = load_addresses(file.path(), &RetrySettings::default())
            .await
            .unwrap();
        assert_eq!(addresses.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_input_error() {
        let retry = RetrySettings {
            max_attempts: 2,
            initial_delay: std::time::Duration::from_millis(1),
        };
        let result = load_addresses(Path::new("/nonexistent/addresses.txt"), &retry).await;
        assert!(matches!(result, Err(TallyError::Input(_))));
    }
}
