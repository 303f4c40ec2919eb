/// Global constants used across staketally
///
/// System-wide constants that are not configurable and are used across
/// multiple modules.

// ============================================================================
// SOLANA BLOCKCHAIN CONSTANTS
// ============================================================================

/// Serialized size of an initialized stake account, in bytes
pub const STAKE_ACCOUNT_DATA_SIZE: u64 = 200;

/// Byte offset of the withdraw authority inside the stake account layout
/// (4-byte state tag + 8-byte rent reserve + 32-byte staker)
pub const STAKE_WITHDRAW_AUTHORITY_OFFSET: usize = 44;

/// Commitment level used for every ledger query
pub const COMMITMENT_LEVEL: &str = "confirmed";

// ============================================================================
// RPC DEFAULTS
// ============================================================================

/// Public endpoint used when no RPC URL is configured
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Environment variable consulted for the RPC endpoint
pub const RPC_URL_ENV: &str = "STAKETALLY_RPC_URL";

/// Maximum signatures returned per getSignaturesForAddress page
pub const SIGNATURE_PAGE_LIMIT: usize = 1000;

/// HTTP request timeout for ledger calls, in seconds
pub const RPC_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// RETRY DEFAULTS
// ============================================================================

/// Attempt ceiling for each remote operation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Initial backoff delay, doubled after each failed attempt
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
