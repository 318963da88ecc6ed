//! Ledger constants. All monetary values are fixed-point units (1.0 = 10^8 units).

/// Units per whole coin.
pub const COIN: i64 = 100_000_000;

/// Default bound on how many in-batch producers a single dependency
/// exploration may descend through.
pub const DEFAULT_MAX_DEPENDENCY_DEPTH: usize = 256;

/// Prefix for configuration environment variables (`SCRIP_STRATEGY`, ...).
pub const ENV_PREFIX: &str = "SCRIP";
