//! Общие константы раскладки ACID-таблиц (directory prefixes, table properties, sentinels).

// -------- Directory name prefixes --------
pub const BASE_PREFIX: &str = "base_";
pub const DELTA_PREFIX: &str = "delta_";
// delete_delta_<min>_<max>[...]: тот же синтаксис, что у delta, плюс префикс.
pub const DELETE_PREFIX: &str = "delete_";
pub const VISIBILITY_MARKER: &str = "_v";

// Canonical zero padding used by writers (base_0000005, delta_0000006_0000006_0000).
pub const WRITE_ID_WIDTH: usize = 7;
pub const STATEMENT_ID_WIDTH: usize = 4;

// -------- Sentinels --------
/// Write id reported by `parse_base` for paths outside any base directory.
/// Real write ids are non-negative, so this never collides.
pub const SENTINEL_BASE_WRITE_ID: i64 = i64::MIN;
/// "No visibility transaction" / "no statement id".
pub const NO_ID: i64 = -1;

// -------- Table properties --------
pub const TABLE_IS_TRANSACTIONAL: &str = "transactional";
pub const TABLE_TRANSACTIONAL_PROPERTIES: &str = "transactional_properties";
pub const INSERTONLY_TRANSACTIONAL_PROPERTY: &str = "insert_only";

// -------- Remediation --------
pub const COMPACTION_HINT: &str = "Run major compaction to resolve this.";
