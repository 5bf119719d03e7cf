//! acidlens — snapshot file visibility for Hive-ACID style table directories.
//!
//! Layers, leaves first: `grammar` (directory names -> version metadata),
//! `predicate` (commit visibility of one path), `resolver` (two-pass filter over
//! a partition listing).

pub mod consts;
pub mod grammar;
pub mod oracle;
pub mod predicate;
pub mod resolver;
pub mod error;
pub mod metrics;
pub mod props;
pub mod config;
pub mod listing;
pub mod cli;

// Удобные реэкспорты
pub use config::AcidConfig;
pub use error::AcidError;
pub use grammar::{
    base_write_id, classify, parse_base, parse_delete_delta, parse_delta, AcidPath, ParsedBase,
    ParsedDelta,
};
pub use metrics::{SkipCounts, SkipStats};
pub use oracle::{
    AllValid, RangeResponse, TxnValidity, ValidTxnList, ValidWriteIdList, WriteIdValidity,
};
pub use predicate::SnapshotPredicate;
pub use props::{
    is_full_acid_table, is_insert_only_table, is_transactional_table, set_transactional_properties,
    TransactionalType,
};
pub use resolver::{relativize, resolve, AcidFile, AcidFileFilter, FileEntry};
