//! Layout errors that abort a resolution.
//!
//! Both are fatal for the whole call: the caller gets no file list and must
//! surface the message. Compacting the table is the only fix.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcidError {
    #[error(
        "Table is minor compacted which is not supported: {path} covers write ids \
         [{min_write_id}, {max_write_id}]. Run major compaction to resolve this."
    )]
    UnsupportedMinorCompaction {
        path: String,
        min_write_id: i64,
        max_write_id: i64,
    },

    #[error(
        "Table has deleted rows which is not supported: {path} deletes up to write id \
         {max_write_id} past base write id {base}. Run major compaction to resolve this.",
        base = fmt_base(.max_base_write_id)
    )]
    UnsupportedVisibleDeletes {
        path: String,
        max_write_id: i64,
        /// None when no valid base exists.
        max_base_write_id: Option<i64>,
    },
}

fn fmt_base(id: &Option<i64>) -> String {
    id.map_or_else(|| "(none)".to_string(), |v| v.to_string())
}
