//! Commit-visibility predicate for one relative path.
//!
//! Checks that the path belongs to a committed, visible version:
//! - base: write id is a valid base and its visibility txn (if any) committed;
//! - delta / delete-delta: the whole write id range is valid (partially valid
//!   ranges are rejected here);
//! - anything else: visible, so tables written before the ACID layout still read.

use crate::consts::NO_ID;
use crate::grammar::{classify, AcidPath};
use crate::oracle::{RangeResponse, TxnValidity, WriteIdValidity};

pub struct SnapshotPredicate<'a> {
    txns: &'a dyn TxnValidity,
    write_ids: &'a dyn WriteIdValidity,
}

impl<'a> SnapshotPredicate<'a> {
    pub fn new(txns: &'a dyn TxnValidity, write_ids: &'a dyn WriteIdValidity) -> Self {
        Self { txns, write_ids }
    }

    pub fn is_visible(&self, rel_path: &str) -> bool {
        self.admits(&classify(rel_path))
    }

    /// Same decision as `is_visible` for an already classified path.
    pub fn admits(&self, path: &AcidPath) -> bool {
        match path {
            AcidPath::Base(b) => {
                self.write_ids.is_valid_base(b.write_id) && self.is_txn_valid(b.visibility_txn_id)
            }
            AcidPath::Delta(d) | AcidPath::DeleteDelta(d) => {
                self.write_ids
                    .is_write_id_range_valid(d.min_write_id, d.max_write_id)
                    == RangeResponse::All
            }
            AcidPath::Unclassified => true,
        }
    }

    fn is_txn_valid(&self, visibility_txn_id: i64) -> bool {
        visibility_txn_id == NO_ID || self.txns.is_txn_valid(visibility_txn_id)
    }
}
