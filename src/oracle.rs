//! Transaction / write-id validity capabilities consumed by the predicate.
//!
//! The resolver only ever asks three questions, so they are modelled as two
//! narrow traits. Concrete reader-side snapshot lists are provided for the CLI
//! and tests:
//! - `ValidTxnList`: "hwm:minOpen:open,ids:aborted,ids"
//! - `ValidWriteIdList`: "table:hwm:minOpen:open,ids:aborted,ids"
//! - `AllValid`: everything committed.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Answer of a write-id range check over `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeResponse {
    /// Every write id in the range is valid.
    All,
    /// No write id in the range is valid.
    None,
    /// Partially valid.
    Some,
}

pub trait TxnValidity {
    fn is_txn_valid(&self, txn_id: i64) -> bool;
}

pub trait WriteIdValidity {
    /// A base produced by `write_id` may be read.
    fn is_valid_base(&self, write_id: i64) -> bool;
    fn is_write_id_range_valid(&self, min_write_id: i64, max_write_id: i64) -> RangeResponse;
}

impl<T: TxnValidity + ?Sized> TxnValidity for &T {
    fn is_txn_valid(&self, txn_id: i64) -> bool {
        (**self).is_txn_valid(txn_id)
    }
}

impl<T: WriteIdValidity + ?Sized> WriteIdValidity for &T {
    fn is_valid_base(&self, write_id: i64) -> bool {
        (**self).is_valid_base(write_id)
    }
    fn is_write_id_range_valid(&self, min_write_id: i64, max_write_id: i64) -> RangeResponse {
        (**self).is_write_id_range_valid(min_write_id, max_write_id)
    }
}

/// Oracle that treats every transaction and write id as committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllValid;

impl TxnValidity for AllValid {
    fn is_txn_valid(&self, _txn_id: i64) -> bool {
        true
    }
}

impl WriteIdValidity for AllValid {
    fn is_valid_base(&self, _write_id: i64) -> bool {
        true
    }
    fn is_write_id_range_valid(&self, _min: i64, _max: i64) -> RangeResponse {
        RangeResponse::All
    }
}

// -------- Transactions --------

/// Reader view of the global transaction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidTxnList {
    pub high_watermark: i64,
    /// Open transactions at snapshot time.
    #[serde(default)]
    pub open: BTreeSet<i64>,
    #[serde(default)]
    pub aborted: BTreeSet<i64>,
}

impl ValidTxnList {
    pub fn new(high_watermark: i64) -> Self {
        Self {
            high_watermark,
            open: BTreeSet::new(),
            aborted: BTreeSet::new(),
        }
    }

    pub fn with_open<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.open.extend(ids);
        self
    }

    pub fn with_aborted<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.aborted.extend(ids);
        self
    }

    pub fn min_open(&self) -> Option<i64> {
        self.open.iter().next().copied()
    }
}

impl TxnValidity for ValidTxnList {
    fn is_txn_valid(&self, txn_id: i64) -> bool {
        txn_id <= self.high_watermark
            && !self.open.contains(&txn_id)
            && !self.aborted.contains(&txn_id)
    }
}

impl FromStr for ValidTxnList {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 4 {
            return Err(anyhow!(
                "txn list '{s}': expected 'hwm:minOpen:open:aborted', got {} field(s)",
                parts.len()
            ));
        }
        let high_watermark = parse_i64(parts[0]).context("txn list high watermark")?;
        // parts[1] (minOpen) is derived from the open set; parsed only for validation.
        parse_i64(parts[1]).context("txn list min open")?;
        Ok(Self {
            high_watermark,
            open: parse_id_set(parts[2]).context("txn list open ids")?,
            aborted: parse_id_set(parts[3]).context("txn list aborted ids")?,
        })
    }
}

impl fmt::Display for ValidTxnList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.high_watermark,
            self.min_open().unwrap_or(i64::MAX),
            join_ids(&self.open),
            join_ids(&self.aborted)
        )
    }
}

// -------- Write ids --------

/// Reader view of one table's write ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidWriteIdList {
    /// Fully qualified table name ("db.table").
    #[serde(default)]
    pub table: String,
    pub high_watermark: i64,
    #[serde(default)]
    pub open: BTreeSet<i64>,
    #[serde(default)]
    pub aborted: BTreeSet<i64>,
}

impl ValidWriteIdList {
    pub fn new<S: Into<String>>(table: S, high_watermark: i64) -> Self {
        Self {
            table: table.into(),
            high_watermark,
            open: BTreeSet::new(),
            aborted: BTreeSet::new(),
        }
    }

    pub fn with_open<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.open.extend(ids);
        self
    }

    pub fn with_aborted<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.aborted.extend(ids);
        self
    }

    pub fn min_open(&self) -> Option<i64> {
        self.open.iter().next().copied()
    }

    fn exceptions_in(&self, min: i64, max: i64) -> u64 {
        let open = self.open.range(min..=max).count();
        let aborted = self.aborted.range(min..=max).count();
        (open + aborted) as u64
    }
}

impl WriteIdValidity for ValidWriteIdList {
    fn is_valid_base(&self, write_id: i64) -> bool {
        // Base is only readable if nothing below it is still open.
        let below_open = self.min_open().map_or(true, |m| write_id < m);
        below_open && write_id <= self.high_watermark
    }

    fn is_write_id_range_valid(&self, min_write_id: i64, max_write_id: i64) -> RangeResponse {
        if min_write_id > self.high_watermark {
            return RangeResponse::None;
        }
        if max_write_id < min_write_id {
            return RangeResponse::None;
        }
        // Ids above the watermark are not yet committed from this reader's view.
        let above_hwm = max_write_id.saturating_sub(self.high_watermark).max(0) as u64;
        let invalid =
            above_hwm + self.exceptions_in(min_write_id, max_write_id.min(self.high_watermark));
        if invalid == 0 {
            return RangeResponse::All;
        }
        let span = (max_write_id as i128 - min_write_id as i128 + 1) as u128;
        if u128::from(invalid) == span {
            RangeResponse::None
        } else {
            RangeResponse::Some
        }
    }
}

impl FromStr for ValidWriteIdList {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 5 {
            return Err(anyhow!(
                "write id list '{s}': expected 'table:hwm:minOpen:open:aborted', got {} field(s)",
                parts.len()
            ));
        }
        let high_watermark = parse_i64(parts[1]).context("write id list high watermark")?;
        parse_i64(parts[2]).context("write id list min open")?;
        Ok(Self {
            table: parts[0].to_string(),
            high_watermark,
            open: parse_id_set(parts[3]).context("write id list open ids")?,
            aborted: parse_id_set(parts[4]).context("write id list aborted ids")?,
        })
    }
}

impl fmt::Display for ValidWriteIdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.table,
            self.high_watermark,
            self.min_open().unwrap_or(i64::MAX),
            join_ids(&self.open),
            join_ids(&self.aborted)
        )
    }
}

fn parse_i64(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .with_context(|| format!("invalid id '{s}'"))
}

fn parse_id_set(s: &str) -> Result<BTreeSet<i64>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(BTreeSet::new());
    }
    s.split(',').map(parse_i64).collect()
}

fn join_ids(ids: &BTreeSet<i64>) -> String {
    ids.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
