//! Directory-name grammar of an ACID table layout.
//!
//! Transaction metadata lives only in directory names, so this scanner is the
//! single source of truth for it:
//!
//! ```text
//! base_dir     := "base_" digits ("_v" digits)? ("/" rest)?
//! delta_dir    := "delta_" digits "_" digits (("_" digits) | ("_v" digits))? ("/" rest)?
//! delete_delta := "delete_" delta_dir
//! ```
//!
//! Examples that match:
//! - `base_0000005/abc.txt`, `base_0000003_v0003217/000000_0`
//! - `delta_0000006_0000006/000000_0`, `delta_0000009_0000009_0000/0000/def.txt`
//! - `delete_delta_0000007_0000007/bucket_00000`
//!
//! Digit runs are ASCII-only and must fit a non-negative i64; anything else is
//! "no match", never an error. The three forms are prefix-distinguished, so a
//! path matches at most one of them.

use std::fmt;

use serde::Serialize;

use crate::consts::{
    BASE_PREFIX, DELETE_PREFIX, DELTA_PREFIX, NO_ID, SENTINEL_BASE_WRITE_ID, STATEMENT_ID_WIDTH,
    VISIBILITY_MARKER, WRITE_ID_WIDTH,
};

/// Parsed `base_<writeId>[_v<visibilityTxnId>]` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParsedBase {
    /// `SENTINEL_BASE_WRITE_ID` when the path is not inside a base directory.
    pub write_id: i64,
    /// -1 when the base carries no visibility gate.
    pub visibility_txn_id: i64,
}

impl ParsedBase {
    const NOT_A_BASE: ParsedBase = ParsedBase {
        write_id: SENTINEL_BASE_WRITE_ID,
        visibility_txn_id: NO_ID,
    };

    #[inline]
    pub fn is_base(&self) -> bool {
        self.write_id != SENTINEL_BASE_WRITE_ID
    }

    /// Canonical directory name, e.g. `base_0000005` or `base_0000003_v0003217`.
    pub fn dir_name(&self) -> String {
        let mut s = format!("{BASE_PREFIX}{:0w$}", self.write_id, w = WRITE_ID_WIDTH);
        if self.visibility_txn_id >= 0 {
            s.push_str(&format!(
                "{VISIBILITY_MARKER}{:0w$}",
                self.visibility_txn_id,
                w = WRITE_ID_WIDTH
            ));
        }
        s
    }
}

/// Parsed `delta_<min>_<max>[_<stmt>|_v<txn>]` (or `delete_delta_...`) directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParsedDelta {
    pub min_write_id: i64,
    pub max_write_id: i64,
    /// -1 when absent.
    pub statement_id: i64,
    /// -1 when absent. Mutually exclusive with `statement_id`.
    pub visibility_txn_id: i64,
}

impl ParsedDelta {
    /// Delta spans more than one writer (minor compaction output).
    #[inline]
    pub fn is_multi_write(&self) -> bool {
        self.min_write_id != self.max_write_id
    }

    /// Canonical delta directory name.
    pub fn dir_name(&self) -> String {
        let mut s = format!(
            "{DELTA_PREFIX}{:0w$}_{:0w$}",
            self.min_write_id,
            self.max_write_id,
            w = WRITE_ID_WIDTH
        );
        if self.statement_id >= 0 {
            s.push_str(&format!("_{:0w$}", self.statement_id, w = STATEMENT_ID_WIDTH));
        } else if self.visibility_txn_id >= 0 {
            s.push_str(&format!(
                "{VISIBILITY_MARKER}{:0w$}",
                self.visibility_txn_id,
                w = WRITE_ID_WIDTH
            ));
        }
        s
    }

    /// Canonical delete-delta directory name.
    pub fn delete_dir_name(&self) -> String {
        format!("{DELETE_PREFIX}{}", self.dir_name())
    }
}

/// Classification of a path relative to the table/partition root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcidPath {
    Base(ParsedBase),
    Delta(ParsedDelta),
    DeleteDelta(ParsedDelta),
    /// Not in any versioned directory (pre-upgrade "original" file).
    Unclassified,
}

impl AcidPath {
    pub fn kind(&self) -> &'static str {
        match self {
            AcidPath::Base(_) => "base",
            AcidPath::Delta(_) => "delta",
            AcidPath::DeleteDelta(_) => "delete_delta",
            AcidPath::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for AcidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcidPath::Base(b) => write!(
                f,
                "base(write_id={}, visibility_txn_id={})",
                b.write_id, b.visibility_txn_id
            ),
            AcidPath::Delta(d) | AcidPath::DeleteDelta(d) => write!(
                f,
                "{}(min={}, max={}, stmt={}, visibility_txn_id={})",
                self.kind(),
                d.min_write_id,
                d.max_write_id,
                d.statement_id,
                d.visibility_txn_id
            ),
            AcidPath::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Classify a relative path against base, delta and delete-delta forms.
pub fn classify(rel_path: &str) -> AcidPath {
    let base = parse_base(rel_path);
    if base.is_base() {
        return AcidPath::Base(base);
    }
    if let Some(d) = parse_delta(rel_path) {
        return AcidPath::Delta(d);
    }
    if let Some(d) = parse_delete_delta(rel_path) {
        return AcidPath::DeleteDelta(d);
    }
    AcidPath::Unclassified
}

/// Parse a base directory path. Non-base paths yield a `ParsedBase` whose
/// `write_id` is `SENTINEL_BASE_WRITE_ID`.
pub fn parse_base(rel_path: &str) -> ParsedBase {
    scan_base(rel_path).unwrap_or(ParsedBase::NOT_A_BASE)
}

/// Base write id of `rel_path`, or `SENTINEL_BASE_WRITE_ID`.
#[inline]
pub fn base_write_id(rel_path: &str) -> i64 {
    parse_base(rel_path).write_id
}

pub fn parse_delta(rel_path: &str) -> Option<ParsedDelta> {
    scan_delta_body(rel_path.strip_prefix(DELTA_PREFIX)?)
}

pub fn parse_delete_delta(rel_path: &str) -> Option<ParsedDelta> {
    let body = rel_path.strip_prefix(DELETE_PREFIX)?;
    scan_delta_body(body.strip_prefix(DELTA_PREFIX)?)
}

fn scan_base(rel_path: &str) -> Option<ParsedBase> {
    let rest = rel_path.strip_prefix(BASE_PREFIX)?;
    let (write_id, rest) = take_id(rest)?;
    let (visibility_txn_id, rest) = match visibility_suffix(rest) {
        Some((v, r)) => (v, r),
        None => (NO_ID, rest),
    };
    if !is_path_tail(rest) {
        return None;
    }
    Some(ParsedBase {
        write_id,
        visibility_txn_id,
    })
}

/// `<min>_<max>[_<stmt>|_v<txn>][/rest]` — everything after "delta_".
fn scan_delta_body(body: &str) -> Option<ParsedDelta> {
    let (min_write_id, rest) = take_id(body)?;
    let (max_write_id, rest) = take_id(rest.strip_prefix('_')?)?;

    let mut statement_id = NO_ID;
    let mut visibility_txn_id = NO_ID;
    let rest = if let Some((v, r)) = visibility_suffix(rest) {
        visibility_txn_id = v;
        r
    } else if let Some((s, r)) = rest.strip_prefix('_').and_then(take_id) {
        statement_id = s;
        r
    } else {
        rest
    };

    if !is_path_tail(rest) {
        return None;
    }
    Some(ParsedDelta {
        min_write_id,
        max_write_id,
        statement_id,
        visibility_txn_id,
    })
}

fn visibility_suffix(s: &str) -> Option<(i64, &str)> {
    take_id(s.strip_prefix(VISIBILITY_MARKER)?)
}

// Either the directory name itself or something nested below it.
#[inline]
fn is_path_tail(s: &str) -> bool {
    s.is_empty() || s.starts_with('/')
}

/// Take the leading run of ASCII digits as a non-negative i64.
/// Empty runs and values above i64::MAX are rejected (no wrapping).
fn take_id(s: &str) -> Option<(i64, &str)> {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let mut v: i64 = 0;
    for b in s[..end].bytes() {
        v = v.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
    }
    Some((v, &s[end..]))
}
