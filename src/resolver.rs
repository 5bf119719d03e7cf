//! Snapshot file-set resolution for one table/partition.
//!
//! Two passes over a flat (recursively expanded) listing:
//! 1. commit filter: drop everything the `SnapshotPredicate` rejects and find
//!    the max write id among surviving bases;
//! 2. supersession filter, only once that max is final: drop directories,
//!    older bases, deltas folded into the chosen base, delete-delta files and
//!    leftover originals; fail on minor-compacted deltas and on deletes not
//!    yet compacted away.
//!
//! The input is never modified; kept entries are cloned into a new Vec.

use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::AcidConfig;
use crate::error::AcidError;
use crate::grammar::{classify, AcidPath};
use crate::metrics::{self, SkipStats};
use crate::oracle::{TxnValidity, WriteIdValidity};
use crate::predicate::SnapshotPredicate;

/// A listed file or directory, as seen by the resolver.
pub trait AcidFile {
    fn path(&self) -> &Path;
    fn is_dir(&self) -> bool;
}

/// Entry produced by a recursive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub len: u64,
}

impl FileEntry {
    pub fn file<P: Into<PathBuf>>(path: P, len: u64) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            len,
        }
    }

    pub fn dir<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            len: 0,
        }
    }
}

impl AcidFile for FileEntry {
    fn path(&self) -> &Path {
        &self.path
    }
    fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// Path of `path` relative to `base_dir`, '/'-separated.
/// Paths outside `base_dir` come back whole, rooted ('/...') or prefixed with
/// "./", so they never match the grammar and end up treated as originals.
pub fn relativize(path: &Path, base_dir: &Path) -> String {
    match path.strip_prefix(base_dir) {
        Ok(rel) => join_components(rel),
        Err(_) => {
            warn!(
                "relativize: {} is not under {}, using full path",
                path.display(),
                base_dir.display()
            );
            let full = path.to_string_lossy();
            if path.has_root() {
                full.into_owned()
            } else {
                format!("./{full}")
            }
        }
    }
}

fn join_components(rel: &Path) -> String {
    let mut out = String::new();
    for c in rel.components() {
        if let Component::Normal(s) = c {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&s.to_string_lossy());
        }
    }
    out
}

// Survivor of pass 1 with its classification memoized.
struct Candidate<'f, F> {
    file: &'f F,
    rel: String,
    class: AcidPath,
}

pub struct AcidFileFilter<'a> {
    predicate: SnapshotPredicate<'a>,
    stats: Option<&'a SkipStats>,
    allow_originals: bool,
}

impl<'a> AcidFileFilter<'a> {
    pub fn new(txns: &'a dyn TxnValidity, write_ids: &'a dyn WriteIdValidity) -> Self {
        Self {
            predicate: SnapshotPredicate::new(txns, write_ids),
            stats: None,
            allow_originals: true,
        }
    }

    pub fn with_stats(mut self, stats: &'a SkipStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_config(mut self, cfg: &AcidConfig) -> Self {
        self.allow_originals = cfg.allow_originals;
        self
    }

    /// Files that must be read to materialize the snapshot.
    pub fn filter<F: AcidFile + Clone>(
        &self,
        files: &[F],
        base_dir: &Path,
    ) -> Result<Vec<F>, AcidError> {
        let (survivors, max_base_write_id) = self.commit_pass(files, base_dir);
        match self.supersede_pass(survivors, max_base_write_id) {
            Ok(kept) => {
                metrics::record_resolution(kept.len());
                info!(
                    "acid filter {}: {} of {} entries kept (max base write id {:?})",
                    base_dir.display(),
                    kept.len(),
                    files.len(),
                    max_base_write_id
                );
                Ok(kept)
            }
            Err(e) => {
                metrics::record_resolution_failed();
                warn!("acid filter {}: {}", base_dir.display(), e);
                Err(e)
            }
        }
    }

    fn commit_pass<'f, F: AcidFile>(
        &self,
        files: &'f [F],
        base_dir: &Path,
    ) -> (Vec<Candidate<'f, F>>, Option<i64>) {
        let mut survivors = Vec::with_capacity(files.len());
        let mut max_base_write_id: Option<i64> = None;

        for file in files {
            let rel = relativize(file.path(), base_dir);
            let class = classify(&rel);
            if !self.predicate.admits(&class) {
                debug!("skip uncommitted {rel} ({class})");
                self.record_uncommitted();
                continue;
            }
            if let AcidPath::Base(b) = class {
                max_base_write_id =
                    Some(max_base_write_id.map_or(b.write_id, |m| m.max(b.write_id)));
            }
            survivors.push(Candidate { file, rel, class });
        }

        (survivors, max_base_write_id)
    }

    fn supersede_pass<F: AcidFile + Clone>(
        &self,
        survivors: Vec<Candidate<'_, F>>,
        max_base_write_id: Option<i64>,
    ) -> Result<Vec<F>, AcidError> {
        let mut kept = Vec::with_capacity(survivors.len());

        for c in survivors {
            // Только листовые файлы несут данные.
            if c.file.is_dir() {
                continue;
            }

            match c.class {
                AcidPath::Base(b) => {
                    if max_base_write_id.is_some_and(|m| b.write_id < m) {
                        debug!("skip {}: superseded by base {:?}", c.rel, max_base_write_id);
                        self.record_superseded();
                        continue;
                    }
                }
                AcidPath::Delta(d) => {
                    // Supersession is checked before minor compaction: a
                    // compacted delta already folded into the base is just dropped.
                    if max_base_write_id.is_some_and(|m| d.min_write_id <= m) {
                        debug!("skip {}: superseded by base {:?}", c.rel, max_base_write_id);
                        self.record_superseded();
                        continue;
                    }
                    if d.is_multi_write() {
                        return Err(AcidError::UnsupportedMinorCompaction {
                            path: c.rel,
                            min_write_id: d.min_write_id,
                            max_write_id: d.max_write_id,
                        });
                    }
                }
                AcidPath::DeleteDelta(d) => {
                    if max_base_write_id.map_or(true, |m| d.max_write_id > m) {
                        return Err(AcidError::UnsupportedVisibleDeletes {
                            path: c.rel,
                            max_write_id: d.max_write_id,
                            max_base_write_id,
                        });
                    }
                    // Deletes fully compacted into the base: nothing to read.
                    debug!("skip {}: delete delta covered by base", c.rel);
                    continue;
                }
                AcidPath::Unclassified => {
                    // With a valid base, originals were folded in by compaction
                    // and only wait for physical deletion.
                    if max_base_write_id.is_some() || !self.allow_originals {
                        debug!("skip original {}", c.rel);
                        continue;
                    }
                }
            }

            kept.push(c.file.clone());
        }

        Ok(kept)
    }

    fn record_uncommitted(&self) {
        metrics::record_uncommitted_skipped();
        if let Some(s) = self.stats {
            s.add_uncommitted();
        }
    }

    fn record_superseded(&self) {
        metrics::record_superseded_skipped();
        if let Some(s) = self.stats {
            s.add_superseded();
        }
    }
}

/// Filter a recursive listing of `base_dir` down to the files visible in the
/// snapshot described by `txns` and `write_ids`.
pub fn resolve<F: AcidFile + Clone>(
    files: &[F],
    base_dir: &Path,
    txns: &dyn TxnValidity,
    write_ids: &dyn WriteIdValidity,
    stats: Option<&SkipStats>,
) -> Result<Vec<F>, AcidError> {
    let mut filter = AcidFileFilter::new(txns, write_ids);
    if let Some(s) = stats {
        filter = filter.with_stats(s);
    }
    filter.filter(files, base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{AllValid, ValidTxnList, ValidWriteIdList};

    fn entries(root: &str, rels: &[&str]) -> Vec<FileEntry> {
        rels.iter()
            .map(|r| FileEntry::file(format!("{root}/{r}"), 1))
            .collect()
    }

    fn rels(root: &str, kept: &[FileEntry]) -> Vec<String> {
        kept.iter()
            .map(|f| relativize(&f.path, Path::new(root)))
            .collect()
    }

    #[test]
    fn relativize_joins_with_slash() {
        let r = relativize(
            Path::new("/wh/t/p=1/base_0000005/0000/abc.txt"),
            Path::new("/wh/t/p=1"),
        );
        assert_eq!(r, "base_0000005/0000/abc.txt");
        assert_eq!(relativize(Path::new("/other/x"), Path::new("/wh/t")), "/other/x");
    }

    #[test]
    fn relative_path_outside_base_dir_stays_unclassified() {
        let rel = relativize(Path::new("base_0000005/a"), Path::new("/wh"));
        assert_eq!(rel, "./base_0000005/a");
        assert_eq!(classify(&rel), AcidPath::Unclassified);

        // Treated as an original: kept without a base, dropped once one exists.
        let stray = FileEntry::file("base_0000005/a", 1);
        let kept = resolve(&[stray.clone()], Path::new("/wh"), &AllValid, &AllValid, None)
            .expect("resolve");
        assert_eq!(kept, vec![stray.clone()]);

        let files = vec![stray, FileEntry::file("/wh/base_0000001/b", 1)];
        let kept = resolve(&files, Path::new("/wh"), &AllValid, &AllValid, None).expect("resolve");
        assert_eq!(kept, vec![FileEntry::file("/wh/base_0000001/b", 1)]);
    }

    #[test]
    fn delete_delta_within_base_is_excluded() {
        let root = "/wh/t";
        let files = entries(
            root,
            &[
                "base_0000005/a",
                "delta_0000006_0000006/b",
                "delete_delta_0000005_0000005/c",
            ],
        );
        let wids = ValidWriteIdList::new("db.t", 7);
        let kept = resolve(&files, Path::new(root), &AllValid, &wids, None).expect("resolve");
        assert_eq!(rels(root, &kept), vec!["base_0000005/a", "delta_0000006_0000006/b"]);
    }

    #[test]
    fn delete_delta_past_base_fails() {
        let root = "/wh/t";
        let files = entries(
            root,
            &[
                "base_0000005/a",
                "delta_0000006_0000006/b",
                "delete_delta_0000007_0000007/c",
            ],
        );
        let wids = ValidWriteIdList::new("db.t", 7);
        let err = resolve(&files, Path::new(root), &AllValid, &wids, None).unwrap_err();
        assert_eq!(
            err,
            AcidError::UnsupportedVisibleDeletes {
                path: "delete_delta_0000007_0000007/c".into(),
                max_write_id: 7,
                max_base_write_id: Some(5),
            }
        );
    }

    #[test]
    fn older_base_is_superseded() {
        let root = "/wh/t";
        let files = entries(root, &["base_0000003/x", "base_0000005/a"]);
        let wids = ValidWriteIdList::new("db.t", 5);
        let stats = SkipStats::new();
        let kept = resolve(&files, Path::new(root), &AllValid, &wids, Some(&stats)).expect("resolve");
        assert_eq!(rels(root, &kept), vec!["base_0000005/a"]);
        assert_eq!(stats.snapshot().files_superseded_by_newer_base, 1);
        assert_eq!(stats.snapshot().uncommitted_files_skipped, 0);
    }

    #[test]
    fn directories_are_dropped() {
        let root = "/wh/t";
        let mut files = entries(root, &["000000_0"]);
        files.push(FileEntry::dir(format!("{root}/delta_0000001_0000001")));
        files.push(FileEntry::dir(format!("{root}/subdir")));
        let kept = resolve(&files, Path::new(root), &AllValid, &AllValid, None).expect("resolve");
        assert_eq!(rels(root, &kept), vec!["000000_0"]);
    }

    #[test]
    fn minor_compacted_delta_fails_unless_superseded() {
        let root = "/wh/t";
        let wids = ValidWriteIdList::new("db.t", 10);

        let files = entries(root, &["base_0000002/a", "delta_0000003_0000004/b"]);
        let err = resolve(&files, Path::new(root), &AllValid, &wids, None).unwrap_err();
        assert!(matches!(
            err,
            AcidError::UnsupportedMinorCompaction { min_write_id: 3, max_write_id: 4, .. }
        ));

        let files = entries(root, &["base_0000005/a", "delta_0000003_0000004/b"]);
        let stats = SkipStats::new();
        let kept = resolve(&files, Path::new(root), &AllValid, &wids, Some(&stats)).expect("resolve");
        assert_eq!(rels(root, &kept), vec!["base_0000005/a"]);
        assert_eq!(stats.snapshot().files_superseded_by_newer_base, 1);
    }

    #[test]
    fn uncommitted_files_are_counted() {
        let root = "/wh/t";
        let files = entries(
            root,
            &[
                "delta_0000001_0000001/a",
                "delta_0000002_0000002/b",
                "delta_0000003_0000003/c",
                "base_0000004_v0000099/d",
            ],
        );
        let wids = ValidWriteIdList::new("db.t", 4).with_aborted([2]).with_open([3]);
        let txns = ValidTxnList::new(50);
        let stats = SkipStats::new();
        let kept = resolve(&files, Path::new(root), &txns, &wids, Some(&stats)).expect("resolve");
        assert_eq!(rels(root, &kept), vec!["delta_0000001_0000001/a"]);
        assert_eq!(stats.snapshot().uncommitted_files_skipped, 3);
    }

    #[test]
    fn originals_dropped_once_base_exists() {
        let root = "/wh/t";
        let wids = ValidWriteIdList::new("db.t", 5);

        let files = entries(root, &["000000_0", "delta_0000001_0000001/a"]);
        let kept = resolve(&files, Path::new(root), &AllValid, &wids, None).expect("resolve");
        assert_eq!(rels(root, &kept), vec!["000000_0", "delta_0000001_0000001/a"]);

        let files = entries(root, &["000000_0", "base_0000001/a"]);
        let kept = resolve(&files, Path::new(root), &AllValid, &wids, None).expect("resolve");
        assert_eq!(rels(root, &kept), vec!["base_0000001/a"]);
    }

    #[test]
    fn originals_can_be_disallowed() {
        let root = "/wh/t";
        let files = entries(root, &["000000_0", "delta_0000001_0000001/a"]);
        let cfg = AcidConfig::default().with_allow_originals(false);
        let kept = AcidFileFilter::new(&AllValid, &AllValid)
            .with_config(&cfg)
            .filter(&files, Path::new(root))
            .expect("filter");
        assert_eq!(rels(root, &kept), vec!["delta_0000001_0000001/a"]);
    }

    #[test]
    fn invalid_newer_base_does_not_supersede() {
        let root = "/wh/t";
        let files = entries(root, &["base_0000003/a", "base_0000006/b", "delta_0000004_0000004/c"]);
        let wids = ValidWriteIdList::new("db.t", 10).with_open([5]);
        let kept = resolve(&files, Path::new(root), &AllValid, &wids, None).expect("resolve");
        assert_eq!(rels(root, &kept), vec!["base_0000003/a", "delta_0000004_0000004/c"]);
    }
}
