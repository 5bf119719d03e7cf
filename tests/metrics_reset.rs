//! Process-wide counters live in statics, so this runs in its own test binary.

use std::path::Path;

use acidlens::{metrics, resolve, AllValid, FileEntry, ValidWriteIdList};

#[test]
fn reset_zeroes_process_counters() {
    let root = Path::new("/wh/db.t");
    let ok = vec![
        FileEntry::file(root.join("base_0000001/a"), 1),
        FileEntry::file(root.join("base_0000002/b"), 1),
        FileEntry::file(root.join("delta_0000009_0000009/c"), 1),
    ];
    let wids = ValidWriteIdList::new("db.t", 5);
    resolve(&ok, root, &AllValid, &wids, None).expect("resolve");

    let bad = vec![FileEntry::file(root.join("delete_delta_0000003_0000003/d"), 1)];
    assert!(resolve(&bad, root, &AllValid, &wids, None).is_err());

    let m = metrics::snapshot();
    assert_eq!(m.resolutions_total, 2);
    assert_eq!(m.resolutions_failed, 1);
    assert_eq!(m.files_kept, 1);
    assert_eq!(m.uncommitted_skipped, 1);
    assert_eq!(m.superseded_skipped, 1);

    metrics::reset();
    let m = metrics::snapshot();
    assert_eq!(m.resolutions_total, 0);
    assert_eq!(m.resolutions_failed, 0);
    assert_eq!(m.files_kept, 0);
    assert_eq!(m.uncommitted_skipped, 0);
    assert_eq!(m.superseded_skipped, 0);
}
