//! Recursive listing of a table/partition directory into `FileEntry`s.
//!
//! Directories are returned too (the resolver drops them); symlinks are
//! reported with the metadata of their target and never followed into.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::resolver::FileEntry;

pub fn list_files_recursive(root: &Path) -> Result<Vec<FileEntry>> {
    let md = fs::metadata(root).with_context(|| format!("stat {}", root.display()))?;
    if !md.is_dir() {
        return Err(anyhow!("{} is not a directory", root.display()));
    }

    let mut out = Vec::new();
    walk(root, &mut out)?;
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

fn walk(dir: &Path, out: &mut Vec<FileEntry>) -> Result<()> {
    let rd = fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))?;
    for ent in rd {
        let ent = ent.with_context(|| format!("read_dir entry in {}", dir.display()))?;
        let path = ent.path();
        let ft = ent
            .file_type()
            .with_context(|| format!("file_type {}", path.display()))?;

        if ft.is_dir() {
            out.push(FileEntry::dir(path.clone()));
            walk(&path, out)?;
        } else {
            // Broken symlinks: fall back to the link itself.
            let md = fs::metadata(&path)
                .or_else(|_| fs::symlink_metadata(&path))
                .with_context(|| format!("stat {}", path.display()))?;
            if md.is_dir() {
                out.push(FileEntry::dir(path));
            } else {
                out.push(FileEntry::file(path, md.len()));
            }
        }
    }
    Ok(())
}
