use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use util::PathEncodingError;

use super::Error;

/// Move the contents of `src` into `tgt`, replacing existing files and merging
/// folders as needed. `src` is removed afterwards.
pub fn merge_move(src: &Path, tgt: &Path) -> Result<()> {
    fs::create_dir_all(tgt)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_entry = entry.path();
        let tgt_entry = tgt.join(entry.file_name());
        let ty = entry.file_type()?;

        if ty.is_dir() && tgt_entry.is_dir() && !tgt_entry.is_symlink() {
            merge_move(&src_entry, &tgt_entry)?;
            continue;
        }

        if tgt_entry.is_symlink() || tgt_entry.is_file() {
            fs::remove_file(&tgt_entry)?;
        } else if tgt_entry.is_dir() {
            fs::remove_dir_all(&tgt_entry)?;
        }
        move_path(&src_entry, &tgt_entry)?;
    }
    fs::remove_dir(src)?;
    Ok(())
}

/// Rename `src` to `tgt`, falling back to copy + delete when a plain rename
/// is not possible (e.g. across filesystems).
pub fn move_path(src: &Path, tgt: &Path) -> Result<()> {
    if fs::rename(src, tgt).is_ok() {
        return Ok(());
    }
    log::trace!("rename of {:?} failed; copying instead", src);
    copy(src, tgt)?;
    if src.is_dir() && !src.is_symlink() {
        fs::remove_dir_all(src)?;
    } else {
        fs::remove_file(src)?;
    }
    Ok(())
}

/// Copy `src` to `tgt`, recursively if needed.
pub fn copy(src: &Path, tgt: &Path) -> Result<()> {
    if src.is_symlink() {
        let link_tgt = fs::read_link(src)?;
        symlink(&link_tgt, tgt)?;
    } else if src.is_file() {
        fs::copy(src, tgt)?;
    } else if src.is_dir() {
        cp_dir(src, tgt, src, tgt)?;
    } else {
        return Err(
            Error::UnknownPathType(src.to_str().ok_or(PathEncodingError)?.to_owned()).into(),
        );
    }
    Ok(())
}

fn cp_dir(src_root: &Path, tgt_root: &Path, src: &Path, tgt: &Path) -> Result<()> {
    fs::create_dir_all(tgt)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let src_entry = entry.path();
        let tgt_entry = tgt.join(entry.file_name());
        if ty.is_symlink() {
            let orig_link_tgt = fs::read_link(&src_entry)?;
            let new_link_tgt = resolve_new_link_tgt(src_root, tgt_root, orig_link_tgt)?;
            symlink(&new_link_tgt, &tgt_entry)?;
        } else if ty.is_dir() {
            cp_dir(src_root, tgt_root, &src_entry, &tgt_entry)?;
        } else if ty.is_file() {
            fs::copy(&src_entry, &tgt_entry)?;
        } else {
            return Err(Error::UnknownPathType(
                entry.path().to_str().ok_or(PathEncodingError)?.to_owned(),
            )
            .into());
        }
    }
    Ok(())
}

/// If link is internal to `src_root`, create a new internal link in `tgt_root`.
/// O/w, just link to the same external target.
fn resolve_new_link_tgt(
    src_root: &Path,
    tgt_root: &Path,
    orig_link_tgt: PathBuf,
) -> Result<PathBuf> {
    if orig_link_tgt.starts_with(src_root) {
        Ok(tgt_root.join(orig_link_tgt.strip_prefix(src_root)?))
    } else {
        Ok(orig_link_tgt)
    }
}

/// Symlink the given `link` to `tgt`; works for unix and windows.
pub fn symlink(tgt: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    std::os::unix::fs::symlink(tgt, link)?;

    #[cfg(windows)]
    if tgt.is_dir() {
        std::os::windows::fs::symlink_dir(tgt, link)?;
    } else {
        std::os::windows::fs::symlink_file(tgt, link)?;
    }
    Ok(())
}
