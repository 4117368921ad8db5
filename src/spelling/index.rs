//! Index of installed dictionary packages.
//!
//! The index is a pure function of storage: nothing is persisted here, the
//! mapping is rebuilt wholesale from the base directory on every scan and
//! holds entries in directory scan order.

use std::fs::{self, File};
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};

use super::archive::ZipArchive;
use super::error::Result;
use super::locator::{ResourceRef, StorageRoots};
use super::models::{DictionaryMeta, PACKAGE_FILE_EXTENSION};
use super::package::META_MEMBER_NAME;

/// Mapping from installed-package locator to its metadata, in scan order.
pub type DictionaryIndex = IndexMap<ResourceRef, DictionaryMeta>;

/// Scan the base directory for installed packages in one pass.
///
/// The directory is created if absent (idempotent). Every readable
/// `.spk` file contributes one `(locator, metadata)` pair; an unreadable
/// package is logged and skipped so one corrupt file cannot blind the whole
/// index. A directory-level failure is an error and the caller keeps its
/// previous mapping.
pub fn scan(roots: &StorageRoots, base: &ResourceRef) -> Result<DictionaryIndex> {
    let dir = base.absolute_path(roots);
    fs::create_dir_all(&dir)?;

    let mut index = DictionaryIndex::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(PACKAGE_FILE_EXTENSION) {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match read_meta(&path) {
            Ok(meta) => {
                debug!("Indexed {:?} ({}) from {}", meta.id, meta.locale, file_name);
                index.insert(base.sub_path(file_name), meta);
            }
            Err(err) => warn!("Skipping unreadable package {}: {}", path.display(), err),
        }
    }
    debug!("Index scan found {} packages", index.len());
    Ok(index)
}

/// Read the metadata record member out of one installed package.
fn read_meta(path: &Path) -> Result<DictionaryMeta> {
    let mut zip = ZipArchive::new(File::open(path)?)?;
    let bytes = zip.read_member(META_MEMBER_NAME)?;
    Ok(serde_json::from_slice(&bytes)?)
}
