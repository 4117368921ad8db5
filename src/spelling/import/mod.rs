//! Format importers: convert an upstream distribution archive (or raw file
//! pair) into a staged [`ExtensionPackage`].
//!
//! Every importer follows the same staging discipline:
//!
//! 1. copy the inbound source into a bounded staging file (reject above
//!    [`MAX_SOURCE_SIZE`])
//! 2. open it as an archive, or use the file directly
//! 3. locate the members the format requires
//! 4. copy them into a fresh working directory, recreated empty per attempt
//! 5. populate the metadata builder incrementally as members are found
//! 6. `build()` once scanning completes, validating required fields
//! 7. wrap the working directory and metadata in an [`ExtensionPackage`]
//!    targeting `<base>/<id>.spk`
//!
//! Staging areas use fixed well-known paths under the cache root, so a
//! failed attempt's debris is swept by the next attempt of the same format.
//! Concurrent imports of the same format from one process collide on those
//! paths; imports are single-in-flight per process.

pub mod freeoffice;
pub mod mozilla;
pub mod raw;

use std::fs::{self, File};
use std::path::PathBuf;

use log::debug;

use super::archive::ZipArchive;
use super::error::{Result, SpellingError};
use super::io;
use super::locator::{ResourceRef, StorageRoots};
use super::models::DictionaryMeta;
use super::package::ExtensionPackage;

/// Maximum accepted size of an inbound source archive or file.
pub const MAX_SOURCE_SIZE: u64 = 24 * 1024 * 1024;

const STAGING_SUBDIR: &str = "importer";
const SOURCE_FILE_NAME: &str = "source.archive";
const WORK_SUBDIR: &str = "staged";

/// Stage an archive through the importer named by `source_id`.
pub fn prepare(
    roots: &StorageRoots,
    base: &ResourceRef,
    source_id: &str,
    archive: &ResourceRef,
) -> Result<ExtensionPackage<DictionaryMeta>> {
    match source_id {
        mozilla::SOURCE_ID => mozilla::stage(roots, base, archive),
        freeoffice::SOURCE_ID => freeoffice::stage(roots, base, archive),
        other => Err(SpellingError::UnsupportedSource(other.to_string())),
    }
}

/// The fixed per-format staging area.
pub(crate) struct StagingArea {
    /// Bounded copy of the inbound source.
    pub source_file: PathBuf,
    /// Working directory receiving the staged members.
    pub work_dir: PathBuf,
}

/// Recreate (delete-then-make) the staging area for one source format.
pub(crate) fn recreate_staging(roots: &StorageRoots, source_id: &str) -> Result<StagingArea> {
    let dir = roots.cache.join(STAGING_SUBDIR).join(source_id);
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    let work_dir = dir.join(WORK_SUBDIR);
    fs::create_dir_all(&work_dir)?;
    debug!("Staging area recreated at {}", dir.display());
    Ok(StagingArea {
        source_file: dir.join(SOURCE_FILE_NAME),
        work_dir,
    })
}

/// Copy the inbound source into the bounded staging file and open it as an
/// archive.
pub(crate) fn fetch_archive(
    roots: &StorageRoots,
    area: &StagingArea,
    source: &ResourceRef,
) -> Result<ZipArchive<File>> {
    let copied = io::copy_bounded(source, roots, &area.source_file, MAX_SOURCE_SIZE)?;
    debug!("Fetched {} bytes from {}", copied, source);
    ZipArchive::new(File::open(&area.source_file)?)
}

/// The installed-package target for built metadata: `<base>/<id>.spk`.
pub(crate) fn archive_target(base: &ResourceRef, meta: &DictionaryMeta) -> ResourceRef {
    base.sub_path(&meta.package_file_name())
}
