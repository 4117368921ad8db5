//! Bounded, namespace-aware content reads.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use log::warn;

use super::error::{Result, SpellingError};
use super::locator::{Namespace, ResourceRef, StorageRoots};

/// Open a source ref for reading.
///
/// Bundled-asset refs are resolved through the configured assets root; a
/// missing assets root fails with
/// [`ContextUnavailable`](SpellingError::ContextUnavailable).
pub fn open_source(source: &ResourceRef, roots: &StorageRoots) -> Result<File> {
    let path = match source.namespace() {
        Namespace::BundledAssets => {
            let assets = roots
                .assets
                .as_ref()
                .ok_or(SpellingError::ContextUnavailable)?;
            assets.join(source.path())
        }
        _ => source.absolute_path(roots),
    };
    Ok(File::open(path)?)
}

/// Copy at most `max_bytes` from a source ref into the file at `dest`.
///
/// A source larger than the bound fails with
/// [`SizeLimitExceeded`](SpellingError::SizeLimitExceeded) and the
/// destination file is removed, so a rejected copy never leaves a truncated
/// file behind at the path it claims to own.
pub fn copy_bounded(
    source: &ResourceRef,
    roots: &StorageRoots,
    dest: &Path,
    max_bytes: u64,
) -> Result<u64> {
    let mut reader = open_source(source, roots)?;
    copy_reader_bounded(&mut reader, dest, max_bytes)
}

/// Bounded copy from an already-open reader. See [`copy_bounded`].
pub fn copy_reader_bounded(reader: &mut impl Read, dest: &Path, max_bytes: u64) -> Result<u64> {
    let mut out = File::create(dest)?;
    // Read one byte past the bound so an exactly-at-limit source passes.
    let written = io::copy(&mut reader.take(max_bytes + 1), &mut out)?;
    if written > max_bytes {
        drop(out);
        if let Err(err) = fs::remove_file(dest) {
            warn!("Failed to remove over-limit copy {}: {}", dest.display(), err);
        }
        return Err(SpellingError::SizeLimitExceeded { limit: max_bytes });
    }
    Ok(written)
}
