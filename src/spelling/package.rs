//! The canonical installable unit bundling metadata and content files.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use log::{debug, info};

use super::archive::ZipWriter;
use super::error::Result;
use super::locator::{ResourceRef, StorageRoots};
use super::models::DictionaryMeta;

/// Member name of the metadata record inside an installed package.
pub const META_MEMBER_NAME: &str = "meta.json";

/// A staged extension package: metadata, the working directory owning the
/// staged loose files, and the target it will be installed at as a packed
/// unit.
///
/// The package exclusively owns `working_dir` until installation. A package
/// that is never installed must be reclaimed by the caller
/// ([`discard`](ExtensionPackage::discard)); staging directories are also
/// recreated at the start of the next import attempt.
#[derive(Debug)]
pub struct ExtensionPackage<M> {
    pub meta: M,
    pub working_dir: PathBuf,
    pub final_archive_target: ResourceRef,
}

impl<M> ExtensionPackage<M> {
    pub fn new(meta: M, working_dir: PathBuf, final_archive_target: ResourceRef) -> Self {
        Self {
            meta,
            working_dir,
            final_archive_target,
        }
    }

    /// Remove the staged working directory without installing.
    pub fn discard(self) -> Result<()> {
        debug!("Discarding staged package at {}", self.working_dir.display());
        fs::remove_dir_all(&self.working_dir)?;
        Ok(())
    }
}

impl ExtensionPackage<DictionaryMeta> {
    /// File names of the staged members this package records, in canonical
    /// order: aff, dic, then optional license and readme.
    pub fn member_names(&self) -> Vec<&str> {
        let mut names = vec![self.meta.aff_file.as_str(), self.meta.dic_file.as_str()];
        if let Some(license) = &self.meta.license_file {
            names.push(license);
        }
        if let Some(readme) = &self.meta.readme_file {
            names.push(readme);
        }
        names
    }

    /// Pack the staged members and metadata record into the final archive
    /// target, creating the base directory if needed.
    ///
    /// The working directory is left in place; installation callers remove
    /// it (or reuse it on the next staging attempt).
    pub fn pack(&self, roots: &StorageRoots) -> Result<ResourceRef> {
        let target_path = self.final_archive_target.absolute_path(roots);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&target_path)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        writer.add_member(META_MEMBER_NAME, &serde_json::to_vec_pretty(&self.meta)?)?;
        for name in self.member_names() {
            let bytes = fs::read(self.working_dir.join(name))?;
            writer.add_member(name, &bytes)?;
        }
        writer.finish()?;

        info!(
            "Packed dictionary {:?} into {}",
            self.meta.id, self.final_archive_target
        );
        Ok(self.final_archive_target.clone())
    }
}
