//! Importer for browser dictionary extension archives.
//!
//! These are WebExtension packages: a ZIP with a `manifest.json` at the
//! root whose `dictionaries` object maps locale tags to file stems under a
//! `dictionaries/` subfolder.

use std::fs;

use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;

use super::{archive_target, fetch_archive, recreate_staging};
use crate::spelling::error::{Result, SpellingError};
use crate::spelling::locator::{ResourceRef, StorageRoots};
use crate::spelling::models::{DictionaryMeta, LocaleTag};
use crate::spelling::package::ExtensionPackage;

pub const SOURCE_ID: &str = "mozilla";

const MANIFEST_MEMBER: &str = "manifest.json";
const DICTIONARY_PREFIX: &str = "dictionaries/";

/// The subset of the extension manifest this importer reads.
///
/// The mapping preserves document order: when a manifest lists several
/// dictionaries, the first entry as the parser yields it is the one
/// honored.
#[derive(Debug, Deserialize)]
struct ExtensionManifest {
    manifest_version: u32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dictionaries: IndexMap<String, String>,
}

/// Stage a browser dictionary extension into an [`ExtensionPackage`].
pub fn stage(
    roots: &StorageRoots,
    base: &ResourceRef,
    source: &ResourceRef,
) -> Result<ExtensionPackage<DictionaryMeta>> {
    info!("Importing browser dictionary extension from {}", source);
    let area = recreate_staging(roots, SOURCE_ID)?;
    let mut zip = fetch_archive(roots, &area, source)?;

    if !zip.contains(MANIFEST_MEMBER) {
        return Err(SpellingError::ArchiveMemberMissing {
            member: MANIFEST_MEMBER.to_string(),
        });
    }
    let manifest: ExtensionManifest = serde_json::from_slice(&zip.read_member(MANIFEST_MEMBER)?)?;
    debug!(
        "Manifest version {}, {} dictionary entries",
        manifest.manifest_version,
        manifest.dictionaries.len()
    );

    // Only the first mapping entry is honored; the remainder is ignored.
    let (locale_raw, stem_raw) = manifest
        .dictionaries
        .first()
        .map(|(locale, stem)| (locale.clone(), stem.clone()))
        .ok_or(SpellingError::EmptyManifest)?;
    if manifest.dictionaries.len() > 1 {
        debug!(
            "Ignoring {} additional dictionaries in manifest",
            manifest.dictionaries.len() - 1
        );
    }

    // Publishers disagree on the value shape: some list the bare stem, some
    // the full member path ending in `.dic`. Normalize to the bare stem.
    let stem = stem_raw
        .strip_prefix(DICTIONARY_PREFIX)
        .unwrap_or(&stem_raw);
    let stem = stem.strip_suffix(".dic").unwrap_or(stem);

    let mut builder = DictionaryMeta::builder()
        .locale(LocaleTag::parse(&locale_raw))
        .original_source(SOURCE_ID);
    if let Some(name) = manifest.name {
        builder = builder.title(name);
    }
    if let Some(version) = manifest.version {
        builder = builder.version(version);
    }

    for extension in ["aff", "dic"] {
        let member = format!("{}{}.{}", DICTIONARY_PREFIX, stem, extension);
        let bytes = zip.read_member(&member)?;
        // The subfolder prefix is stripped from the staged file name.
        let staged_name = format!("{}.{}", stem, extension);
        fs::write(area.work_dir.join(&staged_name), bytes)?;
        builder = match extension {
            "aff" => builder.aff_file(staged_name),
            _ => builder.dic_file(staged_name),
        };
    }

    let meta = builder.build()?;
    let target = archive_target(base, &meta);
    info!("Staged dictionary {:?} for locale {}", meta.id, meta.locale);
    Ok(ExtensionPackage::new(meta, area.work_dir, target))
}
