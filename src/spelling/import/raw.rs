//! Importer for a caller-supplied raw affix/word-list file pair.
//!
//! No archive and no scanning: the caller names the two files and the
//! locale explicitly, and staged file names are synthesized from the
//! locale tag.

use log::info;

use super::{archive_target, recreate_staging, MAX_SOURCE_SIZE};
use crate::spelling::error::Result;
use crate::spelling::io;
use crate::spelling::locator::{ResourceRef, StorageRoots};
use crate::spelling::models::{DictionaryMeta, LocaleTag, RAW_IMPORT_TITLE};
use crate::spelling::package::ExtensionPackage;

pub const SOURCE_ID: &str = "raw";

/// Stage a raw affix/word-list pair into an [`ExtensionPackage`].
pub fn stage(
    roots: &StorageRoots,
    base: &ResourceRef,
    aff: &ResourceRef,
    dic: &ResourceRef,
    locale_tag: &str,
) -> Result<ExtensionPackage<DictionaryMeta>> {
    info!("Importing raw dictionary pair for locale {:?}", locale_tag);
    let locale = LocaleTag::parse(locale_tag);
    let area = recreate_staging(roots, SOURCE_ID)?;

    let aff_name = format!("{}.aff", locale);
    let dic_name = format!("{}.dic", locale);
    io::copy_bounded(aff, roots, &area.work_dir.join(&aff_name), MAX_SOURCE_SIZE)?;
    io::copy_bounded(dic, roots, &area.work_dir.join(&dic_name), MAX_SOURCE_SIZE)?;

    let meta = DictionaryMeta::builder()
        .locale(locale)
        .original_source(SOURCE_ID)
        .title(RAW_IMPORT_TITLE)
        .aff_file(aff_name)
        .dic_file(dic_name)
        .build()?;
    let target = archive_target(base, &meta);
    info!("Staged dictionary {:?} for locale {}", meta.id, meta.locale);
    Ok(ExtensionPackage::new(meta, area.work_dir, target))
}
