//! Importer for office-suite dictionary archives.
//!
//! These ship as a ZIP with a line-oriented `dict.ini` member naming the
//! affix/word-list file base and the locales the dictionary supports.
//! License and readme members carry no fixed names upstream and are located
//! by case-insensitive substring match.

use std::fs;

use log::{debug, info};

use super::{archive_target, fetch_archive, recreate_staging};
use crate::spelling::error::{Result, SpellingError};
use crate::spelling::locator::{ResourceRef, StorageRoots};
use crate::spelling::models::{DictionaryMeta, LocaleTag, LICENSE_FILE_NAME, README_FILE_NAME};
use crate::spelling::package::ExtensionPackage;

pub const SOURCE_ID: &str = "freeoffice";

const CONFIG_MEMBER: &str = "dict.ini";
const KEY_FILE_BASE: &str = "file";
const KEY_SUPPORTED_LOCALES: &str = "supported_locales";

/// Stage an office-suite dictionary archive into an [`ExtensionPackage`].
pub fn stage(
    roots: &StorageRoots,
    base: &ResourceRef,
    source: &ResourceRef,
) -> Result<ExtensionPackage<DictionaryMeta>> {
    info!("Importing office dictionary archive from {}", source);
    let area = recreate_staging(roots, SOURCE_ID)?;
    let mut zip = fetch_archive(roots, &area, source)?;

    let config = zip.read_member(CONFIG_MEMBER)?;
    let (file_base, locale) = scan_config(&String::from_utf8_lossy(&config))?;
    debug!("Config: file base {:?}, locale {}", file_base, locale);

    let mut builder = DictionaryMeta::builder()
        .locale(locale)
        .original_source(SOURCE_ID)
        .title(file_base.clone());

    let aff_name = format!("{}.aff", file_base);
    let dic_name = format!("{}.dic", file_base);
    let mut license_found = false;
    let mut readme_found = false;

    for name in zip.member_names() {
        let file_name = name.rsplit('/').next().unwrap_or(&name);
        let lower = name.to_ascii_lowercase();
        if file_name == aff_name {
            fs::write(area.work_dir.join(&aff_name), zip.read_member(&name)?)?;
            builder = builder.aff_file(aff_name.clone());
        } else if file_name == dic_name {
            fs::write(area.work_dir.join(&dic_name), zip.read_member(&name)?)?;
            builder = builder.dic_file(dic_name.clone());
        } else if !license_found && (lower.contains("copying") || lower.contains("license")) {
            fs::write(area.work_dir.join(LICENSE_FILE_NAME), zip.read_member(&name)?)?;
            builder = builder.license_file(LICENSE_FILE_NAME);
            license_found = true;
        } else if !readme_found && (lower.contains("readme") || lower.contains("description")) {
            fs::write(area.work_dir.join(README_FILE_NAME), zip.read_member(&name)?)?;
            builder = builder.readme_file(README_FILE_NAME);
            readme_found = true;
        }
    }

    let meta = builder.build()?;
    let target = archive_target(base, &meta);
    info!("Staged dictionary {:?} for locale {}", meta.id, meta.locale);
    Ok(ExtensionPackage::new(meta, area.work_dir, target))
}

/// Scan every `key=value` line of the config member for the file-name base
/// and the supported-locale list; the list's first entry wins.
fn scan_config(text: &str) -> Result<(String, LocaleTag)> {
    let mut file_base: Option<String> = None;
    let mut locale_list: Option<String> = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            KEY_FILE_BASE => file_base = Some(value.trim().to_string()),
            KEY_SUPPORTED_LOCALES => locale_list = Some(value.trim().to_string()),
            _ => {}
        }
    }

    let file_base = file_base.ok_or(SpellingError::MetadataIncomplete {
        field: KEY_FILE_BASE,
    })?;
    let locale = locale_list
        .as_deref()
        .and_then(|list| {
            list.split([',', ';', ' '])
                .map(str::trim)
                .find(|entry| !entry.is_empty())
                .map(LocaleTag::parse)
        })
        .ok_or(SpellingError::MetadataIncomplete {
            field: KEY_SUPPORTED_LOCALES,
        })?;
    Ok((file_base, locale))
}
