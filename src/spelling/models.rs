//! Data structures for dictionary metadata and the canonical package layout.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{Result, SpellingError};

/// File extension of an installed dictionary package.
pub const PACKAGE_FILE_EXTENSION: &str = "spk";

/// Canonical name of the license member inside a staged/installed package.
pub const LICENSE_FILE_NAME: &str = "LICENSE.txt";

/// Canonical name of the readme member inside a staged/installed package.
pub const README_FILE_NAME: &str = "README.txt";

/// Placeholder title for dictionaries imported from a raw file pair.
pub const RAW_IMPORT_TITLE: &str = "Manually imported dictionary";

/// A language tag in canonical subtag case.
///
/// Parsing is lenient: subtags are split on `-` or `_` and re-cased
/// (language lowercase, two-letter region uppercase, four-letter script
/// title-case). Equality and hashing are by canonical form, so `en_us`,
/// `en-US` and `EN-us` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleTag {
    subtags: Vec<String>,
}

impl LocaleTag {
    /// Parse a tag from `-` or `_` separated input. Never fails; unknown
    /// subtag shapes are kept lowercase.
    pub fn parse(tag: &str) -> Self {
        let subtags = tag
            .split(['-', '_'])
            .filter(|s| !s.is_empty())
            .enumerate()
            .map(|(i, s)| canonicalize_subtag(i, s))
            .collect();
        Self { subtags }
    }

    /// The primary language subtag, lowercase. Empty if the tag was empty.
    pub fn language(&self) -> &str {
        self.subtags.first().map(String::as_str).unwrap_or("")
    }

    /// The region subtag, if one is present.
    pub fn region(&self) -> Option<&str> {
        self.subtags
            .iter()
            .skip(1)
            .find(|s| s.len() == 2 || (s.len() == 3 && s.chars().all(|c| c.is_ascii_digit())))
            .map(String::as_str)
    }
}

fn canonicalize_subtag(index: usize, subtag: &str) -> String {
    if index == 0 {
        return subtag.to_ascii_lowercase();
    }
    match subtag.len() {
        2 => subtag.to_ascii_uppercase(),
        3 if subtag.chars().all(|c| c.is_ascii_digit()) => subtag.to_string(),
        4 if subtag.chars().all(|c| c.is_ascii_alphabetic()) => {
            let mut out = subtag.to_ascii_lowercase();
            out[..1].make_ascii_uppercase();
            out
        }
        _ => subtag.to_ascii_lowercase(),
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subtags.join("-"))
    }
}

impl Serialize for LocaleTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LocaleTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(D::Error::custom("empty locale tag"));
        }
        Ok(LocaleTag::parse(&raw))
    }
}

/// Metadata record of one dictionary package.
///
/// Persisted as the `meta.json` member of the installed package and rebuilt
/// from there on every index scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryMeta {
    /// Stable identifier, derived from source id and locale at build time.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub locale: LocaleTag,
    /// Identifier of the import source this package came from.
    pub original_source_id: String,
    /// Member name of the affix file inside the package.
    pub aff_file: String,
    /// Member name of the word-list file inside the package.
    pub dic_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_file: Option<String>,
}

impl DictionaryMeta {
    pub fn builder() -> DictionaryMetaBuilder {
        DictionaryMetaBuilder::default()
    }

    /// File name of the installed package for this metadata.
    pub fn package_file_name(&self) -> String {
        format!("{}.{}", self.id, PACKAGE_FILE_EXTENSION)
    }
}

/// Explicit builder for [`DictionaryMeta`].
///
/// Importers populate fields incrementally as archive members are found;
/// [`build()`](DictionaryMetaBuilder::build) validates that every required
/// field is present.
#[derive(Debug, Default, Clone)]
pub struct DictionaryMetaBuilder {
    version: Option<String>,
    title: Option<String>,
    locale: Option<LocaleTag>,
    original_source_id: Option<String>,
    aff_file: Option<String>,
    dic_file: Option<String>,
    license_file: Option<String>,
    readme_file: Option<String>,
}

impl DictionaryMetaBuilder {
    pub fn locale(mut self, locale: LocaleTag) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn original_source(mut self, id: impl Into<String>) -> Self {
        self.original_source_id = Some(id.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn aff_file(mut self, name: impl Into<String>) -> Self {
        self.aff_file = Some(name.into());
        self
    }

    pub fn dic_file(mut self, name: impl Into<String>) -> Self {
        self.dic_file = Some(name.into());
        self
    }

    pub fn license_file(mut self, name: impl Into<String>) -> Self {
        self.license_file = Some(name.into());
        self
    }

    pub fn readme_file(mut self, name: impl Into<String>) -> Self {
        self.readme_file = Some(name.into());
        self
    }

    /// Validate required fields and produce the metadata record.
    ///
    /// # Errors
    /// [`MetadataIncomplete`](SpellingError::MetadataIncomplete) naming the
    /// first missing field: locale, source id, aff file or dic file.
    pub fn build(self) -> Result<DictionaryMeta> {
        let locale = self
            .locale
            .ok_or(SpellingError::MetadataIncomplete { field: "locale" })?;
        let original_source_id = self.original_source_id.ok_or(SpellingError::MetadataIncomplete {
            field: "original_source_id",
        })?;
        let aff_file = self
            .aff_file
            .ok_or(SpellingError::MetadataIncomplete { field: "aff_file" })?;
        let dic_file = self
            .dic_file
            .ok_or(SpellingError::MetadataIncomplete { field: "dic_file" })?;

        let id = format!(
            "{}.{}",
            original_source_id,
            locale.to_string().to_ascii_lowercase()
        );
        Ok(DictionaryMeta {
            id,
            version: self.version,
            title: self.title,
            locale,
            original_source_id,
            aff_file,
            dic_file,
            license_file: self.license_file,
            readme_file: self.readme_file,
        })
    }
}

/// Static description of a selectable import origin.
#[derive(Debug, Clone, Copy)]
pub struct ImportSource {
    /// Identifier passed to `prepare_import`. Empty for the sentinel entry.
    pub id: &'static str,
    pub label: &'static str,
    pub url: Option<&'static str>,
}

/// The import source catalogue. Index 0 is the "none selected" sentinel
/// reserved for UI-facing lists derived from this table.
pub const IMPORT_SOURCES: &[ImportSource] = &[
    ImportSource {
        id: "",
        label: "-",
        url: None,
    },
    ImportSource {
        id: "mozilla",
        label: "Firefox dictionary extensions",
        url: Some("https://addons.mozilla.org/firefox/language-tools/"),
    },
    ImportSource {
        id: "freeoffice",
        label: "FreeOffice dictionaries",
        url: Some("https://www.freeoffice.com/en/download/dictionaries"),
    },
    ImportSource {
        id: "raw",
        label: "Raw affix/word-list file pair",
        url: None,
    },
];
