//! # spellpack
//!
//! Importer, indexer and resolver for spell-checking dictionary packages.
//!
//! Dictionaries arrive in several incompatible upstream distribution
//! formats (browser extension archives, office-suite archives, raw
//! affix/word-list pairs). This crate normalizes them into one canonical
//! package format (`.spk`), indexes installed packages by locale, and
//! resolves locale lookups to cached, ready-to-use dictionary handles.
pub mod spelling;

// Re-export the main types for convenience
pub use spelling::{
    AffixCompiler, DictionaryHandle, DictionaryMeta, ExtensionPackage, LocaleTag, Namespace,
    ResourceRef, Result, SpellingError, SpellingManager, StorageRoots, WordListCompiler,
};
