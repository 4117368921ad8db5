//! Dictionary package management: import, indexing and locale resolution.
//!
//! # Module Organization
//!
//! - [`locator`]: uniform addressing across the four storage namespaces
//! - [`models`]: locale tags, dictionary metadata and the import catalogue
//! - [`archive`]: ZIP container reading/writing
//! - [`io`]: bounded, namespace-aware content reads
//! - [`import`]: per-format staging pipelines
//! - [`package`]: the staged/installed extension package unit
//! - [`index`]: one-pass scan of installed packages
//! - [`suggest`]: compiler/handle seams and the bundled fallback suggester
//!
//! # Pipeline
//!
//! ```text
//! upstream archive ──► import::prepare() ──► ExtensionPackage (staged)
//!                                                │ finalize_import()
//!                                                ▼
//!                          <internal>/spelling/<id>.spk (installed)
//!                                                │ reindex()
//!                                                ▼
//!                          index ──► resolve(locale) ──► cached handle
//! ```

pub mod archive;
pub mod error;
pub mod import;
pub mod index;
pub mod io;
pub mod locator;
pub mod models;
pub mod package;
mod resolver;
pub mod suggest;

use std::sync::{Arc, Mutex};

use log::{error, info, warn};

pub use error::{Result, SpellingError};
pub use locator::{Namespace, ResourceRef, StorageRoots};
pub use models::{
    DictionaryMeta, DictionaryMetaBuilder, ImportSource, LocaleTag, IMPORT_SOURCES,
    PACKAGE_FILE_EXTENSION,
};
pub use package::ExtensionPackage;
pub use suggest::{AffixCompiler, DictionaryHandle, WordListCompiler};

use resolver::ResolverState;

/// Base path of installed dictionary packages under internal storage.
pub const DICTIONARY_BASE_PATH: &str = "spelling";

/// Owner of import dispatch, the package index and the loaded-dictionary
/// cache.
///
/// Explicitly constructed and passed by the composition root; there is no
/// process-wide instance. All operations are synchronous and callable from
/// any thread: index reads and cache writes happen under one internal lock,
/// so two concurrent resolutions of the same locale trigger at most one
/// compilation.
pub struct SpellingManager {
    roots: StorageRoots,
    base: ResourceRef,
    compiler: Box<dyn AffixCompiler>,
    state: Mutex<ResolverState>,
}

impl SpellingManager {
    /// Create a manager over the given storage roots and compiler seam.
    ///
    /// The index starts empty; call [`reindex`](Self::reindex) to populate
    /// it from storage.
    pub fn new(roots: StorageRoots, compiler: Box<dyn AffixCompiler>) -> Self {
        Self {
            roots,
            base: ResourceRef::internal(DICTIONARY_BASE_PATH),
            compiler,
            state: Mutex::new(ResolverState::default()),
        }
    }

    pub fn roots(&self) -> &StorageRoots {
        &self.roots
    }

    /// Base ref the installed packages live under.
    pub fn dictionary_base(&self) -> &ResourceRef {
        &self.base
    }

    /// Stage an import of `archive` through the importer named by
    /// `source_id`.
    ///
    /// On success the returned package owns its staged working directory;
    /// install it with [`finalize_import`](Self::finalize_import) or
    /// reclaim it with [`ExtensionPackage::discard`].
    pub fn prepare_import(
        &self,
        source_id: &str,
        archive: &ResourceRef,
    ) -> Result<ExtensionPackage<DictionaryMeta>> {
        import::prepare(&self.roots, &self.base, source_id, archive)
    }

    /// Stage a raw affix/word-list file pair with an explicit locale tag.
    pub fn prepare_import_raw(
        &self,
        aff: &ResourceRef,
        dic: &ResourceRef,
        locale_tag: &str,
    ) -> Result<ExtensionPackage<DictionaryMeta>> {
        import::raw::stage(&self.roots, &self.base, aff, dic, locale_tag)
    }

    /// Pack a staged package into its final archive target, drop the
    /// staging directory and refresh the index.
    pub fn finalize_import(&self, package: ExtensionPackage<DictionaryMeta>) -> Result<ResourceRef> {
        let target = package.pack(&self.roots)?;
        package.discard()?;
        self.reindex();
        info!("Installed dictionary package at {}", target);
        Ok(target)
    }

    /// Rebuild the index from storage, replacing the mapping wholesale.
    ///
    /// Returns `false` on scan failure, in which case the previous mapping
    /// is left untouched.
    pub fn reindex(&self) -> bool {
        let scanned = match index::scan(&self.roots, &self.base) {
            Ok(scanned) => scanned,
            Err(err) => {
                warn!("Dictionary index scan failed: {}", err);
                return false;
            }
        };
        match self.state.lock() {
            Ok(mut state) => {
                state.index = scanned;
                true
            }
            Err(_) => {
                error!("{}", SpellingError::LockPoisoned);
                false
            }
        }
    }

    /// Resolve a locale to a loaded dictionary handle.
    ///
    /// Matching is exact first (full tag), then the first index entry
    /// sharing the primary language subtag. `None` covers both "no
    /// dictionary installed for this locale" and "the installed dictionary
    /// failed to load": spell-checking is an optional enhancement, so the
    /// two are deliberately indistinguishable here.
    pub fn resolve(&self, locale: &LocaleTag) -> Option<Arc<dyn DictionaryHandle>> {
        match self.state.lock() {
            Ok(mut state) => state.resolve(locale, &self.roots, self.compiler.as_ref()),
            Err(_) => {
                error!("{}", SpellingError::LockPoisoned);
                None
            }
        }
    }

    /// Snapshot of the current index in scan order.
    pub fn installed_dictionaries(&self) -> Vec<(ResourceRef, DictionaryMeta)> {
        match self.state.lock() {
            Ok(state) => state
                .index
                .iter()
                .map(|(locator, meta)| (locator.clone(), meta.clone()))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// UI-facing import source lists, leading "none selected" sentinel
    /// included.
    pub fn listed_import_sources() -> (Vec<&'static str>, Vec<Option<&'static str>>) {
        (
            IMPORT_SOURCES.iter().map(|s| s.label).collect(),
            IMPORT_SOURCES.iter().map(|s| s.url).collect(),
        )
    }
}
