//! Locale resolution and the loaded-dictionary cache.

use std::collections::HashMap;
use std::fs::File;
use std::sync::Arc;

use log::{debug, error, info};

use super::archive::ZipArchive;
use super::error::Result;
use super::index::DictionaryIndex;
use super::locator::{ResourceRef, StorageRoots};
use super::models::{DictionaryMeta, LocaleTag};
use super::suggest::{AffixCompiler, DictionaryHandle};

/// Index and compiled-handle cache behind the manager's single lock.
///
/// Resolution reads the index and writes the cache as one atomic step, so
/// both live under the same guard. Cache entries are keyed by the same
/// locator as the index entry they were compiled from and are never
/// evicted.
#[derive(Default)]
pub(crate) struct ResolverState {
    pub index: DictionaryIndex,
    pub cache: HashMap<ResourceRef, Arc<dyn DictionaryHandle>>,
}

impl ResolverState {
    /// Resolve a locale to a loaded dictionary handle.
    ///
    /// Matching is exact first (full tag, region and script included), then
    /// falls back to the first index entry sharing the primary language
    /// subtag; index order is scan order, not sorted. No match is a
    /// legitimate outcome, not an error. Load or compile failures are
    /// logged and also answered with `None`: a corrupt on-disk dictionary
    /// must not crash the caller.
    pub fn resolve(
        &mut self,
        locale: &LocaleTag,
        roots: &StorageRoots,
        compiler: &dyn AffixCompiler,
    ) -> Option<Arc<dyn DictionaryHandle>> {
        let query = locale.to_string();
        let (locator, meta) = self
            .index
            .iter()
            .find(|(_, meta)| meta.locale.to_string() == query)
            .or_else(|| {
                self.index
                    .iter()
                    .find(|(_, meta)| meta.locale.language() == locale.language())
            })
            .map(|(locator, meta)| (locator.clone(), meta.clone()))?;

        if let Some(handle) = self.cache.get(&locator) {
            debug!("Loaded-dictionary cache hit for {}", locator);
            return Some(Arc::clone(handle));
        }

        match load_and_compile(&locator, &meta, roots, compiler) {
            Ok(handle) => {
                self.cache.insert(locator, Arc::clone(&handle));
                Some(handle)
            }
            Err(err) => {
                error!("Failed to load dictionary at {}: {}", locator, err);
                None
            }
        }
    }
}

/// Materialize one installed package and hand its members to the compiler.
fn load_and_compile(
    locator: &ResourceRef,
    meta: &DictionaryMeta,
    roots: &StorageRoots,
    compiler: &dyn AffixCompiler,
) -> Result<Arc<dyn DictionaryHandle>> {
    info!("Compiling dictionary {:?} from {}", meta.id, locator);
    let mut zip = ZipArchive::new(File::open(locator.absolute_path(roots))?)?;
    let aff = zip.read_member(&meta.aff_file)?;
    let dic = zip.read_member(&meta.dic_file)?;
    compiler.compile(&aff, &dic)
}
