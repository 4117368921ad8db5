//! Compiler and dictionary-handle seams, plus the bundled word-list
//! fallback suggester.

use std::sync::Arc;

use log::debug;

use super::error::Result;

/// A compiled, queryable dictionary.
pub trait DictionaryHandle: Send + Sync {
    /// Candidate corrections for `word`, best first.
    fn suggest(&self, word: &str) -> Vec<String>;
}

/// The affix/word-list compiler seam.
///
/// The full morphological engine is an external capability consumed as a
/// black box; implementations receive the raw bytes of the package's aff
/// and dic members.
pub trait AffixCompiler: Send + Sync {
    fn compile(&self, aff: &[u8], dic: &[u8]) -> Result<Arc<dyn DictionaryHandle>>;
}

/// Bundled fallback compiler over the word list alone.
///
/// Affix rules are not expanded: entries are the bare word stems of the
/// `.dic` member (count header skipped, `/flag` suffixes stripped), and
/// suggestions rank them by Jaro-Winkler similarity to the query.
#[derive(Debug, Clone)]
pub struct WordListCompiler {
    pub max_suggestions: usize,
    pub min_similarity: f64,
}

impl Default for WordListCompiler {
    fn default() -> Self {
        Self {
            max_suggestions: 5,
            min_similarity: 0.7,
        }
    }
}

impl AffixCompiler for WordListCompiler {
    fn compile(&self, _aff: &[u8], dic: &[u8]) -> Result<Arc<dyn DictionaryHandle>> {
        let text = String::from_utf8_lossy(dic);
        let mut words = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            // The first line of a word list is the declared entry count.
            if line_no == 0 && line.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let word = line.split('/').next().unwrap_or(line).trim();
            if !word.is_empty() {
                words.push(word.to_string());
            }
        }
        debug!("Compiled word list with {} entries", words.len());
        Ok(Arc::new(WordListDictionary {
            words,
            max_suggestions: self.max_suggestions,
            min_similarity: self.min_similarity,
        }))
    }
}

struct WordListDictionary {
    words: Vec<String>,
    max_suggestions: usize,
    min_similarity: f64,
}

impl DictionaryHandle for WordListDictionary {
    fn suggest(&self, word: &str) -> Vec<String> {
        let query = word.to_lowercase();
        let mut scored: Vec<(f64, &String)> = self
            .words
            .iter()
            .map(|candidate| (strsim::jaro_winkler(&query, &candidate.to_lowercase()), candidate))
            .filter(|(score, _)| *score >= self.min_similarity)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(self.max_suggestions)
            .map(|(_, candidate)| candidate.clone())
            .collect()
    }
}
