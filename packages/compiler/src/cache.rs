use crate::error::CompileError;
use crate::unit::ExecutableUnit;
use pagewright_common::content_hash;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, instrument};

pub type CompileOutcome = Result<Arc<ExecutableUnit>, CompileError>;

/// Memoizes compilation by content hash.
///
/// Compilation is a pure function of the source text, so outcomes (failures
/// included) are cached indefinitely. A second table maps
/// `(version id, path)` to the hash last compiled at that address.
#[derive(Debug, Default)]
pub struct CompileCache {
    outcomes: RwLock<HashMap<String, CompileOutcome>>,
    addresses: RwLock<HashMap<(String, String), String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source`, reusing a cached outcome for identical text
    pub fn compile(&self, source: &str) -> CompileOutcome {
        let hash = content_hash(source);
        self.compile_hashed(hash, source)
    }

    fn compile_hashed(&self, hash: String, source: &str) -> CompileOutcome {
        if let Some(outcome) = self
            .outcomes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&hash)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return outcome.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let outcome = crate::compile(source).map(Arc::new);
        self.outcomes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(hash)
            .or_insert_with(|| outcome.clone());
        outcome
    }

    /// Compile a file of a version and remember its address
    pub fn compile_addressed(&self, version_id: &str, path: &str, source: &str) -> CompileOutcome {
        let hash = content_hash(source);
        self.addresses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((version_id.to_string(), path.to_string()), hash.clone());
        self.compile_hashed(hash, source)
    }

    /// Cached outcome for a `(version id, path)` address, if compiled before
    pub fn lookup(&self, version_id: &str, path: &str) -> Option<CompileOutcome> {
        let hash = self
            .addresses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(version_id.to_string(), path.to_string()))
            .cloned()?;
        self.outcomes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&hash)
            .cloned()
    }

    /// Compile every `(path, source)` pair of a version in parallel.
    /// Results come back in input order.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub fn compile_files(&self, version_id: &str, files: &[(String, String)]) -> Vec<(String, CompileOutcome)> {
        let results: Vec<(String, CompileOutcome)> = files
            .par_iter()
            .map(|(path, source)| (path.clone(), self.compile_addressed(version_id, path, source)))
            .collect();

        let failed = results.iter().filter(|(_, outcome)| outcome.is_err()).count();
        debug!(failed, "compiled file set");
        results
    }

    /// Drop the address table of a version; outcomes stay cached by hash
    pub fn forget_version(&self, version_id: &str) {
        self.addresses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(version, _), _| version != version_id);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.outcomes.read().unwrap_or_else(PoisonError::into_inner).len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
