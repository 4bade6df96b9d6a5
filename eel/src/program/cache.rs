use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, RwLock,
    },
};

use super::{ExpressionKey, ExpressionStore, Program};
use crate::EelResult;

const LOG_TARGET: &str = "eel::cache";

/// Process wide table of compiled programs, keyed by expression text hash.
///
/// Programs compiled by this cache are remembered as fresh until [`ProgramCache::flush`]
/// merges them into the backing [`ExpressionStore`]. A cache with a store is warmed from
/// it on construction and flushes when dropped.
pub struct ProgramCache {
    programs: RwLock<HashMap<ExpressionKey, Arc<Program>>>,
    fresh: Mutex<Vec<Arc<Program>>>,
    codegen_passes: AtomicUsize,
    store: Option<Box<dyn ExpressionStore>>,
}

impl ProgramCache {
    /// Cache without durable storage.
    pub fn new() -> ProgramCache {
        ProgramCache {
            programs: RwLock::new(HashMap::new()),
            fresh: Mutex::new(Vec::new()),
            codegen_passes: AtomicUsize::new(0),
            store: None,
        }
    }

    pub fn with_store<S: ExpressionStore + 'static>(store: S) -> EelResult<ProgramCache> {
        let loaded = store.load()?;
        let programs: HashMap<ExpressionKey, Arc<Program>> = loaded
            .into_iter()
            .map(|program| (program.key(), Arc::new(program)))
            .collect();

        log::info!(
            target: LOG_TARGET,
            "Loaded {} compiled expressions from store",
            programs.len()
        );

        Ok(ProgramCache {
            programs: RwLock::new(programs),
            fresh: Mutex::new(Vec::new()),
            codegen_passes: AtomicUsize::new(0),
            store: Some(Box::new(store)),
        })
    }

    /// Returns the program for `expression`, compiling and installing it on a miss.
    pub fn get_or_compile(&self, expression: &str) -> EelResult<Arc<Program>> {
        let source = expression.trim();
        let key = ExpressionKey::of(source);

        if let Some(program) = self.lookup(key) {
            if program.source() == source {
                log::trace!(target: LOG_TARGET, "Cache hit for {}", key);
                return Ok(program);
            }

            log::debug!(
                target: LOG_TARGET,
                "Hash collision on {}, compiling \"{}\" uncached",
                key,
                source
            );
            self.codegen_passes.fetch_add(1, Ordering::Relaxed);
            return Program::from_source(source).map(Arc::new);
        }

        self.codegen_passes.fetch_add(1, Ordering::Relaxed);
        let program = Arc::new(Program::from_source(source)?);
        log::debug!(target: LOG_TARGET, "Compiled {} \"{}\"", key, source);

        let mut programs = self
            .programs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match programs.entry(key) {
            Entry::Occupied(o) => Ok(o.get().clone()),
            Entry::Vacant(v) => {
                v.insert(program.clone());
                self.fresh
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(program.clone());
                Ok(program)
            }
        }
    }

    fn lookup(&self, key: ExpressionKey) -> Option<Arc<Program>> {
        self.programs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
            .cloned()
    }

    /// Merges the programs compiled since the last flush into the store. Returns how many
    /// the store did not have yet.
    pub fn flush(&self) -> EelResult<usize> {
        let fresh = std::mem::take(
            &mut *self
                .fresh
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );

        let Some(store) = &self.store else {
            return Ok(0);
        };

        if fresh.is_empty() {
            return Ok(0);
        }

        match store.merge(&fresh) {
            Ok(added) => {
                log::info!(
                    target: LOG_TARGET,
                    "Flushed {} new compiled expressions to store",
                    added
                );
                Ok(added)
            }
            Err(err) => {
                self.fresh
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .extend(fresh);
                Err(err)
            }
        }
    }

    /// Number of code generation passes this cache has run.
    pub fn codegen_passes(&self) -> usize {
        self.codegen_passes.load(Ordering::Relaxed)
    }

    pub fn fresh_len(&self) -> usize {
        self.fresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn len(&self) -> usize {
        self.programs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProgramCache {
    fn default() -> Self {
        ProgramCache::new()
    }
}

impl Drop for ProgramCache {
    fn drop(&mut self) {
        if self.store.is_none() {
            return;
        }

        if let Err(err) = self.flush() {
            log::warn!(
                target: LOG_TARGET,
                "Failed to flush compiled expressions on drop: {}",
                err
            );
        }
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, thread};

    use super::ProgramCache;
    use crate::{ExpressionStore, FileExpressionStore, MemoryExpressionStore};

    #[test]
    fn test_compiles_once() {
        let cache = ProgramCache::new();

        let a = cache.get_or_compile("1 + x").unwrap();
        let b = cache.get_or_compile("  1 + x ").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.codegen_passes(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.fresh_len(), 1);
    }

    #[test]
    fn test_parse_error_is_not_cached() {
        let cache = ProgramCache::new();

        assert!(cache.get_or_compile("1 +").is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.fresh_len(), 0);
    }

    #[test]
    fn test_flush_without_store() {
        let cache = ProgramCache::new();
        cache.get_or_compile("a").unwrap();

        assert_eq!(cache.flush().unwrap(), 0);
        assert_eq!(cache.fresh_len(), 0);
    }

    #[test]
    fn test_warm_and_flush() {
        let store = Arc::new(MemoryExpressionStore::new());

        {
            let cache = ProgramCache::with_store(store.clone()).unwrap();
            cache.get_or_compile("a.b").unwrap();
            cache.get_or_compile("c").unwrap();
            assert_eq!(cache.flush().unwrap(), 2);
            assert_eq!(cache.flush().unwrap(), 0);
        }

        let cache = ProgramCache::with_store(store.clone()).unwrap();
        assert_eq!(cache.len(), 2);

        cache.get_or_compile("a.b").unwrap();
        assert_eq!(cache.codegen_passes(), 0);
        assert_eq!(cache.fresh_len(), 0);
    }

    #[test]
    fn test_flush_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("programs.jsonl");

        {
            let cache = ProgramCache::with_store(FileExpressionStore::new(&path)).unwrap();
            cache.get_or_compile("x * 2").unwrap();
        }

        let stored = FileExpressionStore::new(&path).load().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].source(), "x * 2");
    }

    #[test]
    fn test_shared_between_threads() {
        let cache = Arc::new(ProgramCache::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.get_or_compile("a && b").unwrap())
            })
            .collect();

        let programs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.fresh_len(), 1);
        assert!(programs.iter().all(|p| Arc::ptr_eq(p, &programs[0])));
    }
}
