//! Process-lifetime cache of package syntax, keyed by directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use tracing::{debug, trace, warn};

use crate::error::CodeError;
use crate::loader::{CargoLoader, SourceLoader};
use crate::syntax::SyntaxForest;

/// Memoizes one [`SyntaxForest`] per requested directory.
///
/// Reads are concurrent; population is serialized so a directory is
/// loaded at most once even when several tests miss at the same time.
/// Failed loads are not remembered and will be retried.
pub struct PackageCache {
    loader: Box<dyn SourceLoader>,
    populate: Mutex<()>,
    entries: RwLock<HashMap<PathBuf, Arc<SyntaxForest>>>,
}

impl PackageCache {
    /// A cache backed by [`CargoLoader`].
    pub fn new() -> Self {
        Self::with_loader(CargoLoader)
    }

    pub fn with_loader(loader: impl SourceLoader + 'static) -> Self {
        PackageCache {
            loader: Box::new(loader),
            populate: Mutex::new(()),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The cache shared by the whole process.
    pub fn global() -> &'static PackageCache {
        static GLOBAL: OnceLock<PackageCache> = OnceLock::new();
        GLOBAL.get_or_init(PackageCache::new)
    }

    /// Return the forest for `dir`, loading it on first use.
    pub fn get(&self, dir: &Path) -> Result<Arc<SyntaxForest>, CodeError> {
        if let Some(forest) = self.cached(dir) {
            trace!(dir = %dir.display(), "package cache hit");
            return Ok(forest);
        }

        let _guard = self
            .populate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(forest) = self.cached(dir) {
            return Ok(forest);
        }

        debug!(dir = %dir.display(), "package cache miss");
        let forest = match self.loader.load(dir) {
            Ok(forest) => Arc::new(forest),
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "failed to load package syntax");
                return Err(err);
            }
        };
        self.entries
            .write()
            .expect("package cache lock poisoned")
            .insert(dir.to_path_buf(), Arc::clone(&forest));
        Ok(forest)
    }

    /// Load `dir` eagerly, typically from suite setup.
    ///
    /// # Panics
    ///
    /// Panics when the package cannot be loaded.
    pub fn init(&self, dir: &Path) {
        if let Err(err) = self.get(dir) {
            panic!("fail to init package cache: {err}");
        }
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.cached(dir).is_some()
    }

    fn cached(&self, dir: &Path) -> Option<Arc<SyntaxForest>> {
        self.entries
            .read()
            .expect("package cache lock poisoned")
            .get(dir)
            .cloned()
    }
}

impl Default for PackageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PackageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .entries
            .read()
            .map(|e| e.len())
            .unwrap_or_default();
        f.debug_struct("PackageCache")
            .field("entries", &entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl SourceLoader for CountingLoader {
        fn load(&self, dir: &Path) -> Result<SyntaxForest, CodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CodeError::load(dir, "boom"));
            }
            Ok(SyntaxForest {
                root: dir.to_path_buf(),
                ..SyntaxForest::default()
            })
        }
    }

    fn counting(fail: bool) -> (PackageCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = PackageCache::with_loader(CountingLoader {
            calls: Arc::clone(&calls),
            fail,
        });
        (cache, calls)
    }

    #[test]
    fn repeated_gets_share_one_load() {
        let (cache, calls) = counting(false);
        let first = cache.get(Path::new("/pkg")).expect("loads");
        let second = cache.get(Path::new("/pkg")).expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(Path::new("/pkg")));
    }

    #[test]
    fn concurrent_misses_load_once() {
        let (cache, calls) = counting(false);
        let cache = Arc::new(cache);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get(Path::new("/pkg")).expect("loads"))
            })
            .collect();
        let forests: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread joins"))
            .collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(forests.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn failures_are_not_cached() {
        let (cache, calls) = counting(true);
        assert!(cache.get(Path::new("/pkg")).is_err());
        assert!(cache.get(Path::new("/pkg")).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cache.contains(Path::new("/pkg")));
    }

    #[test]
    #[should_panic(expected = "fail to init package cache: failed to load packages from /pkg: boom")]
    fn init_panics_on_failure() {
        let (cache, _) = counting(true);
        cache.init(Path::new("/pkg"));
    }

    #[test]
    fn different_directories_are_separate_entries() {
        let (cache, calls) = counting(false);
        let a = cache.get(Path::new("/a")).expect("loads");
        let b = cache.get(Path::new("/b")).expect("loads");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
