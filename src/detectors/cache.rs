//! Per-file cache owned by a detector.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Values computed once per file, keyed by absolute path.
///
/// Entries are never shared between files; callers clear the cache between
/// scans with [`FileCache::clear`].
#[derive(Debug, Clone)]
pub struct FileCache<V> {
    entries: HashMap<PathBuf, V>,
}

impl<V> Default for FileCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> FileCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&V> {
        self.entries.get(path)
    }

    /// Return the cached value for `path`, computing it on first access.
    pub fn get_or_insert_with(&mut self, path: &Path, compute: impl FnOnce() -> V) -> &V {
        self.entries
            .entry(path.to_path_buf())
            .or_insert_with(compute)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computes_once_per_path() {
        let mut cache = FileCache::new();
        let mut calls = 0;

        cache.get_or_insert_with(Path::new("/a.ts"), || {
            calls += 1;
            true
        });
        cache.get_or_insert_with(Path::new("/a.ts"), || {
            calls += 1;
            false
        });

        assert_eq!(calls, 1);
        assert_eq!(cache.get(Path::new("/a.ts")), Some(&true));
    }

    #[test]
    fn test_keys_are_per_file() {
        let mut cache = FileCache::new();
        cache.get_or_insert_with(Path::new("/a.ts"), || 1);
        let b = *cache.get_or_insert_with(Path::new("/b.ts"), || 2);

        assert_eq!(b, 2);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
