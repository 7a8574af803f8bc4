use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::error::LoadError;
use super::loader::{load_file, LoadOptions};
use super::model::Dataset;

/// Identity of a source file: where it lives and what it looked like when
/// it was parsed. A rewritten file gets a new identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceKey {
    pub fn for_path(path: &Path) -> Result<Self, LoadError> {
        let canonical = path.canonicalize().map_err(|e| LoadError::io(path, e))?;
        let meta = std::fs::metadata(&canonical).map_err(|e| LoadError::io(path, e))?;
        Ok(SourceKey {
            path: canonical,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Canonical form of `path`, or, when the file itself is gone, its
/// canonical parent joined with the file name.
fn canonical_or_lexical(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Memoizes parsed datasets per source so repeated requests skip parsing.
///
/// Nothing is evicted implicitly except an older entry for a path whose
/// file has since changed; use [`DatasetCache::invalidate`] or
/// [`DatasetCache::reload`] to force a fresh parse.
#[derive(Debug, Default)]
pub struct DatasetCache {
    options: LoadOptions,
    entries: HashMap<SourceKey, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new(options: LoadOptions) -> Self {
        DatasetCache {
            options,
            entries: HashMap::new(),
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Return the cached dataset for `path`, parsing it on a miss.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        let key = SourceKey::for_path(path)?;
        if let Some(ds) = self.entries.get(&key) {
            log::debug!("dataset cache hit for {}", key.path.display());
            return Ok(Arc::clone(ds));
        }

        log::debug!("dataset cache miss for {}", key.path.display());
        self.entries.retain(|k, _| k.path != key.path);
        let dataset = Arc::new(load_file(&key.path, &self.options)?);
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Forget every cached version of `path`. Returns whether anything was
    /// removed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let target = canonical_or_lexical(path);
        let before = self.entries.len();
        self.entries.retain(|k, _| k.path != target);
        before != self.entries.len()
    }

    /// Drop the cached copy and parse `path` again.
    pub fn reload(&mut self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        self.invalidate(path);
        self.get_or_load(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        match path.canonicalize() {
            Ok(target) => self.entries.keys().any(|k| k.path == target),
            Err(_) => false,
        }
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

    const HEADER: &str = "Order_ID,Date,Category,Region,Quantity,Price\n";

    fn write_csv(path: &Path, rows: &[&str]) {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn second_request_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        write_csv(&path, &["1,2024-01-01,A,X,1,1"]);

        let mut cache = DatasetCache::default();
        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&path));
    }

    #[test]
    fn changed_file_is_parsed_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        write_csv(&path, &["1,2024-01-01,A,X,1,1"]);

        let mut cache = DatasetCache::default();
        assert_eq!(cache.get_or_load(&path).unwrap().len(), 1);

        // Different length guarantees a different key even with a coarse mtime.
        write_csv(&path, &["1,2024-01-01,A,X,1,1", "2,2024-01-02,B,Y,1,1"]);
        assert_eq!(cache.get_or_load(&path).unwrap().len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_finds_deleted_file_through_unnormalized_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let path = dir.path().join("sales.csv");
        write_csv(&path, &["1,2024-01-01,A,X,1,1"]);
        let roundabout = dir.path().join("sub").join("..").join("sales.csv");

        let mut cache = DatasetCache::default();
        cache.get_or_load(&roundabout).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(cache.invalidate(&roundabout));
        assert!(cache.is_empty());
    }

    #[test]
    fn reload_and_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        write_csv(&path, &["1,2024-01-01,A,X,1,1"]);

        let mut cache = DatasetCache::new(LoadOptions::default());
        let first = cache.get_or_load(&path).unwrap();
        let reloaded = cache.reload(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));

        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_load_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "Order_ID,Date\n1,2024-01-01\n").unwrap();

        let mut cache = DatasetCache::default();
        assert!(matches!(
            cache.get_or_load(&path),
            Err(LoadError::MissingColumns(_))
        ));
        assert!(cache.is_empty());
        assert!(matches!(
            cache.get_or_load(&dir.path().join("nope.csv")),
            Err(LoadError::Io { .. })
        ));
    }
}
