use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::load_file;
use super::model::CustomerTable;
use crate::error::{LoadError, LoadResult};

// ---------------------------------------------------------------------------
// DatasetCache – load once, reload on modification
// ---------------------------------------------------------------------------

struct CachedTable {
    modified: Option<SystemTime>,
    table: Arc<CustomerTable>,
}

/// Holds the parsed table for one source path.
///
/// [`DatasetCache::load`] re-reads the file only when its modification time
/// differs from the one observed at the previous read, or after
/// [`DatasetCache::invalidate`].  The returned table is shared read-only.
pub struct DatasetCache {
    path: PathBuf,
    entry: Option<CachedTable>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entry: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached table, reading the file if needed.
    pub fn load(&mut self) -> LoadResult<Arc<CustomerTable>> {
        let modified = self.modified_time()?;

        if let Some(entry) = &self.entry {
            if entry.modified == modified && modified.is_some() {
                log::debug!("Dataset cache hit for {}", self.path.display());
                return Ok(Arc::clone(&entry.table));
            }
        }

        let table = Arc::new(load_file(&self.path)?);
        self.entry = Some(CachedTable {
            modified,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Drop the cached table so the next [`load`](Self::load) re-reads it.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.entry.is_some()
    }

    /// `None` when the platform cannot report mtimes; such files are re-read
    /// on every call.
    fn modified_time(&self) -> LoadResult<Option<SystemTime>> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.modified().ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoadError::NotFound {
                path: self.path.clone(),
            }),
            Err(source) => Err(LoadError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const HEADER: &str = "CustomerID,ContractType,Gender,SeniorCitizen,TenureMonths,MonthlyCharges,Churn,PaymentMethod,TechSupport,OnlineBackup,StreamingTV,DeviceProtection";

    fn write_rows(path: &Path, rows: usize) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for i in 0..rows {
            writeln!(file, "C{i},One year,Male,0,10,30.0,No,Mailed check,No,No,No,No").unwrap();
        }
    }

    #[test]
    fn test_repeated_loads_share_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.csv");
        write_rows(&path, 3);

        let mut cache = DatasetCache::new(&path);
        let first = cache.load().unwrap();
        let second = cache.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_reload_after_modification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.csv");
        write_rows(&path, 3);

        let mut cache = DatasetCache::new(&path);
        let first = cache.load().unwrap();

        write_rows(&path, 5);
        let later = SystemTime::now() + Duration::from_secs(5);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let second = cache.load().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 5);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_invalidate_forces_reread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.csv");
        write_rows(&path, 2);

        let mut cache = DatasetCache::new(&path);
        let first = cache.load().unwrap();
        cache.invalidate();
        assert!(!cache.is_loaded());
        let second = cache.load().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DatasetCache::new(dir.path().join("absent.csv"));
        assert!(matches!(cache.load(), Err(LoadError::NotFound { .. })));
    }
}
