//! Purpose: Map table names to `TableStore` instances inside one root directory.
//! Exports: `Registry`.
//! Role: Thin lifecycle layer; all row manipulation happens in `TableStore`.
//! Invariants: Table names contain no path separators; backing files are `<name>.json`.
//! Invariants: The name cache is plain in-process state; callers add their own locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::row::Row;
use crate::core::store::{ColumnOrder, TableStore};

const TABLE_EXT: &str = "json";

/// Explicit registry instance held by the host application.
///
/// Not thread-safe: the name cache is unsynchronized, and the stores it
/// hands out race with each other at the file level by design.
#[derive(Debug)]
pub struct Registry {
    dir: PathBuf,
    tables: HashMap<String, TableStore>,
}

impl Registry {
    /// Open a registry rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&dir).with_source(err))?;
        Ok(Self {
            dir,
            tables: HashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, name: &str) -> Result<PathBuf, Error> {
        if name.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("table name must not be empty"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("table name must not contain path separators")
                .with_hint("Use a bare name; the registry owns the directory layout."));
        }
        Ok(self.dir.join(format!("{name}.{TABLE_EXT}")))
    }

    /// Return the store for `name`, creating an empty backing file if absent.
    pub fn resolve(&mut self, name: &str) -> Result<TableStore, Error> {
        if let Some(store) = self.tables.get(name) {
            return Ok(store.clone());
        }
        let store = TableStore::open(self.table_path(name)?)?;
        self.tables.insert(name.to_string(), store.clone());
        Ok(store)
    }

    /// Same as `resolve`: guarantees the backing file exists and never
    /// truncates one that already does.
    pub fn create(&mut self, name: &str) -> Result<TableStore, Error> {
        let store = self.resolve(name)?;
        debug!(name, path = %store.path().display(), "create table");
        Ok(store)
    }

    /// Enumerate backing files currently on disk, sorted by name. The
    /// in-memory cache plays no part here.
    pub fn list(&self) -> Result<Vec<String>, Error> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&self.dir).with_source(err))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|err| Error::new(ErrorKind::Io).with_path(&self.dir).with_source(err))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(TABLE_EXT) {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove the backing file and evict the cache entry. False when the
    /// file did not exist.
    pub fn delete(&mut self, name: &str) -> Result<bool, Error> {
        let path = self.table_path(name)?;
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&path).with_source(err))?;
        self.tables.remove(name);
        debug!(name, "delete table");
        Ok(true)
    }

    /// Sort rows by `column` and persist the new ordering.
    pub fn sort_table(
        &mut self,
        name: &str,
        column: &str,
        reverse: bool,
    ) -> Result<Vec<Row>, Error> {
        let store = self.resolve(name)?;
        let rows = store.sort(column, reverse)?;
        store.save(&rows)?;
        Ok(rows)
    }

    /// Reorder columns against a reference row and persist the result.
    pub fn sort_columns(
        &mut self,
        name: &str,
        reference_index: usize,
        reverse: bool,
    ) -> Result<Vec<Row>, Error> {
        let store = self.resolve(name)?;
        let rows = store.sort_columns(reference_index, reverse)?;
        store.save(&rows)?;
        Ok(rows)
    }

    /// Reorder columns by an explicit ordering and persist the result.
    pub fn sort_columns_by_order(
        &mut self,
        name: &str,
        order: &ColumnOrder,
    ) -> Result<Vec<Row>, Error> {
        let store = self.resolve(name)?;
        let rows = store.sort_columns_by_order(order)?;
        store.save(&rows)?;
        Ok(rows)
    }

    pub fn rename_column(&mut self, name: &str, old: &str, new: &str) -> Result<bool, Error> {
        self.resolve(name)?.rename_column(old, new)
    }
}
