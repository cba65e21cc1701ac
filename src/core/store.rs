//! Purpose: Single-table row engine with a full-document load/save boundary.
//! Exports: `TableStore`, `UpdateSpec`, `ColumnOrder`.
//! Role: Owns one table's rows; every operation reloads, mutates, rewrites whole.
//! Invariants: After insert/update/delete every row exposes the table's column set.
//! Invariants: Columns null in every row are pruned after update/delete, never insert.
//! Invariants: Writes are plain full-file rewrites; no locking, no atomic rename.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::row::{Cell, Row, compare_cells};

/// One predicate plus the patch to merge into matching rows.
#[derive(Clone, Debug)]
pub struct UpdateSpec {
    pub column: String,
    pub value: Cell,
    pub patch: Row,
}

/// Desired column ordering: an explicit name list or a name-to-priority map.
#[derive(Clone, Debug)]
pub enum ColumnOrder {
    Names(Vec<String>),
    Priorities(Vec<(String, i64)>),
}

impl ColumnOrder {
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    let name = item.as_str().ok_or_else(|| {
                        Error::new(ErrorKind::Usage)
                            .with_message("column order list must hold strings")
                    })?;
                    names.push(name.to_string());
                }
                Ok(ColumnOrder::Names(names))
            }
            Value::Object(entries) => {
                let mut priorities = Vec::with_capacity(entries.len());
                for (name, priority) in entries {
                    let priority = priority.as_i64().ok_or_else(|| {
                        Error::new(ErrorKind::Usage)
                            .with_message("column priorities must be integers")
                            .with_column(name)
                    })?;
                    priorities.push((name.clone(), priority));
                }
                Ok(ColumnOrder::Priorities(priorities))
            }
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message("column order must be a list of names or a name-to-priority map")
                .with_hint(r#"Pass either ["a","b"] or {"a":0,"b":1}."#)),
        }
    }

    fn priority(&self, column: &str) -> Option<i64> {
        match self {
            ColumnOrder::Names(names) => names
                .iter()
                .position(|name| name == column)
                .map(|index| index as i64),
            ColumnOrder::Priorities(entries) => entries
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, priority)| *priority),
        }
    }
}

/// One table persisted as a single JSON array of objects.
///
/// Holds nothing in memory between calls beyond the backing path; every
/// public operation opens a fresh snapshot and mutating operations write
/// the full row set back. Concurrent writers race (last writer wins).
#[derive(Clone, Debug)]
pub struct TableStore {
    path: PathBuf,
}

impl TableStore {
    /// Open the table at `path`, creating an empty `[]` document if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        if !store.path.exists() {
            store.save(&[])?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Row>, Error> {
        let text = fs::read_to_string(&self.path)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&self.path).with_source(err))?;
        let document: Value = serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("table document is not valid JSON")
                .with_path(&self.path)
                .with_source(err)
        })?;
        let items = document.as_array().ok_or_else(|| {
            Error::new(ErrorKind::Corrupt)
                .with_message("table document must be a JSON array")
                .with_path(&self.path)
        })?;
        items
            .iter()
            .map(|item| {
                Row::from_json(item).map_err(|err| {
                    Error::new(ErrorKind::Corrupt)
                        .with_message("table document holds an unsupported row")
                        .with_path(&self.path)
                        .with_source(err)
                })
            })
            .collect()
    }

    /// Rewrite the whole document, pretty-printed with 4-space indent.
    pub fn save(&self, rows: &[Row]) -> Result<(), Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        rows.serialize(&mut serializer).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("table encode failed")
                .with_source(err)
        })?;
        fs::write(&self.path, &buf)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&self.path).with_source(err))
    }

    pub fn insert(&self, row: Row) -> Result<(), Error> {
        self.insert_many(vec![row])
    }

    /// Append rows after closing the schema over the union of all columns.
    ///
    /// Existing and incoming rows both gain null for any union column they
    /// lack. No pruning happens here; columns only grow on insert.
    pub fn insert_many(&self, incoming: Vec<Row>) -> Result<(), Error> {
        let mut rows = self.load()?;
        let columns = union_columns(&rows, &incoming);
        fill_missing(&mut rows, &columns);
        let mut incoming = incoming;
        fill_missing(&mut incoming, &columns);
        let added = incoming.len();
        rows.extend(incoming);
        self.save(&rows)?;
        debug!(added, total = rows.len(), "insert");
        Ok(())
    }

    pub fn get_all(&self) -> Result<Vec<Row>, Error> {
        self.load()
    }

    /// Rows where `row.get(column) == value`, in table order. A missing
    /// column reads as null, so a null `value` matches rows lacking it.
    pub fn find_by(&self, column: &str, value: &Cell) -> Result<Vec<Row>, Error> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|row| row.matches(column, value))
            .collect())
    }

    /// Merge `patch` into every row matching the predicate.
    ///
    /// Returns the number of rows matched, whether or not the patch changed
    /// their values. Patch columns new to the table are added as null to
    /// every row first; columns left null everywhere are pruned after.
    pub fn update_by(&self, column: &str, value: &Cell, patch: &Row) -> Result<usize, Error> {
        self.batch_update_by(&[UpdateSpec {
            column: column.to_string(),
            value: value.clone(),
            patch: patch.clone(),
        }])
    }

    /// Apply several update specs against one snapshot, in order.
    ///
    /// Later specs observe earlier specs' effects, so a row matching two
    /// specs is counted twice. Schema closure for new patch columns happens
    /// once up front and pruning once at the end.
    pub fn batch_update_by(&self, specs: &[UpdateSpec]) -> Result<usize, Error> {
        let mut rows = self.load()?;

        let mut new_columns: Vec<String> = Vec::new();
        for spec in specs {
            for name in spec.patch.column_names() {
                let known = rows.iter().any(|row| row.contains(name))
                    || new_columns.iter().any(|have| have == name);
                if !known {
                    new_columns.push(name.to_string());
                }
            }
        }
        fill_missing(&mut rows, &new_columns);

        let mut matched = 0;
        for spec in specs {
            for row in rows.iter_mut() {
                if row.matches(&spec.column, &spec.value) {
                    for (name, cell) in spec.patch.iter() {
                        row.set(name.to_string(), cell.clone());
                    }
                    matched += 1;
                }
            }
        }

        prune_empty_columns(&mut rows);
        self.save(&rows)?;
        debug!(matched, total = rows.len(), "update");
        Ok(matched)
    }

    /// Remove matching rows; returns rows-before minus rows-after.
    pub fn delete_by(&self, column: &str, value: &Cell) -> Result<usize, Error> {
        let mut rows = self.load()?;
        let before = rows.len();
        rows.retain(|row| !row.matches(column, value));
        let removed = before - rows.len();
        prune_empty_columns(&mut rows);
        self.save(&rows)?;
        debug!(removed, total = rows.len(), "delete");
        Ok(removed)
    }

    /// Rename `old` to `new` in every row that has it; the renamed column
    /// moves to the end of that row's remaining columns.
    ///
    /// Rows lacking `old` are left untouched and do not gain `new`, so the
    /// schema can go ragged here until the next insert/update/delete closes
    /// it again. Returns true iff at least one row held `old`; nothing is
    /// written otherwise.
    pub fn rename_column(&self, old: &str, new: &str) -> Result<bool, Error> {
        let mut rows = self.load()?;
        let mut renamed = false;
        for row in rows.iter_mut() {
            if let Some(cell) = row.remove(old) {
                row.set(new.to_string(), cell);
                renamed = true;
            }
        }
        if renamed {
            self.save(&rows)?;
            debug!(old, new, "rename column");
        }
        Ok(renamed)
    }

    /// Order rows by `column` without persisting the result.
    ///
    /// Stable; rows whose value is null land after all non-null rows in both
    /// directions. Mixing text and numeric values under one sort key is a
    /// `Type` error.
    pub fn sort(&self, column: &str, reverse: bool) -> Result<Vec<Row>, Error> {
        sort_rows(self.load()?, column, reverse)
    }

    /// Reorder every row's columns to match the reference row's columns
    /// sorted by `(is_null, stringified value)`. Every row is rebuilt with
    /// exactly the reference row's column set. Not persisted here.
    pub fn sort_columns(&self, reference_index: usize, reverse: bool) -> Result<Vec<Row>, Error> {
        reorder_by_reference(self.load()?, reference_index, reverse)
    }

    /// Reorder each row's own columns: listed names first by ascending
    /// priority, the rest in their original relative order. Column sets are
    /// never changed, only reordered per row. Not persisted here.
    pub fn sort_columns_by_order(&self, order: &ColumnOrder) -> Result<Vec<Row>, Error> {
        Ok(reorder_by_priority(self.load()?, order))
    }
}

fn union_columns(rows: &[Row], extra: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows.iter().chain(extra) {
        for name in row.column_names() {
            if !columns.iter().any(|have| have == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

fn fill_missing(rows: &mut [Row], columns: &[String]) {
    for row in rows.iter_mut() {
        for name in columns {
            if !row.contains(name) {
                row.set(name.clone(), Cell::Null);
            }
        }
    }
}

fn prune_empty_columns(rows: &mut Vec<Row>) {
    let columns = union_columns(rows, &[]);
    for name in &columns {
        if rows.iter().all(|row| row.get_or_null(name).is_null()) {
            for row in rows.iter_mut() {
                row.remove(name);
            }
        }
    }
}

fn sort_rows(rows: Vec<Row>, column: &str, reverse: bool) -> Result<Vec<Row>, Error> {
    let mut non_null: Vec<Row> = Vec::new();
    let mut nulls: Vec<Row> = Vec::new();
    for row in rows {
        if row.get_or_null(column).is_null() {
            nulls.push(row);
        } else {
            non_null.push(row);
        }
    }

    // One ordering class up front so the comparator below cannot fail.
    if let Some(first) = non_null.first() {
        let reference = first.get_or_null(column).clone();
        for row in &non_null {
            compare_cells(&reference, row.get_or_null(column))
                .map_err(|err| err.with_column(column))?;
        }
    }

    non_null.sort_by(|a, b| {
        let ord = compare_cells(a.get_or_null(column), b.get_or_null(column))
            .unwrap_or(Ordering::Equal);
        if reverse { ord.reverse() } else { ord }
    });
    non_null.extend(nulls);
    Ok(non_null)
}

fn reorder_by_reference(
    rows: Vec<Row>,
    reference_index: usize,
    reverse: bool,
) -> Result<Vec<Row>, Error> {
    let reference = rows.get(reference_index).ok_or_else(|| {
        Error::new(ErrorKind::OutOfRange).with_message(format!(
            "reference row index {reference_index} is out of range for {} rows",
            rows.len()
        ))
    })?;

    let mut keyed: Vec<(bool, String, String)> = reference
        .iter()
        .map(|(name, cell)| (cell.is_null(), cell.to_string(), name.to_string()))
        .collect();
    keyed.sort_by(|a, b| {
        let ord = (a.0, &a.1).cmp(&(b.0, &b.1));
        if reverse { ord.reverse() } else { ord }
    });
    let order: Vec<String> = keyed.into_iter().map(|(_, _, name)| name).collect();

    Ok(rows
        .iter()
        .map(|row| {
            order
                .iter()
                .map(|name| {
                    let cell = row.get(name).cloned().unwrap_or(Cell::Null);
                    (name.clone(), cell)
                })
                .collect::<Row>()
        })
        .collect())
}

fn reorder_by_priority(rows: Vec<Row>, order: &ColumnOrder) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            let mut listed: Vec<(i64, String)> = Vec::new();
            let mut rest: Vec<String> = Vec::new();
            for name in row.column_names() {
                match order.priority(name) {
                    Some(priority) => listed.push((priority, name.to_string())),
                    None => rest.push(name.to_string()),
                }
            }
            // Stable, so columns with equal priority keep their row order.
            listed.sort_by_key(|(priority, _)| *priority);
            listed
                .into_iter()
                .map(|(_, name)| name)
                .chain(rest)
                .map(|name| {
                    let cell = row.get(&name).cloned().unwrap_or(Cell::Null);
                    (name, cell)
                })
                .collect::<Row>()
        })
        .collect()
}
