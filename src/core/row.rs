//! Purpose: Define the closed scalar cell variant and the ordered row mapping.
//! Exports: `Cell`, `Row`, `compare_cells`.
//! Role: In-memory data model shared by the table store, registry, and CLI.
//! Invariants: Cells are scalars only; arrays/objects never enter a row.
//! Invariants: Column insertion order is preserved; removal shifts, never swaps.

use std::cmp::Ordering;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value};

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug)]
pub enum Cell {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

const NULL_CELL: Cell = Cell::Null;

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Bool(_) => "bool",
            Cell::Number(_) => "number",
            Cell::Text(_) => "text",
        }
    }

    /// Scalar JSON values map directly; arrays and objects are rejected.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(Cell::Null),
            Value::Bool(flag) => Ok(Cell::Bool(*flag)),
            Value::Number(number) => Ok(Cell::Number(number.clone())),
            Value::String(text) => Ok(Cell::Text(text.clone())),
            Value::Array(_) | Value::Object(_) => Err(Error::new(ErrorKind::Usage)
                .with_message("nested values are not supported in cells")
                .with_hint("Cell values must be null, a boolean, a number, or a string.")),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Bool(flag) => Value::Bool(*flag),
            Cell::Number(number) => Value::Number(number.clone()),
            Cell::Text(text) => Value::String(text.clone()),
        }
    }

    // Bools join numbers in one numeric ordering class (true sorts as 1).
    fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(number) => number.as_f64(),
            Cell::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Bool(flag) => write!(f, "{flag}"),
            Cell::Number(number) => write!(f, "{number}"),
            Cell::Text(text) => write!(f, "{text}"),
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Null, Cell::Null) => true,
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            (Cell::Number(a), Cell::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => a == b,
            },
            (Cell::Text(a), Cell::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_unit(),
            Cell::Bool(flag) => serializer.serialize_bool(*flag),
            Cell::Number(number) => number.serialize(serializer),
            Cell::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Order two non-null cells under the natural ordering.
///
/// Texts order lexicographically, numerics (numbers and bools) numerically.
/// Mixing the two classes is a `Type` error surfaced to the caller.
pub fn compare_cells(a: &Cell, b: &Cell) -> Result<Ordering, Error> {
    match (a, b) {
        (Cell::Text(x), Cell::Text(y)) => Ok(x.cmp(y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(x.total_cmp(&y)),
            _ => Err(Error::new(ErrorKind::Type).with_message(format!(
                "cannot order {} against {}",
                a.kind_name(),
                b.kind_name()
            ))),
        },
    }
}

/// One record: an ordered mapping from column name to scalar cell.
///
/// Column order matters for display and reorder operations but not for
/// equality; two rows are equal when they hold the same column/value pairs.
#[derive(Clone, Debug, Default)]
pub struct Row {
    columns: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == column)
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    /// Missing columns read as null; this is the predicate-match semantics.
    pub fn get_or_null(&self, column: &str) -> &Cell {
        self.get(column).unwrap_or(&NULL_CELL)
    }

    /// Overwrite in place when the column exists, append otherwise.
    pub fn set(&mut self, column: impl Into<String>, cell: Cell) {
        let column = column.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = cell,
            None => self.columns.push((column, cell)),
        }
    }

    /// Shift-remove: the remaining columns keep their relative order.
    pub fn remove(&mut self, column: &str) -> Option<Cell> {
        let index = self.columns.iter().position(|(name, _)| name == column)?;
        Some(self.columns.remove(index).1)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.columns.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    pub fn matches(&self, column: &str, value: &Cell) -> bool {
        self.get_or_null(column) == value
    }

    pub fn from_json(value: &Value) -> Result<Self, Error> {
        let object = value.as_object().ok_or_else(|| {
            Error::new(ErrorKind::Usage).with_message("row must be a JSON object")
        })?;
        let mut row = Row::new();
        for (name, value) in object {
            let cell = Cell::from_json(value).map_err(|err| err.with_column(name))?;
            row.set(name.clone(), cell);
        }
        Ok(row)
    }

    pub fn to_json(&self) -> Value {
        let mut object = serde_json::Map::new();
        for (name, cell) in &self.columns {
            object.insert(name.clone(), cell.to_json());
        }
        Value::Object(object)
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, cell)| other.get(name) == Some(cell))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, cell) in &self.columns {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

impl FromIterator<(String, Cell)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Cell)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (name, cell) in iter {
            row.set(name, cell);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, Row, compare_cells};
    use crate::core::error::ErrorKind;
    use serde_json::json;
    use std::cmp::Ordering;

    fn cell(value: serde_json::Value) -> Cell {
        Cell::from_json(&value).expect("scalar cell")
    }

    #[test]
    fn numbers_compare_numerically_across_representations() {
        assert_eq!(cell(json!(1)), cell(json!(1.0)));
        assert_ne!(cell(json!(1)), cell(json!(2)));
        assert_ne!(cell(json!(true)), cell(json!(1)));
    }

    #[test]
    fn missing_column_reads_as_null() {
        let row = Row::from_json(&json!({"id": 1})).expect("row");
        assert!(row.matches("ghost", &Cell::Null));
        assert!(!row.matches("id", &Cell::Null));
    }

    #[test]
    fn nested_values_are_rejected() {
        let err = Row::from_json(&json!({"id": [1, 2]})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn remove_preserves_order_of_survivors() {
        let mut row = Row::from_json(&json!({"a": 1, "b": 2, "c": 3})).expect("row");
        row.remove("b");
        let names: Vec<&str> = row.column_names().collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut row = Row::from_json(&json!({"a": 1, "b": 2})).expect("row");
        row.set("a", cell(json!(9)));
        let names: Vec<&str> = row.column_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&cell(json!(9))));
    }

    #[test]
    fn row_equality_ignores_column_order() {
        let a = Row::from_json(&json!({"x": 1, "y": 2})).expect("row");
        let b = Row::from_json(&json!({"y": 2, "x": 1})).expect("row");
        assert_eq!(a, b);
    }

    #[test]
    fn ordering_mixes_bools_into_numbers() {
        let less = compare_cells(&cell(json!(false)), &cell(json!(0.5))).expect("ord");
        assert_eq!(less, Ordering::Less);
    }

    #[test]
    fn ordering_rejects_text_against_number() {
        let err = compare_cells(&cell(json!("10")), &cell(json!(9))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn row_serializes_in_column_order() {
        let row = Row::from_json(&json!({"b": 2, "a": null})).expect("row");
        let text = serde_json::to_string(&row).expect("serialize");
        assert_eq!(text, r#"{"b":2,"a":null}"#);
    }
}
