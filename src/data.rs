//! Stratified input tables.
//!
//! A [`StratifiedSource`] hands each row of a named table to a visitor closure. Events turn
//! those rows into a typed [`StratifiedTable`] once, at construction, through [`load_table`].
//! Load failures degrade to an empty table with a logged warning unless the crate is built with
//! the `exit_on_warning` feature.
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, error, warn};

use crate::error::HepceError;
use crate::HashMap;

/// One row of a table: string cells addressed by column name.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Rc<[String]>,
    values: Vec<String>,
}

impl Row {
    #[must_use]
    pub fn new(columns: Rc<[String]>, values: Vec<String>) -> Self {
        Row { columns, values }
    }

    /// # Errors
    /// Returns a `DataError` if the row has no such column.
    pub fn text(&self, column: &str) -> Result<&str, HepceError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .map(|v| v.trim())
            .ok_or_else(|| HepceError::DataError(format!("missing column `{column}`")))
    }

    /// Integer cell. Integral floats such as `"4.0"` are accepted.
    ///
    /// # Errors
    /// Returns a `DataError` if the column is missing or the cell is not an integer.
    pub fn int(&self, column: &str) -> Result<i32, HepceError> {
        let text = self.text(column)?;
        if let Ok(value) = text.parse::<i32>() {
            return Ok(value);
        }
        match text.parse::<f64>() {
            #[allow(clippy::cast_possible_truncation)]
            Ok(value) if value.fract() == 0.0 => Ok(value as i32),
            _ => Err(HepceError::DataError(format!(
                "column `{column}` value `{text}` is not an integer"
            ))),
        }
    }

    /// # Errors
    /// Returns a `DataError` if the column is missing or the cell is not a number.
    pub fn double(&self, column: &str) -> Result<f64, HepceError> {
        let text = self.text(column)?;
        text.parse::<f64>().map_err(|_| {
            HepceError::DataError(format!("column `{column}` value `{text}` is not a number"))
        })
    }
}

/// Callback receiving each row of a selected table.
pub type RowVisitor<'a> = dyn FnMut(&Row) -> Result<(), HepceError> + 'a;

/// A queryable store of named tables.
pub trait StratifiedSource {
    /// Calls `visitor` on every row of `table`, stopping at the first error.
    ///
    /// # Errors
    /// Returns a `DataError` for an unknown table, or any error produced while reading rows or
    /// raised by the visitor.
    fn select(&self, table: &str, visitor: &mut RowVisitor<'_>) -> Result<(), HepceError>;
}

fn visit_csv<R: io::Read>(
    mut reader: csv::Reader<R>,
    visitor: &mut RowVisitor<'_>,
) -> Result<(), HepceError> {
    let columns: Rc<[String]> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    for record in reader.records() {
        let record = record?;
        let row = Row::new(
            Rc::clone(&columns),
            record.iter().map(str::to_string).collect(),
        );
        visitor(&row)?;
    }
    Ok(())
}

/// Tables held in memory as CSV text. Mostly useful for tests and small fixtures.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tables: HashMap<String, String>,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        InMemorySource::default()
    }

    /// Adds a table given as CSV text with a header row.
    #[must_use]
    pub fn with_csv(mut self, table: &str, text: &str) -> Self {
        self.tables.insert(table.to_string(), text.to_string());
        self
    }
}

impl StratifiedSource for InMemorySource {
    fn select(&self, table: &str, visitor: &mut RowVisitor<'_>) -> Result<(), HepceError> {
        let text = self
            .tables
            .get(table)
            .ok_or_else(|| HepceError::DataError(format!("no such table `{table}`")))?;
        visit_csv(csv::Reader::from_reader(text.as_bytes()), visitor)
    }
}

/// Reads `<dir>/<table>.csv`.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        CsvSource {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl StratifiedSource for CsvSource {
    fn select(&self, table: &str, visitor: &mut RowVisitor<'_>) -> Result<(), HepceError> {
        let path = self.dir.join(format!("{table}.csv"));
        let reader = csv::Reader::from_path(&path)?;
        visit_csv(reader, visitor)
    }
}

/// An immutable exact-match lookup from a covariate tuple to a value record.
#[derive(Debug, Clone)]
pub struct StratifiedTable<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Default for StratifiedTable<K, V> {
    fn default() -> Self {
        StratifiedTable {
            entries: HashMap::default(),
        }
    }
}

impl<K: Eq + Hash, V> StratifiedTable<K, V> {
    /// Value for `key`, or `V::default()` if the stratum was never tabulated.
    pub fn get(&self, key: &K) -> V
    where
        V: Clone + Default,
    {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    pub fn try_get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for StratifiedTable<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        StratifiedTable {
            entries: iter.into_iter().collect(),
        }
    }
}

fn read_table<K, V, F>(
    source: &dyn StratifiedSource,
    table: &str,
    mut mapper: F,
) -> Result<StratifiedTable<K, V>, HepceError>
where
    K: Eq + Hash,
    F: FnMut(&Row) -> Result<(K, V), HepceError>,
{
    let mut result = StratifiedTable::default();
    source.select(table, &mut |row| {
        let (key, value) = mapper(row)?;
        result.insert(key, value);
        Ok(())
    })?;
    Ok(result)
}

/// Loads `table` through `mapper`. A read failure is logged and yields an empty table; an empty
/// table is logged as a warning.
///
/// # Errors
/// Only with the `exit_on_warning` feature: returns a `DataError` when the table could not be
/// read or is empty.
pub fn load_table<K, V, F>(
    source: &dyn StratifiedSource,
    table: &str,
    mapper: F,
) -> Result<StratifiedTable<K, V>, HepceError>
where
    K: Eq + Hash,
    F: FnMut(&Row) -> Result<(K, V), HepceError>,
{
    let loaded = match read_table(source, table, mapper) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Error reading table `{table}`: {e}");
            if cfg!(feature = "exit_on_warning") {
                return Err(HepceError::DataError(format!(
                    "failed to load table `{table}`"
                )));
            }
            StratifiedTable::default()
        }
    };
    if loaded.is_empty() {
        warn!("Table `{table}` is empty");
        if cfg!(feature = "exit_on_warning") {
            return Err(HepceError::DataError(format!("table `{table}` is empty")));
        }
    } else {
        debug!("Loaded {} rows from table `{table}`", loaded.len());
    }
    Ok(loaded)
}

/// Like [`load_table`], for tables that are allowed to be absent. Never fails.
pub fn load_optional_table<K, V, F>(
    source: &dyn StratifiedSource,
    table: &str,
    mapper: F,
) -> StratifiedTable<K, V>
where
    K: Eq + Hash,
    F: FnMut(&Row) -> Result<(K, V), HepceError>,
{
    read_table(source, table, mapper).unwrap_or_else(|e| {
        debug!("Optional table `{table}` not loaded: {e}");
        StratifiedTable::default()
    })
}
