use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::error::Result;

/// A single cell materialized out of the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// An ordered set of named columns with row-major values. Zero rows is a
/// valid result and is how both "nothing matched" and a degraded query
/// failure present to callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Text content of a cell; non-text and absent cells read as "".
    pub fn text(&self, row: usize, col: usize) -> &str {
        match self.rows.get(row).and_then(|r| r.get(col)) {
            Some(Value::Text(s)) => s,
            _ => "",
        }
    }

    /// Numeric content of a cell; nulls and absent cells read as zero.
    pub fn number(&self, row: usize, col: usize) -> f64 {
        match self.rows.get(row).and_then(|r| r.get(col)) {
            Some(Value::Real(f)) => *f,
            Some(Value::Integer(i)) => *i as f64,
            _ => 0.0,
        }
    }
}

/// Cache service owned by the executor. Injected so tests can substitute
/// a spy or disable memoization entirely.
pub trait QueryCache {
    fn get(&self, key: &str) -> Option<&QueryResult>;
    fn put(&mut self, key: String, result: QueryResult);
}

/// Process-lifetime memoization keyed by statement text plus bound
/// parameters. Entries are never evicted.
#[derive(Default)]
pub struct MemoCache {
    entries: HashMap<String, QueryResult>,
}

impl QueryCache for MemoCache {
    fn get(&self, key: &str) -> Option<&QueryResult> {
        self.entries.get(key)
    }

    fn put(&mut self, key: String, result: QueryResult) {
        self.entries.insert(key, result);
    }
}

pub struct NoopCache;

impl QueryCache for NoopCache {
    fn get(&self, _key: &str) -> Option<&QueryResult> {
        None
    }

    fn put(&mut self, _key: String, _result: QueryResult) {}
}

/// Executes ready-to-run SQL against the accounting store. Every miss opens
/// a fresh read-only connection that is released when the call returns,
/// on success and failure alike. Failures degrade to an empty result; the
/// message is held for the shell to surface via [`take_error`].
///
/// [`take_error`]: QueryExecutor::take_error
pub struct QueryExecutor {
    store_path: PathBuf,
    cache: Box<dyn QueryCache>,
    round_trips: u64,
    last_error: Option<String>,
}

impl QueryExecutor {
    pub fn new(store_path: &Path) -> Self {
        Self::with_cache(store_path, Box::<MemoCache>::default())
    }

    pub fn with_cache(store_path: &Path, cache: Box<dyn QueryCache>) -> Self {
        Self {
            store_path: store_path.to_path_buf(),
            cache,
            round_trips: 0,
            last_error: None,
        }
    }

    /// Run a statement with bound text parameters, returning all rows.
    /// Identical (sql, params) pairs are served from the cache without
    /// touching the store.
    pub fn execute(&mut self, sql: &str, params: &[&str]) -> QueryResult {
        self.last_error = None;
        let key = cache_key(sql, params);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        match self.run(sql, params) {
            Ok(result) => {
                self.cache.put(key, result.clone());
                result
            }
            Err(e) => {
                self.last_error = Some(format!("Query failed: {e}"));
                QueryResult::default()
            }
        }
    }

    fn run(&mut self, sql: &str, params: &[&str]) -> Result<QueryResult> {
        self.round_trips += 1;
        let conn = Connection::open_with_flags(
            &self.store_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut result = QueryResult {
            columns,
            rows: Vec::new(),
        };
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(result.columns.len());
            for i in 0..result.columns.len() {
                cells.push(match row.get_ref(i)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(i) => Value::Integer(i),
                    ValueRef::Real(f) => Value::Real(f),
                    ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
                    ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
                });
            }
            result.rows.push(cells);
        }
        Ok(result)
    }

    /// Message from the most recent failed execution, if any. Reading it
    /// clears it.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Number of statements actually sent to the store (cache misses).
    pub fn store_round_trips(&self) -> u64 {
        self.round_trips
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

fn cache_key(sql: &str, params: &[&str]) -> String {
    let mut key = String::with_capacity(sql.len() + 16);
    key.push_str(sql);
    for p in params {
        key.push('\u{1f}');
        key.push_str(p);
    }
    key
}
