//! The shared summary output table written by the simulator.
//!
//! # Table design
//!
//! ```text
//! FVS_Summary(StandID TEXT, Year INTEGER, Age REAL, Tpa REAL, ... BdFt REAL)
//! ```
//!
//! One row per (stand, simulated year). Each simulator run appends its
//! stand's rows; the table is recreated empty at the start of a batch.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use rusqlite::{params_from_iter, types::Value as SqlValue, Connection};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::metrics::MetricField;

pub const SUMMARY_TABLE: &str = "FVS_Summary";

/// Metric values for one stand, keyed by metric code.
pub type MetricRow = Map<String, Value>;

/// Inclusive range of simulated years found in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct YearRange {
    pub first: i64,
    pub last: i64,
}

pub struct OutputTable {
    conn: Connection,
}

impl OutputTable {
    /// Open or create the database at `path`. The table is not touched.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                crate::io::ensure_dir(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Drop and recreate the summary table.
    pub fn reset(&self) -> Result<()> {
        let metric_columns: Vec<String> = MetricField::all()
            .iter()
            .map(|f| format!("{} REAL", f.code()))
            .collect();
        let sql = format!(
            "DROP TABLE IF EXISTS {SUMMARY_TABLE};
             CREATE TABLE {SUMMARY_TABLE} (StandID TEXT NOT NULL, Year INTEGER NOT NULL, {});",
            metric_columns.join(", ")
        );
        self.conn.execute_batch(&sql)?;
        tracing::debug!(table = SUMMARY_TABLE, "reset output table");
        Ok(())
    }

    /// Append one summary row. Metrics not listed are stored as NULL.
    pub fn insert(&self, stand_id: &str, year: i64, metrics: &[(MetricField, f64)]) -> Result<()> {
        let mut columns = vec!["StandID".to_string(), "Year".to_string()];
        let mut values = vec![SqlValue::Text(stand_id.to_string()), SqlValue::Integer(year)];
        for (field, value) in metrics {
            columns.push(field.code().to_string());
            values.push(SqlValue::Real(*value));
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {SUMMARY_TABLE} ({}) VALUES ({placeholders})",
            columns.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// Every distinct `Year` present.
    pub fn years(&self) -> Result<BTreeSet<i64>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT DISTINCT Year FROM {SUMMARY_TABLE}"))?;
        let years = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(years)
    }

    /// `None` when the table has no rows.
    pub fn year_range(&self) -> Result<Option<YearRange>> {
        let years = self.years()?;
        Ok(match (years.first(), years.last()) {
            (Some(&first), Some(&last)) => Some(YearRange { first, last }),
            _ => None,
        })
    }

    /// Each stand's earliest row, read in explicit `(StandID, Year)` order.
    pub fn first_year_rows(&self, fields: &[MetricField]) -> Result<HashMap<String, MetricRow>> {
        let sql = format!(
            "SELECT StandID, {} FROM {SUMMARY_TABLE} ORDER BY StandID, Year",
            column_list(fields)
        );
        self.collect_first(&sql, &[], fields)
    }

    /// Rows where `Year == year`, one per stand.
    pub fn rows_for_year(
        &self,
        year: i64,
        fields: &[MetricField],
    ) -> Result<HashMap<String, MetricRow>> {
        let sql = format!(
            "SELECT StandID, {} FROM {SUMMARY_TABLE} WHERE Year = ?1 ORDER BY StandID",
            column_list(fields)
        );
        self.collect_first(&sql, &[SqlValue::Integer(year)], fields)
    }

    fn collect_first(
        &self,
        sql: &str,
        params: &[SqlValue],
        fields: &[MetricField],
    ) -> Result<HashMap<String, MetricRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out: HashMap<String, MetricRow> = HashMap::new();
        while let Some(row) = rows.next()? {
            let stand: String = row.get(0)?;
            if out.contains_key(&stand) {
                continue;
            }
            let mut metrics = Map::new();
            for (i, field) in fields.iter().enumerate() {
                let value: SqlValue = row.get(i + 1)?;
                metrics.insert(field.code().to_string(), to_json(value));
            }
            out.insert(stand, metrics);
        }
        Ok(out)
    }
}

fn column_list(fields: &[MetricField]) -> String {
    if fields.is_empty() {
        return "Year".to_string();
    }
    fields
        .iter()
        .map(|f| f.code())
        .collect::<Vec<_>>()
        .join(", ")
}

fn to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(_) => Value::Null,
    }
}
