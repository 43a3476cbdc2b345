//! Driver-independent rows returned by fetch operations.

use crate::error::{DbError, DbResult};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sqlx::any::AnyRow;
use sqlx::{Column, Row as _, ValueRef};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Text content; MySQL reports some metadata columns as binary strings.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

/// One result row: column names and values in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Row { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|i| self.values.get(i))
    }

    pub fn try_i64(&self, name: &str) -> DbResult<i64> {
        self.get_by_name(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| DbError::Decode(format!("column {name} is not an integer")))
    }

    pub fn try_text(&self, name: &str) -> DbResult<Option<String>> {
        match self.get_by_name(name) {
            Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_text()
                .map(Some)
                .ok_or_else(|| DbError::Decode(format!("column {name} is not text"))),
            None => Err(DbError::Decode(format!("column {name} missing from row"))),
        }
    }

    pub(crate) fn from_any(row: &AnyRow) -> DbResult<Self> {
        let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        let values = (0..columns.len())
            .map(|i| decode_value(row, i))
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Row { columns, values })
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

// The any driver only exposes typed decoding, so try the supported kinds in
// turn. Typed decodes reject NULL outright, so it is ruled out on the raw value.
fn decode_value(row: &AnyRow, index: usize) -> DbResult<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| DbError::Decode(e.to_string()))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Ok(Value::Int(v));
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Ok(Value::Float(v));
    }
    if let Ok(v) = row.try_get::<f32, _>(index) {
        return Ok(Value::Float(v as f64));
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return Ok(Value::Int(if v { 1 } else { 0 }));
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Ok(Value::Text(v));
    }
    row.try_get::<Vec<u8>, _>(index)
        .map(Value::Bytes)
        .map_err(|e| DbError::Decode(e.to_string()))
}
