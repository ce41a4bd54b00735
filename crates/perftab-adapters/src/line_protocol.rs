//! InfluxDB line protocol encoding.
//!
//! `measurement,tag=v,tag=v field=1.5,field="text"`; no timestamp, so the
//! server assigns its own write time.

use crate::AdapterError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Text(String),
}

/// One measurement point. Tags and fields are kept sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Encode as one line.
    ///
    /// Empty tag values and non-finite floats cannot be expressed in line
    /// protocol and are left out; a point left without fields is an error.
    pub fn to_line(&self) -> Result<String, AdapterError> {
        let mut line = escape(&self.measurement, &[',', ' ']);

        for (k, v) in &self.tags {
            if v.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&escape(k, &[',', '=', ' ']));
            line.push('=');
            line.push_str(&escape(v, &[',', '=', ' ']));
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .filter_map(|(k, v)| {
                let value = match v {
                    FieldValue::Float(f) if f.is_finite() => format!("{f:?}"),
                    FieldValue::Float(_) => return None,
                    FieldValue::Text(s) => format!("\"{}\"", escape(s, &['"', '\\'])),
                };
                Some(format!("{}={}", escape(k, &[',', '=', ' ']), value))
            })
            .collect();

        if fields.is_empty() {
            return Err(AdapterError::EmptyPoint);
        }

        line.push(' ');
        line.push_str(&fields.join(","));
        Ok(line)
    }
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
