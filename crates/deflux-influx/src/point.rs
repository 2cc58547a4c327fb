// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Time-series points and their InfluxDB v2 Line Protocol encoding.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Tag set of a point. Keys are unique and kept sorted.
pub type Tags = BTreeMap<String, String>;

/// Field set of a point.
pub type Fields = BTreeMap<String, FieldValue>;

/// Point construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointError {
    #[error("measurement name must not be empty")]
    EmptyMeasurement,
}

/// A value that can be stored in an InfluxDB field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// 64-bit signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
    /// Boolean value.
    Boolean(bool),
}

impl FieldValue {
    /// Format this value for InfluxDB Line Protocol.
    ///
    /// - Float: written as-is (e.g., `3.14`)
    /// - Integer: suffixed with `i` (e.g., `42i`)
    /// - String: quoted with double quotes, inner quotes escaped (e.g., `"hello"`)
    /// - Boolean: `true` or `false`
    pub fn to_line_protocol(&self) -> String {
        match self {
            FieldValue::Float(v) => format!("{}", v),
            FieldValue::Integer(v) => format!("{}i", v),
            FieldValue::String(v) => {
                let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{}\"", escaped)
            }
            FieldValue::Boolean(v) => v.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line_protocol())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

/// A single time-series record.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: Tags,
    fields: Fields,
    timestamp: DateTime<Utc>,
}

impl Point {
    /// Build a point. The measurement name must be non-empty.
    pub fn new(
        measurement: impl Into<String>,
        tags: Tags,
        fields: Fields,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, PointError> {
        let measurement = measurement.into();
        if measurement.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }
        Ok(Self {
            measurement,
            tags,
            fields,
            timestamp,
        })
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Encode the point as one Line Protocol line.
    ///
    /// Returns `None` when the point has no fields: InfluxDB rejects such
    /// lines, so they are never put on the wire.
    pub fn to_line_protocol(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }

        let mut line = escape_measurement(&self.measurement);

        // BTreeMap iteration gives the canonical (sorted) tag order.
        // Empty tag values are not allowed on the wire and are left out.
        let tags = self
            .tags
            .iter()
            .filter(|(key, value)| !key.is_empty() && !value.is_empty());
        for (key, value) in tags {
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        line.push(' ');

        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&value.to_line_protocol());
        }

        line.push(' ');
        line.push_str(&timestamp_ns(self.timestamp).to_string());

        Some(line)
    }
}

/// Nanoseconds since the Unix epoch, saturating outside the i64 range.
fn timestamp_ns(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt().unwrap_or(if ts.timestamp() < 0 {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Escape a measurement name for Line Protocol.
/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escape tag keys, tag values and field keys.
/// Commas, equals signs, and spaces must be escaped.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_field_value_formats() {
        assert_eq!(FieldValue::Float(3.15).to_line_protocol(), "3.15");
        assert_eq!(FieldValue::Integer(42).to_line_protocol(), "42i");
        assert_eq!(
            FieldValue::String("say \"hi\"".to_string()).to_line_protocol(),
            "\"say \\\"hi\\\"\""
        );
        assert_eq!(FieldValue::Boolean(true).to_line_protocol(), "true");
        assert_eq!(FieldValue::Boolean(false).to_line_protocol(), "false");
    }

    #[test]
    fn test_empty_measurement_rejected() {
        let err = Point::new("", Tags::new(), Fields::new(), at(1)).unwrap_err();
        assert_eq!(err, PointError::EmptyMeasurement);
    }

    #[test]
    fn test_line_protocol_simple_point() {
        let point = Point::new(
            "deflux_temperature",
            Tags::new(),
            fields(&[("temperature", FieldValue::Float(23.5))]),
            at(1),
        )
        .expect("point");

        assert_eq!(
            point.to_line_protocol().as_deref(),
            Some("deflux_temperature temperature=23.5 1000000000")
        );
    }

    #[test]
    fn test_line_protocol_tags_are_sorted() {
        let point = Point::new(
            "deflux_temperature",
            tags(&[("name", "kitchen"), ("id", "5"), ("type", "temperature")]),
            fields(&[("temperature", FieldValue::Float(21.0))]),
            at(2),
        )
        .expect("point");

        assert_eq!(
            point.to_line_protocol().as_deref(),
            Some("deflux_temperature,id=5,name=kitchen,type=temperature temperature=21 2000000000")
        );
    }

    #[test]
    fn test_line_protocol_multiple_fields() {
        let point = Point::new(
            "deflux_lightlevel",
            tags(&[("id", "9")]),
            fields(&[
                ("lightlevel", FieldValue::Integer(13010)),
                ("dark", FieldValue::Boolean(false)),
                ("lux", FieldValue::Integer(20)),
            ]),
            at(3),
        )
        .expect("point");

        assert_eq!(
            point.to_line_protocol().as_deref(),
            Some("deflux_lightlevel,id=9 dark=false,lightlevel=13010i,lux=20i 3000000000")
        );
    }

    #[test]
    fn test_line_protocol_escape_special_chars() {
        let point = Point::new(
            "my measurement",
            tags(&[("name", "living room,north")]),
            fields(&[("note", FieldValue::String("hello \"world\"".to_string()))]),
            at(3),
        )
        .expect("point");

        assert_eq!(
            point.to_line_protocol().as_deref(),
            Some("my\\ measurement,name=living\\ room\\,north note=\"hello \\\"world\\\"\" 3000000000")
        );
    }

    #[test]
    fn test_line_protocol_skips_empty_tag_values() {
        let point = Point::new(
            "deflux_presence",
            tags(&[("id", "4"), ("name", "")]),
            fields(&[("presence", FieldValue::Boolean(true))]),
            at(1),
        )
        .expect("point");

        assert_eq!(
            point.to_line_protocol().as_deref(),
            Some("deflux_presence,id=4 presence=true 1000000000")
        );
    }

    #[test]
    fn test_point_without_fields_not_encoded() {
        let point = Point::new("deflux_switch", tags(&[("id", "1")]), Fields::new(), at(1))
            .expect("point");
        assert!(point.to_line_protocol().is_none());
    }
}
