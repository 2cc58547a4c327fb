// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sensor state normalization.
//!
//! Each known sensor kind has one [`Normalizable`] implementation that
//! turns the gateway's `state` object into InfluxDB fields. Every kind gets
//! the same tag set: `id`, `name` and `type`.

use deflux_deconz::SensorEvent;
use deflux_influx::{FieldValue, Fields, Tags};
use serde_json::Value;
use thiserror::Error;

/// Pair of InfluxDB tag set and field set extracted from a sensor event.
pub type TagsAndFields = (Tags, Fields);

/// Normalization errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("no mapping for sensor type '{0}'")]
    UnknownSensorType(String),

    #[error("{kind} state has no '{field}'")]
    MissingField { kind: String, field: String },

    #[error("{kind} state field '{field}' has unexpected value {value}")]
    InvalidField {
        kind: String,
        field: String,
        value: String,
    },
}

/// Field extraction for one sensor kind.
pub trait Normalizable: Sync {
    /// Type tag this implementation handles.
    fn kind(&self) -> &'static str;

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError>;
}

/// Typed access to a sensor `state` object.
///
/// Required accessors fail with [`NormalizeError::MissingField`] when the
/// key is absent or null; optional ones return `None`. A present value of
/// the wrong JSON type is always [`NormalizeError::InvalidField`].
pub struct State<'a> {
    kind: &'a str,
    state: &'a Value,
}

impl<'a> State<'a> {
    pub fn new(kind: &'a str, state: &'a Value) -> Self {
        Self { kind, state }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.state.get(field).filter(|v| !v.is_null())
    }

    fn missing(&self, field: &str) -> NormalizeError {
        NormalizeError::MissingField {
            kind: self.kind.to_string(),
            field: field.to_string(),
        }
    }

    fn invalid(&self, field: &str, value: &Value) -> NormalizeError {
        NormalizeError::InvalidField {
            kind: self.kind.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn opt_int(&self, field: &str) -> Result<Option<i64>, NormalizeError> {
        self.get(field)
            .map(|v| v.as_i64().ok_or_else(|| self.invalid(field, v)))
            .transpose()
    }

    pub fn opt_float(&self, field: &str) -> Result<Option<f64>, NormalizeError> {
        self.get(field)
            .map(|v| v.as_f64().ok_or_else(|| self.invalid(field, v)))
            .transpose()
    }

    pub fn opt_bool(&self, field: &str) -> Result<Option<bool>, NormalizeError> {
        self.get(field)
            .map(|v| v.as_bool().ok_or_else(|| self.invalid(field, v)))
            .transpose()
    }

    pub fn int(&self, field: &str) -> Result<i64, NormalizeError> {
        self.opt_int(field)?.ok_or_else(|| self.missing(field))
    }

    pub fn float(&self, field: &str) -> Result<f64, NormalizeError> {
        self.opt_float(field)?.ok_or_else(|| self.missing(field))
    }

    pub fn bool(&self, field: &str) -> Result<bool, NormalizeError> {
        self.opt_bool(field)?.ok_or_else(|| self.missing(field))
    }
}

fn single(field: &str, value: impl Into<FieldValue>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(field.to_string(), value.into());
    fields
}

fn insert_opt(fields: &mut Fields, field: &str, value: Option<impl Into<FieldValue>>) {
    if let Some(value) = value {
        fields.insert(field.to_string(), value.into());
    }
}

/// Centi-degrees Celsius.
pub struct Temperature;

impl Normalizable for Temperature {
    fn kind(&self) -> &'static str {
        "temperature"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        Ok(single("temperature", state.float("temperature")? / 100.0))
    }
}

/// Centi-percent relative humidity.
pub struct Humidity;

impl Normalizable for Humidity {
    fn kind(&self) -> &'static str {
        "humidity"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        Ok(single("humidity", state.float("humidity")? / 100.0))
    }
}

/// Air pressure in hPa.
pub struct Pressure;

impl Normalizable for Pressure {
    fn kind(&self) -> &'static str {
        "pressure"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        Ok(single("pressure", state.int("pressure")?))
    }
}

pub struct LightLevel;

impl Normalizable for LightLevel {
    fn kind(&self) -> &'static str {
        "lightlevel"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        let mut fields = single("lightlevel", state.int("lightlevel")?);
        insert_opt(&mut fields, "lux", state.opt_int("lux")?);
        insert_opt(&mut fields, "dark", state.opt_bool("dark")?);
        insert_opt(&mut fields, "daylight", state.opt_bool("daylight")?);
        Ok(fields)
    }
}

pub struct Presence;

impl Normalizable for Presence {
    fn kind(&self) -> &'static str {
        "presence"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        Ok(single("presence", state.bool("presence")?))
    }
}

/// Door and window contacts.
pub struct OpenClose;

impl Normalizable for OpenClose {
    fn kind(&self) -> &'static str {
        "openclose"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        Ok(single("open", state.bool("open")?))
    }
}

/// Buttons and remotes.
pub struct Switch;

impl Normalizable for Switch {
    fn kind(&self) -> &'static str {
        "switch"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        Ok(single("buttonevent", state.int("buttonevent")?))
    }
}

pub struct Water;

impl Normalizable for Water {
    fn kind(&self) -> &'static str {
        "water"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        Ok(single("water", state.bool("water")?))
    }
}

pub struct Fire;

impl Normalizable for Fire {
    fn kind(&self) -> &'static str {
        "fire"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        Ok(single("fire", state.bool("fire")?))
    }
}

/// The gateway's virtual daylight sensor.
pub struct Daylight;

impl Normalizable for Daylight {
    fn kind(&self) -> &'static str {
        "daylight"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        let mut fields = single("daylight", state.bool("daylight")?);
        insert_opt(&mut fields, "status", state.opt_int("status")?);
        Ok(fields)
    }
}

/// Energy meters, consumption in Wh.
pub struct Consumption;

impl Normalizable for Consumption {
    fn kind(&self) -> &'static str {
        "consumption"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        let mut fields = single("consumption", state.int("consumption")?);
        insert_opt(&mut fields, "power", state.opt_int("power")?);
        Ok(fields)
    }
}

pub struct Power;

impl Normalizable for Power {
    fn kind(&self) -> &'static str {
        "power"
    }

    fn fields(&self, state: &State<'_>) -> Result<Fields, NormalizeError> {
        let mut fields = single("power", state.int("power")?);
        insert_opt(&mut fields, "voltage", state.opt_int("voltage")?);
        insert_opt(&mut fields, "current", state.opt_int("current")?);
        Ok(fields)
    }
}

static NORMALIZERS: &[&dyn Normalizable] = &[
    &Temperature,
    &Humidity,
    &Pressure,
    &LightLevel,
    &Presence,
    &OpenClose,
    &Switch,
    &Water,
    &Fire,
    &Daylight,
    &Consumption,
    &Power,
];

/// Normalizer registered for `kind`.
pub fn normalizer_for(kind: &str) -> Option<&'static dyn Normalizable> {
    NORMALIZERS.iter().copied().find(|n| n.kind() == kind)
}

/// Every supported type tag.
pub fn supported_kinds() -> impl Iterator<Item = &'static str> {
    NORMALIZERS.iter().map(|n| n.kind())
}

/// Tags and fields for one sensor event.
///
/// Fails with [`NormalizeError::UnknownSensorType`] when no normalizer is
/// registered for the event's kind, [`NormalizeError::MissingField`] when
/// the state lacks a required key and [`NormalizeError::InvalidField`] when
/// a value has the wrong type.
pub fn to_point(event: &SensorEvent) -> Result<TagsAndFields, NormalizeError> {
    let normalizer = normalizer_for(&event.kind)
        .ok_or_else(|| NormalizeError::UnknownSensorType(event.kind.clone()))?;

    let fields = normalizer.fields(&State::new(&event.kind, &event.state))?;

    let mut tags = Tags::new();
    tags.insert("id".to_string(), event.id.clone());
    tags.insert("name".to_string(), event.name.clone());
    tags.insert("type".to_string(), event.kind.clone());

    Ok((tags, fields))
}
