//! Data point domain model.
//!
//! # Responsibility
//! - Define the canonical sensor reading record stored under its ID.
//! - Validate record IDs and temperature readings before persistence.
//! - Produce the canonical alert message and canonical serialized bytes.
//!
//! # Invariants
//! - `temperature` lies in `[MIN_TEMPERATURE, MAX_TEMPERATURE]` on every
//!   record produced by core write paths.
//! - Canonical bytes are compact JSON with keys sorted bytewise, so equal
//!   field values always encode to equal bytes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Record type tag stored in `docType`.
pub const DATA_POINT_DOC_TYPE: &str = "dataPoint";
/// Lowest accepted temperature reading in degrees Celsius.
pub const MIN_TEMPERATURE: f64 = -50.0;
/// Highest accepted temperature reading in degrees Celsius.
pub const MAX_TEMPERATURE: f64 = 150.0;
/// Default alert threshold in degrees Celsius.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 20.0;

/// 2^53; above this not every integer is representable as `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

const FIELD_DOC_TYPE: &str = "docType";
const FIELD_ID: &str = "ID";
const FIELD_TEMPERATURE: &str = "Temperature";
const FIELD_ALERT: &str = "Alert";
const FIELD_OWNER: &str = "Owner";

/// Canonical sensor reading record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Always `DATA_POINT_DOC_TYPE` for records written by core.
    #[serde(rename = "docType")]
    pub doc_type: String,
    /// Backend key. Immutable after creation.
    #[serde(rename = "ID")]
    pub id: String,
    /// Degrees Celsius.
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    /// Empty until a threshold breach is observed.
    #[serde(rename = "Alert", default)]
    pub alert: String,
    /// Organization that currently owns the record.
    #[serde(rename = "Owner")]
    pub owner: String,
}

impl DataPoint {
    /// Creates a record with an explicit alert value.
    ///
    /// Does not validate; callers run `validate_id`/`validate_temperature`
    /// first.
    pub fn new(
        id: impl Into<String>,
        temperature: f64,
        alert: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: DATA_POINT_DOC_TYPE.to_string(),
            id: id.into(),
            temperature,
            alert: alert.into(),
            owner: owner.into(),
        }
    }

    /// Returns whether an alert has been recorded.
    pub fn has_alert(&self) -> bool {
        !self.alert.is_empty()
    }

    /// Builds the sorted-key JSON object used for canonical encoding.
    pub fn canonical_value(&self) -> Value {
        let mut fields: BTreeMap<&str, Value> = BTreeMap::new();
        fields.insert(FIELD_DOC_TYPE, Value::from(self.doc_type.as_str()));
        fields.insert(FIELD_ID, Value::from(self.id.as_str()));
        fields.insert(FIELD_TEMPERATURE, temperature_value(self.temperature));
        fields.insert(FIELD_ALERT, Value::from(self.alert.as_str()));
        fields.insert(FIELD_OWNER, Value::from(self.owner.as_str()));

        let object: Map<String, Value> = fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        Value::Object(object)
    }

    /// Encodes this record into canonical bytes for backend storage.
    ///
    /// Whole-number temperatures are written as JSON integers (`25`, not
    /// `25.0`), so records written by integer-emitting clients keep their
    /// bytes when rewritten here.
    ///
    /// # Errors
    /// - Returns `CodecError::Encode` when JSON serialization fails.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(&self.canonical_value()).map_err(CodecError::Encode)
    }

    /// Decodes a record from stored bytes.
    ///
    /// # Errors
    /// - `CodecError::Malformed` when bytes are not a JSON data point.
    /// - `CodecError::UnexpectedDocType` when `docType` is not `dataPoint`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let record: Self = serde_json::from_slice(bytes).map_err(CodecError::Malformed)?;
        if record.doc_type != DATA_POINT_DOC_TYPE {
            return Err(CodecError::UnexpectedDocType(record.doc_type));
        }
        Ok(record)
    }
}

/// JSON number for a temperature; integral values within `i64` range encode
/// without a fractional part.
fn temperature_value(temperature: f64) -> Value {
    if temperature.fract() == 0.0 && temperature.abs() < MAX_EXACT_INTEGER {
        Value::from(temperature as i64)
    } else {
        Value::from(temperature)
    }
}

/// Returns whether `temperature` strictly exceeds `threshold`.
pub fn exceeds_threshold(temperature: f64, threshold: f64) -> bool {
    temperature > threshold
}

/// Formats the canonical alert message.
///
/// Stored alerts are compared against this output, so every alert write
/// must go through here. Uses shortest round-trip `f64` formatting
/// (`25.0` renders as `25`).
pub fn alert_message(id: &str, temperature: f64, threshold: f64) -> String {
    format!(
        "Temperature alert! Data point {id} has a temperature of {temperature}°C, exceeding the threshold of {threshold}°C."
    )
}

/// Returns the alert value a fresh record should carry.
pub fn initial_alert(id: &str, temperature: f64, threshold: f64) -> String {
    if exceeds_threshold(temperature, threshold) {
        alert_message(id, temperature, threshold)
    } else {
        String::new()
    }
}

/// Rejects empty record IDs.
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    Ok(())
}

/// Rejects non-finite or out-of-range temperature readings.
pub fn validate_temperature(temperature: f64) -> Result<(), ValidationError> {
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(ValidationError::TemperatureOutOfRange(temperature));
    }
    Ok(())
}

/// Argument validation errors for data point inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyId,
    TemperatureOutOfRange(f64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "data point id must be a non-empty string"),
            Self::TemperatureOutOfRange(value) => write!(
                f,
                "temperature must be a number between {MIN_TEMPERATURE} and {MAX_TEMPERATURE}, got {value}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Encoding/decoding failures for stored record bytes.
#[derive(Debug)]
pub enum CodecError {
    Encode(serde_json::Error),
    Malformed(serde_json::Error),
    NotUtf8(std::string::FromUtf8Error),
    UnexpectedDocType(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode data point: {err}"),
            Self::Malformed(err) => write!(f, "malformed data point: {err}"),
            Self::NotUtf8(err) => write!(f, "stored data point is not utf-8: {err}"),
            Self::UnexpectedDocType(value) => {
                write!(f, "unexpected docType `{value}`, expected `{DATA_POINT_DOC_TYPE}`")
            }
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Malformed(err) => Some(err),
            Self::NotUtf8(err) => Some(err),
            Self::UnexpectedDocType(_) => None,
        }
    }
}
