//! Catalog records - sensors, segments and crosstalk results
//!
//! A sensor owns its segments (one per amplifier). A result couples two
//! segments in fixed roles:
//! - `aggressor`: the amplifier whose signal leaks into another channel
//! - `victim`: the amplifier receiving the coupled signal

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Methodology used to derive a crosstalk coefficient.
///
/// Tags are case-insensitive and ignore surrounding whitespace: every
/// constructor folds them to trimmed ASCII upper case, and equality compares
/// the folded form. Tags this crate does not know about are kept in `Other`
/// so that stores written by newer tooling stay readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Method {
    /// Least-squares fit of the aggressor stamp model
    ModelLsq,
    /// Any other tag
    Other(String),
}

/// Folded form of a methodology tag
pub(crate) fn canonical_tag(tag: &str) -> String {
    tag.trim().to_ascii_uppercase()
}

impl Method {
    /// Get the stored tag of the method
    pub fn as_str(&self) -> &str {
        match self {
            Method::ModelLsq => "MODEL_LSQ",
            Method::Other(tag) => tag,
        }
    }

    /// Folded tag, as written to and compared in the store
    pub fn canonical(&self) -> String {
        canonical_tag(self.as_str())
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Method {}

impl std::hash::Hash for Method {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::Usage("method tag must not be empty".to_string()));
        }
        Ok(Method::from(s.to_string()))
    }
}

impl From<String> for Method {
    fn from(tag: String) -> Self {
        let tag = canonical_tag(&tag);
        if tag == "MODEL_LSQ" {
            Method::ModelLsq
        } else {
            Method::Other(tag)
        }
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A CCD sensor together with its segments, keyed by amplifier number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub id: i64,
    /// Informal name (e.g. "Davis")
    pub name: String,
    /// Manufacturer-assigned designation
    pub designation: String,
    pub manufacturer: String,
    pub num_amplifiers: u32,
    /// Every segment owned by this sensor
    pub segments: BTreeMap<u32, Segment>,
}

impl Sensor {
    /// Segment read out by the given amplifier
    pub fn segment(&self, amplifier: u32) -> Option<&Segment> {
        self.segments.get(&amplifier)
    }

    /// Segment by its label (e.g. "C14")
    pub fn segment_named(&self, name: &str) -> Option<&Segment> {
        self.segments.values().find(|s| s.name == name)
    }
}

/// One amplifier region of a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: i64,
    /// Amplifier-region label (e.g. "C14")
    pub name: String,
    /// Amplifier number, unique within the owning sensor
    pub amplifier_number: u32,
    pub sensor_id: i64,
}

/// A segment with the results it takes part in, split by role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentDetail {
    pub segment: Segment,
    /// Results where this segment is the aggressor, ordered by id
    pub results_as_aggressor: Vec<CrosstalkResult>,
    /// Results where this segment is the victim, ordered by id
    pub results_as_victim: Vec<CrosstalkResult>,
}

/// A single crosstalk measurement between two segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosstalkResult {
    pub id: i64,
    pub aggressor_id: i64,
    /// Aggressor signal level, in raw sensor units
    pub aggressor_signal: f64,
    /// Fraction of the aggressor signal seen by the victim (may be negative)
    pub coefficient: f64,
    /// Standard error of the coefficient, when the method reports one
    pub error: Option<f64>,
    pub method: Method,
    pub victim_id: i64,
}

/// Natural key of a sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorKey {
    Name(String),
    Designation(String),
}

impl SensorKey {
    /// Build a key from a name/designation pair where exactly one is set
    pub fn from_options(name: Option<&str>, designation: Option<&str>) -> Result<Self> {
        match (name, designation) {
            (Some(name), None) => Ok(SensorKey::Name(name.to_string())),
            (None, Some(designation)) => Ok(SensorKey::Designation(designation.to_string())),
            (Some(_), Some(_)) => Err(Error::Usage(
                "supply either a sensor name or a designation, not both".to_string(),
            )),
            (None, None) => Err(Error::Usage(
                "a sensor name or a designation is required".to_string(),
            )),
        }
    }

    /// Column the key is matched against
    pub(crate) fn column(&self) -> &'static str {
        match self {
            SensorKey::Name(_) => "name",
            SensorKey::Designation(_) => "designation",
        }
    }

    pub(crate) fn value(&self) -> &str {
        match self {
            SensorKey::Name(v) | SensorKey::Designation(v) => v,
        }
    }
}

impl std::fmt::Display for SensorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKey::Name(name) => write!(f, "sensor named {:?}", name),
            SensorKey::Designation(d) => write!(f, "sensor designated {:?}", d),
        }
    }
}

/// Key of a segment within its sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKey {
    Name(String),
    Amplifier(u32),
}

impl SegmentKey {
    /// Build a key from a segment-name/amplifier pair where exactly one is set
    pub fn from_options(segment_name: Option<&str>, amplifier: Option<u32>) -> Result<Self> {
        match (segment_name, amplifier) {
            (Some(name), None) => Ok(SegmentKey::Name(name.to_string())),
            (None, Some(amp)) => Ok(SegmentKey::Amplifier(amp)),
            (Some(_), Some(_)) => Err(Error::Usage(
                "supply either a segment name or an amplifier number, not both".to_string(),
            )),
            (None, None) => Err(Error::Usage(
                "a segment name or an amplifier number is required".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentKey::Name(name) => write!(f, "segment {:?}", name),
            SegmentKey::Amplifier(amp) => write!(f, "amplifier {}", amp),
        }
    }
}

/// Sensor row for insertion (id is set by the store)
#[derive(Debug, Clone)]
pub struct NewSensor {
    pub name: String,
    pub designation: String,
    pub manufacturer: String,
    pub num_amplifiers: u32,
}

impl NewSensor {
    pub fn new(
        name: impl Into<String>,
        designation: impl Into<String>,
        manufacturer: impl Into<String>,
        num_amplifiers: u32,
    ) -> Self {
        Self {
            name: name.into(),
            designation: designation.into(),
            manufacturer: manufacturer.into(),
            num_amplifiers,
        }
    }
}

/// Segment row for insertion
#[derive(Debug, Clone)]
pub struct NewSegment {
    pub name: String,
    pub amplifier_number: u32,
    pub sensor_id: i64,
}

impl NewSegment {
    pub fn new(name: impl Into<String>, amplifier_number: u32, sensor_id: i64) -> Self {
        Self {
            name: name.into(),
            amplifier_number,
            sensor_id,
        }
    }
}

/// Result row for insertion
#[derive(Debug, Clone)]
pub struct NewResult {
    pub aggressor_id: i64,
    pub aggressor_signal: f64,
    pub coefficient: f64,
    pub error: Option<f64>,
    pub method: Method,
    pub victim_id: i64,
}

impl NewResult {
    /// Create a result without a reported error
    pub fn new(
        aggressor_id: i64,
        victim_id: i64,
        aggressor_signal: f64,
        coefficient: f64,
        method: Method,
    ) -> Self {
        Self {
            aggressor_id,
            aggressor_signal,
            coefficient,
            error: None,
            method,
            victim_id,
        }
    }

    pub fn with_error(mut self, error: f64) -> Self {
        self.error = Some(error);
        self
    }
}
