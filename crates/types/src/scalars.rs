//! Extended scalar types that cross the engine wire boundary.
//!
//! The engine exchanges JSON, but several domain scalars cannot travel as
//! plain JSON numbers without losing precision. Each type here pins down one
//! wire form:
//!
//! | Type | Wire form |
//! |------|-----------|
//! | [`BigInt`] | quoted base-10 string, e.g. `"9007199254740993"` |
//! | [`Decimal`] | string, passed through untouched |
//! | [`DateTime`] | RFC 3339 string with at most 3 fractional digits |
//! | [`Bytes`] | standard base64 string |
//! | [`Json`] | string-keyed object |
//! | [`BatchResult`] | `{"count": n}` |

use std::str::FromStr;

use base64::prelude::*;
use chrono::{FixedOffset, SubsecRound, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::CodecError;

// ---------------------------------------------------------------------------
// BigInt
// ---------------------------------------------------------------------------

/// A 64-bit signed integer carried on the wire as a quoted decimal string.
///
/// `Option<BigInt>` serializes `None` as `null`, so optional columns
/// round-trip through null rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BigInt(i64);

impl BigInt {
    /// Creates a [`BigInt`] from a raw integer.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Decodes a raw wire token such as `"42"` (quotes included).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidBigInt`] if the token is not a quoted
    /// string, or if its content is not a base-10 integer within `i64` range.
    pub fn from_wire(token: &str) -> Result<Self, CodecError> {
        let unquoted: String =
            serde_json::from_str(token).map_err(|e| CodecError::InvalidBigInt {
                token: token.to_string(),
                reason: format!("unquote: {e}"),
            })?;
        unquoted.parse().map_err(|e| CodecError::InvalidBigInt {
            token: token.to_string(),
            reason: format!("{e}"),
        })
    }

    /// Encodes this value as a quoted wire token.
    pub fn to_wire(self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Encodes an optional value, producing the literal `null` when absent.
    pub fn optional_to_wire(value: Option<Self>) -> String {
        value.map_or_else(|| "null".to_string(), Self::to_wire)
    }
}

impl From<i64> for BigInt {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<BigInt> for i64 {
    fn from(value: BigInt) -> Self {
        value.0
    }
}

impl FromStr for BigInt {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl std::fmt::Display for BigInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BigInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BigInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BigIntVisitor;

        impl Visitor<'_> for BigIntVisitor {
            type Value = BigInt;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a quoted base-10 signed 64-bit integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BigInt, E> {
                v.parse()
                    .map_err(|e| E::custom(format!("BigInt: invalid token {v:?}: {e}")))
            }
        }

        deserializer.deserialize_str(BigIntVisitor)
    }
}

// ---------------------------------------------------------------------------
// Decimal
// ---------------------------------------------------------------------------

/// An arbitrary-precision decimal kept in its textual wire form.
///
/// No arithmetic or validation happens client-side; the engine owns decimal
/// semantics. Only quoted tokens are accepted on decode: an unquoted JSON
/// number would pass through `f64` first and lose digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Wraps a textual decimal value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the wire text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Decimal {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DecimalVisitor;

        impl Visitor<'_> for DecimalVisitor {
            type Value = Decimal;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a quoted decimal string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
                Ok(Decimal::new(v))
            }
        }

        deserializer.deserialize_str(DecimalVisitor)
    }
}

// ---------------------------------------------------------------------------
// DateTime
// ---------------------------------------------------------------------------

/// A millisecond-precision timestamp with an explicit UTC offset.
///
/// Encodes as `YYYY-MM-DDTHH:MM:SS[.fff]` followed by `Z` for UTC or
/// `±HH:MM` otherwise. Trailing zero fraction digits are dropped, and the
/// fraction is omitted entirely on whole seconds. Sub-millisecond precision is
/// truncated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(chrono::DateTime<FixedOffset>);

impl DateTime {
    /// Creates a [`DateTime`], truncating to millisecond precision.
    pub fn new(value: chrono::DateTime<FixedOffset>) -> Self {
        Self(value.trunc_subsecs(3))
    }

    /// Returns the underlying timestamp.
    pub fn as_datetime(self) -> chrono::DateTime<FixedOffset> {
        self.0
    }

    /// Returns the timestamp converted to UTC.
    pub fn to_utc(self) -> chrono::DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }

    /// Parses an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error if `s` is not valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        chrono::DateTime::parse_from_rfc3339(s).map(Self::new)
    }

    /// Formats this timestamp in its wire layout.
    pub fn to_wire_string(self) -> String {
        let mut out = self.0.format("%Y-%m-%dT%H:%M:%S").to_string();

        let millis = self.0.timestamp_subsec_millis().min(999);
        if millis > 0 {
            let fraction = format!("{millis:03}");
            out.push('.');
            out.push_str(fraction.trim_end_matches('0'));
        }

        if self.0.offset().local_minus_utc() == 0 {
            out.push('Z');
        } else {
            out.push_str(&self.0.format("%:z").to_string());
        }
        out
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(value: chrono::DateTime<Utc>) -> Self {
        Self::new(value.fixed_offset())
    }
}

impl From<chrono::DateTime<FixedOffset>> for DateTime {
    fn from(value: chrono::DateTime<FixedOffset>) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire_string())
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|e| de::Error::custom(format!("DateTime {raw:?}: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Bytes
// ---------------------------------------------------------------------------

/// An opaque byte sequence, carried as a standard base64 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    /// Wraps raw bytes.
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self(value.into())
    }

    /// Returns the raw bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the wrapper, returning the raw bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(raw.as_bytes())
            .map(Self)
            .map_err(|e| de::Error::custom(format!("Bytes: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Json (opaque object)
// ---------------------------------------------------------------------------

/// A string-keyed object with arbitrary values.
///
/// Callers may hold either a concrete structured type or an already-generic
/// map; [`Json::from_value`] canonicalizes both into the same wire shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json(Map<String, Value>);

impl Json {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalizes any serializable value into a string-keyed object.
    ///
    /// The value is marshalled to bytes and those bytes are parsed back as an
    /// object, so a struct and a map with the same fields yield equal results.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Canonicalize`] if the value cannot be serialized
    /// or does not serialize to a JSON object.
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Result<Self, CodecError> {
        let bytes = serde_json::to_vec(value).map_err(CodecError::Canonicalize)?;
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(CodecError::Canonicalize)
    }

    /// Writes the object as wire bytes into `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if serialization or the write fails.
    pub fn write_to<W: std::io::Write>(&self, writer: W) -> Result<(), CodecError> {
        serde_json::to_writer(writer, &self.0).map_err(CodecError::Encode)
    }

    /// Returns the object as wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(&self.0).map_err(CodecError::Encode)
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the wrapper, returning the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Json {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Raw operation results
// ---------------------------------------------------------------------------

/// Number of rows affected by a raw execute operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BatchResult {
    /// Affected row count.
    pub count: i64,
}

/// Rows returned by a raw query, in engine order.
pub type RawRows = Vec<Json>;
