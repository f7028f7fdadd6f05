//! Decoded service responses.
//!
//! Every TinEye services endpoint answers with the same JSON envelope:
//!
//! ```text
//! {"status": "ok" | "warn" | "fail", "method": "...", "error": [...], "result": ...}
//! ```
//!
//! The envelope decodes into [`ServiceResponse`], with `result` typed per
//! operation. Result payloads are not consistent about numbers (scores come
//! back as `97.2` or `"97.2"` depending on the engine), so numeric fields
//! accept both.

use crate::error::{Result, TinEyeError};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    /// Partial success, e.g. one filepath of a batch delete was missing
    Warn,
    /// The operation was rejected
    Fail,
}

/// A decoded response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResponse<T = Value> {
    pub status: Status,
    /// Wire method that produced the response, e.g. `search`
    pub method: String,
    /// Error details; empty when `status` is `ok`
    pub error: Vec<String>,
    pub result: T,
}

impl<T> ServiceResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn is_warn(&self) -> bool {
        self.status == Status::Warn
    }

    pub fn is_fail(&self) -> bool {
        self.status == Status::Fail
    }

    /// Unwrap the result, turning `warn`/`fail` into errors.
    ///
    /// This is strict-mode handling for a single call on a lenient client.
    pub fn into_result(self) -> Result<T> {
        match self.status {
            Status::Ok => Ok(self.result),
            Status::Warn => Err(TinEyeError::Warning(self.error)),
            Status::Fail => Err(TinEyeError::Service(self.error)),
        }
    }
}

/// Envelope as it comes off the wire, before the result is typed.
#[derive(Debug, Deserialize)]
pub(crate) struct RawResponse {
    pub status: Status,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub error: Option<Vec<String>>,
    #[serde(default)]
    pub result: Value,
}

impl RawResponse {
    pub(crate) fn decode(method: &str, body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| TinEyeError::Decode {
            method: method.to_string(),
            message: e.to_string(),
        })
    }

    /// Type the result.
    ///
    /// A `warn`/`fail` response whose result does not fit `T` (often `null`
    /// or `{}`) falls back to `T::default()` so callers still get the status
    /// and errors.
    pub(crate) fn into_typed<T>(self, method: &str) -> Result<ServiceResponse<T>>
    where
        T: DeserializeOwned + Default,
    {
        let result = match serde_json::from_value::<T>(self.result) {
            Ok(result) => result,
            Err(e) if self.status != Status::Ok => {
                tracing::debug!("Ignoring {method} result of {:?} response: {e}", self.status);
                T::default()
            }
            Err(e) => {
                return Err(TinEyeError::Decode {
                    method: method.to_string(),
                    message: e.to_string(),
                })
            }
        };

        Ok(ServiceResponse {
            status: self.status,
            method: self.method,
            error: self.error.unwrap_or_default(),
            result,
        })
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Relevance score
    #[serde(deserialize_with = "lenient_f64")]
    pub score: f64,

    /// Collection filepath of the matched image
    #[serde(default)]
    pub filepath: String,

    /// Overlay image reference (match engines only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<String>,

    /// Returned metadata (multicolor searches with `return_metadata`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of comparing two images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareMatch {
    #[serde(deserialize_with = "lenient_f64")]
    pub score: f64,

    /// Percentage of the image that matched
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub match_percent: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A color as the multicolor engine reports it, depending on `color_format`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// `[r, g, b]` for `color_format=rgb`
    Rgb([u8; 3]),
    /// Six hex digits for `color_format=hex`
    Hex(String),
}

/// Output format of extracted colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    #[default]
    Rgb,
    Hex,
}

impl std::fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorFormat::Rgb => write!(f, "rgb"),
            ColorFormat::Hex => write!(f, "hex"),
        }
    }
}

/// A dominant color extracted from images or the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedColor {
    pub color: Color,

    /// Share of the analysed area covered by this color
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub weight: Option<f64>,

    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub rank: Option<f64>,

    /// Human color name, e.g. "Lemon"
    #[serde(default)]
    pub name: Option<String>,

    /// Color family, e.g. "Yellow"
    #[serde(default)]
    pub class: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How many images contain one palette color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCount {
    pub color: Color,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub class: Option<String>,

    /// Images where the color covers the whole analysed area
    #[serde(default, deserialize_with = "lenient_u64")]
    pub num_images_full_area: u64,

    /// Images where the color covers part of the area
    #[serde(default, deserialize_with = "lenient_u64")]
    pub num_images_partial_area: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn into_f64<E: de::Error>(self) -> std::result::Result<f64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a number, got {s:?}"))),
        }
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_f64()
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_f64)
        .transpose()
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    let n = NumberOrString::deserialize(deserializer)?.into_f64::<D::Error>()?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(de::Error::custom(format!("expected a count, got {n}")));
    }
    Ok(n as u64)
}
