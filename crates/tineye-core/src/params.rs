//! Wire parameter encoding.
//!
//! The TinEye services take flat key/value parameters. Lists are spread into
//! indexed keys (`colors[0]`, `colors[1]`, ...) in input order, which matters
//! for engines that pair parallel lists by position (colors and weights,
//! filepaths and metadata).

use std::fmt::Display;
use std::time::Duration;

/// Ordered request parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scalar parameter. Booleans encode as `true`/`false`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Display) -> &mut Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Add a scalar parameter only when a value is present.
    pub fn insert_opt(&mut self, key: &str, value: Option<impl Display>) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Spread `values` into `name[0]`, `name[1]`, ... in order.
    ///
    /// An empty slice adds nothing.
    pub fn insert_indexed<V: Display>(&mut self, name: &str, values: &[V]) -> &mut Self {
        for (i, value) in values.iter().enumerate() {
            self.insert(indexed_key(name, i), value);
        }
        self
    }

    /// [`insert_indexed`](Self::insert_indexed) for string-like values.
    pub fn insert_indexed_str<S: AsRef<str>>(&mut self, name: &str, values: &[S]) -> &mut Self {
        for (i, value) in values.iter().enumerate() {
            self.insert(indexed_key(name, i), value.as_ref());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

/// `name[index]`, the protocol's list element key.
pub fn indexed_key(name: &str, index: usize) -> String {
    format!("{name}[{index}]")
}

/// One binary attachment of a multipart request.
#[derive(Clone, PartialEq)]
pub struct FilePart {
    /// Form field name, e.g. `image` or `images[0]`
    pub field: String,
    /// File name reported to the service
    pub file_name: String,
    pub data: Vec<u8>,
}

impl FilePart {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, data: &[u8]) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            data: data.to_vec(),
        }
    }
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("data", &format!("{} bytes", self.data.len()))
            .finish()
    }
}

/// Per-call overrides accepted by every operation.
///
/// This is the complete list; anything not named here cannot reach the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Overrides the client's default timeout for the call
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}
