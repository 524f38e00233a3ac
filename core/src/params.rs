//! Request parameters.
//!
//! # Design
//! A parameter value is one of a small closed set: a plain JSON value, a
//! nested mapping, something that can turn itself into a multipart part
//! ([`Multipart`]), or an already converted [`Part`]. Normalization
//! (`Client::param_check`) turns every `Upload` into a `Part` so the
//! connection only ever has to encode plain values, maps and parts.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

/// A value that is sent as a multipart form part rather than inline.
pub trait Multipart: fmt::Debug + Send + Sync {
    fn multipart(&self) -> Part;
}

/// One file-like part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub content_type: String,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn new(data: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            filename: None,
            data: data.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// An in-memory file ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    data: Vec<u8>,
    content_type: String,
    filename: Option<String>,
}

impl FileUpload {
    pub fn new(data: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            filename: None,
        }
    }

    /// Read `path` into memory; the filename defaults to the path's last
    /// component.
    pub fn from_path(path: impl AsRef<Path>, content_type: impl Into<String>) -> io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path.file_name().map(|name| name.to_string_lossy().into_owned());
        Ok(Self {
            data,
            content_type: content_type.into(),
            filename,
        })
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

impl Multipart for FileUpload {
    fn multipart(&self) -> Part {
        Part {
            content_type: self.content_type.clone(),
            filename: self.filename.clone(),
            data: self.data.clone(),
        }
    }
}

/// A single parameter value.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Value(Value),
    Map(Params),
    Upload(Arc<dyn Multipart>),
    Part(Part),
}

impl ParamValue {
    pub fn as_map(&self) -> Option<&Params> {
        match self {
            ParamValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_part(&self) -> Option<&Part> {
        match self {
            ParamValue::Part(part) => Some(part),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ParamValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Value(a), ParamValue::Value(b)) => a == b,
            (ParamValue::Map(a), ParamValue::Map(b)) => a == b,
            (ParamValue::Upload(a), ParamValue::Upload(b)) => Arc::ptr_eq(a, b),
            (ParamValue::Part(a), ParamValue::Part(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Value> for ParamValue {
    /// JSON objects become nested [`Params`] so they normalize like any
    /// other mapping.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ParamValue::Map(map.into_iter().collect()),
            other => ParamValue::Value(other),
        }
    }
}

impl From<Params> for ParamValue {
    fn from(params: Params) -> Self {
        ParamValue::Map(params)
    }
}

impl From<Part> for ParamValue {
    fn from(part: Part) -> Self {
        ParamValue::Part(part)
    }
}

impl From<FileUpload> for ParamValue {
    fn from(upload: FileUpload) -> Self {
        ParamValue::Upload(Arc::new(upload))
    }
}

impl From<Arc<dyn Multipart>> for ParamValue {
    fn from(upload: Arc<dyn Multipart>) -> Self {
        ParamValue::Upload(upload)
    }
}

macro_rules! scalar_param {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ParamValue {
            fn from(value: $ty) -> Self {
                ParamValue::Value(Value::from(value))
            }
        })*
    };
}

scalar_param!(&str, String, bool, i32, i64, u32, u64, f64);

/// Ordered string-keyed parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any value, at any depth, is a multipart part.
    pub fn has_parts(&self) -> bool {
        self.entries.iter().any(|(_, value)| match value {
            ParamValue::Part(_) => true,
            ParamValue::Map(map) => map.has_parts(),
            _ => false,
        })
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl IntoIterator for Params {
    type Item = (String, ParamValue);
    type IntoIter = std::vec::IntoIter<(String, ParamValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key:?}: {value}")?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Value(value) => write!(f, "{value}"),
            ParamValue::Map(map) => write!(f, "{map}"),
            ParamValue::Upload(upload) => write!(f, "{upload:?}"),
            ParamValue::Part(part) => write!(
                f,
                "<part {} {} {} bytes>",
                part.filename.as_deref().unwrap_or("-"),
                part.content_type,
                part.data.len()
            ),
        }
    }
}
