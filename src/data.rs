//! In-memory representation of a loaded SPM data file.
//!
//! A [`DataFile`] holds the channels of one input file in file order. Each
//! [`Channel`] pairs a [`DataField`] with an optional title and an optional
//! [`MetaContainer`] of typed key/value entries.

use crate::engine::DataField;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Typed metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
}

impl MetaValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            MetaValue::Boolean(_) => "boolean",
            MetaValue::Int32(_) => "int32",
            MetaValue::Int64(_) => "int64",
            MetaValue::Double(_) => "double",
            MetaValue::String(_) => "string",
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Boolean(true) => f.write_str("True"),
            MetaValue::Boolean(false) => f.write_str("False"),
            MetaValue::Int32(v) => write!(f, "{v}"),
            MetaValue::Int64(v) => write!(f, "{v}"),
            MetaValue::Double(v) => write!(f, "{v}"),
            MetaValue::String(s) => write!(f, "\"{}\"", escape(s)),
        }
    }
}

/// Escape a string for the quoted text form.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Sorted key → value store attached to a channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaContainer {
    entries: BTreeMap<String, MetaValue>,
}

impl MetaContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// One `"<key>" <type> <value>` line per entry, in key order.
    pub fn serialize_to_text(&self) -> Vec<String> {
        self.iter()
            .map(|(key, value)| format!("\"{}\" {} {value}", escape(key), value.type_name()))
            .collect()
    }
}

/// One data channel of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: u32,
    pub title: Option<String>,
    pub field: DataField,
    pub meta: Option<MetaContainer>,
}

impl Channel {
    pub fn new(id: u32, field: DataField) -> Self {
        Self {
            id,
            title: None,
            field,
            meta: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_meta(mut self, meta: MetaContainer) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// A loaded data file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFile {
    pub source: PathBuf,
    pub channels: Vec<Channel>,
}

impl DataFile {
    pub fn new(source: impl Into<PathBuf>, channels: Vec<Channel>) -> Self {
        Self {
            source: source.into(),
            channels,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Channel ids in file order.
    pub fn channel_ids(&self) -> Vec<u32> {
        self.channels.iter().map(|c| c.id).collect()
    }

    pub fn channel(&self, id: u32) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn channel_mut(&mut self, id: u32) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id == id)
    }

    pub fn meta(&self, id: u32) -> Option<&MetaContainer> {
        self.channel(id).and_then(|c| c.meta.as_ref())
    }
}
