//! Structured record-store loading and typed field access.
//!
//! Record stores are property lists. Every field read goes through [`Fields`],
//! which returns a caller-supplied default whenever a key is absent or holds a
//! value of the wrong type, so both record-store shapes share one lenient
//! access path.

use std::path::Path;
use std::time::SystemTime;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use plist::{Dictionary, Value};

/// Format used whenever a timestamp is rendered into an audit string.
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Load a binary or XML property list.
pub fn load_document(path: &Path) -> Result<Value> {
    Value::from_file(path)
        .with_context(|| format!("failed to read property list {}", path.display()))
}

pub fn format_audit_timestamp(value: &DateTime<Utc>) -> String {
    value.format(AUDIT_TIMESTAMP_FORMAT).to_string()
}

pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Dictionary(_) => "dictionary",
        Value::Boolean(_) => "boolean",
        Value::Data(_) => "data",
        Value::Date(_) => "date",
        Value::Real(_) => "real",
        Value::Integer(_) => "integer",
        Value::String(_) => "string",
        Value::Uid(_) => "uid",
        _ => "unknown value",
    }
}

/// Types that can be pulled out of a property-list value.
pub trait FieldValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FieldValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_string().map(str::to_owned)
    }
}

impl FieldValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_boolean()
    }
}

impl FieldValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_signed_integer()
    }
}

impl FieldValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_data().map(<[u8]>::to_vec)
    }
}

impl FieldValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(date) => Some(DateTime::<Utc>::from(SystemTime::from(*date))),
            Value::String(text) => parse_text_date(text),
            _ => None,
        }
    }
}

fn parse_text_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, AUDIT_TIMESTAMP_FORMAT) {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc())
}

/// Lenient read-only view over one dictionary of a record store.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    dict: &'a Dictionary,
}

impl<'a> Fields<'a> {
    pub fn new(dict: &'a Dictionary) -> Self {
        Self { dict }
    }

    /// View `value` as a dictionary; any other shape is a structural error.
    pub fn of(value: &'a Value) -> Result<Self> {
        value
            .as_dictionary()
            .map(Self::new)
            .ok_or_else(|| anyhow!("expected a dictionary, found {}", kind_of(value)))
    }

    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.dict.get(key)
    }

    pub fn get_opt<T: FieldValue>(&self, key: &str) -> Option<T> {
        self.dict.get(key).and_then(T::from_value)
    }

    pub fn get_or<T: FieldValue>(&self, key: &str, default: T) -> T {
        self.get_opt(key).unwrap_or(default)
    }

    pub fn text(&self, key: &str) -> String {
        self.get_or(key, String::new())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get_or(key, false)
    }

    pub fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get_opt(key)
    }

    /// Any scalar rendered as text; containers and absent keys yield "".
    pub fn display(&self, key: &str) -> String {
        self.dict.get(key).map(display_scalar).unwrap_or_default()
    }

    /// Array value, or an empty slice when absent or not an array.
    pub fn array(&self, key: &str) -> &'a [Value] {
        self.dict
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn dictionary(&self, key: &str) -> Option<Fields<'a>> {
        self.dict
            .get(key)
            .and_then(Value::as_dictionary)
            .map(Fields::new)
    }

    /// Absent → `Ok(None)`; present but not an array → error.
    pub fn require_array(&self, key: &str) -> Result<Option<&'a [Value]>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.as_slice())),
            Some(other) => bail!("{key} should be an array, found {}", kind_of(other)),
        }
    }

    /// Absent → `Ok(None)`; present but not a dictionary → error.
    pub fn require_dictionary(&self, key: &str) -> Result<Option<&'a Dictionary>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(Value::Dictionary(dict)) => Ok(Some(dict)),
            Some(other) => bail!("{key} should be a dictionary, found {}", kind_of(other)),
        }
    }
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Integer(number) => number
            .as_signed()
            .map(|n| n.to_string())
            .or_else(|| number.as_unsigned().map(|n| n.to_string()))
            .unwrap_or_default(),
        Value::Real(number) => number.to_string(),
        Value::Boolean(true) => "True".into(),
        Value::Boolean(false) => "False".into(),
        Value::Date(_) => DateTime::<Utc>::from_value(value)
            .map(|dt| format_audit_timestamp(&dt))
            .unwrap_or_default(),
        Value::Data(bytes) => hex::encode_upper(bytes),
        _ => String::new(),
    }
}
