//! Fixed profile facts that take precedence over retrieved chunks.

use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Key holding the birth date (`YYYY-MM-DD`).
pub const BIRTH_DATE_KEY: &str = "fecha_nacimiento";
/// Derived key holding the age computed at load time.
pub const AGE_KEY: &str = "edad";
/// Key holding the contact address used in the fallback answer.
pub const EMAIL_KEY: &str = "email";

const HEADER: &str = "INFORMACIÓN FIJA DEL CV:";

/// Ordered key/value profile loaded once per process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileMetadata {
    fields: Map<String, Value>,
}

impl ProfileMetadata {
    /// Reads the JSON document at `path` and derives the age as of `today`.
    pub fn load(path: &Path, today: NaiveDate) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            Error::Metadata(format!("failed to read {}: {err}", path.display()))
        })?;
        let profile = Self::from_json_str(&raw, today)?;
        tracing::info!(
            "loaded {} profile fields from {}",
            profile.fields.len(),
            path.display()
        );
        Ok(profile)
    }

    /// Parses a JSON object and derives the age as of `today`.
    pub fn from_json_str(raw: &str, today: NaiveDate) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| Error::Metadata(format!("invalid profile JSON: {err}")))?;
        let Value::Object(mut fields) = value else {
            return Err(Error::Metadata(
                "profile must be a JSON object".to_string(),
            ));
        };

        if let Some(birth) = fields.get(BIRTH_DATE_KEY) {
            let birth = birth
                .as_str()
                .ok_or_else(|| Error::Metadata(format!("{BIRTH_DATE_KEY} must be a string")))?;
            let birth = NaiveDate::parse_from_str(birth, "%Y-%m-%d").map_err(|err| {
                Error::Metadata(format!("{BIRTH_DATE_KEY} '{birth}' is not YYYY-MM-DD: {err}"))
            })?;
            fields.insert(AGE_KEY.to_string(), Value::from(age(birth, today)));
        }
        Ok(Self { fields })
    }

    /// Raw field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Contact email, when the profile has one.
    pub fn email(&self) -> Option<&str> {
        self.fields
            .get(EMAIL_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// Bullet-list rendering in document order.
    pub fn to_text(&self) -> String {
        let mut lines = vec![HEADER.to_string()];
        for (key, value) in &self.fields {
            lines.push(format!("- {}: {}", humanize_key(key), render_value(value)));
        }
        lines.join("\n")
    }
}

/// Whole years between `birth` and `today`.
pub fn age(birth: NaiveDate, today: NaiveDate) -> i32 {
    let before_birthday = (today.month(), today.day()) < (birth.month(), birth.day());
    today.year() - birth.year() - i32::from(before_birthday)
}

fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
