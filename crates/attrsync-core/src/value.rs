#![forbid(unsafe_code)]

//! Typed cell values and their attribute encoding.
//!
//! A bound cell holds an [`AttrValue`]. Each binding has a fixed
//! [`ValueKind`] that decides how the value maps onto the attribute:
//!
//! | Kind      | Attribute absent | Attribute present                 |
//! |-----------|------------------|-----------------------------------|
//! | `String`  | `Null`           | `Text(content)`                   |
//! | `Boolean` | `Bool(false)`    | `Bool(true)`, content ignored     |
//! | `Number`  | `Null`           | `Number(parse)`, or `Null` if bad |
//!
//! Going the other way, `Null` removes the attribute; a Boolean binding
//! writes an empty attribute exactly when the value is `Bool(true)`.

use serde::{Deserialize, Serialize};

/// Dynamic value held by a bound cell.
///
/// Serializes as a bare JSON scalar (`null`, `true`, `4.5`, `"text"`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness: `Null`, `false`, `0`, `NaN` and `""` are false.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Attribute content for this value, or `None` for `Null`.
    #[must_use]
    pub fn to_attribute_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// How a binding interprets its attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    String,
    Boolean,
    Number,
}

impl ValueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
        }
    }

    /// Registration-time coercion of a cell's initial value.
    ///
    /// `Null` and booleans pass through for every kind. Boolean bindings
    /// convert anything else by truthiness; Number bindings parse it, with
    /// unparsable input becoming `Null`. String bindings keep the value and
    /// stringify it on write.
    #[must_use]
    pub fn coerce(self, value: AttrValue) -> AttrValue {
        match (self, value) {
            (_, v @ (AttrValue::Null | AttrValue::Bool(_))) => v,
            (Self::String, v) => v,
            (Self::Boolean, v) => AttrValue::Bool(v.truthy()),
            (Self::Number, AttrValue::Number(n)) if n.is_nan() => AttrValue::Null,
            (Self::Number, v @ AttrValue::Number(_)) => v,
            (Self::Number, AttrValue::Text(s)) => parse_number(&s).into(),
        }
    }

    /// Interpret raw attribute state (`None` = absent) as a cell value.
    #[must_use]
    pub fn interpret(self, raw: Option<&str>) -> AttrValue {
        match self {
            Self::String => raw.into(),
            Self::Boolean => AttrValue::Bool(raw.is_some()),
            Self::Number => raw.and_then(parse_number).into(),
        }
    }

    /// Desired attribute state for `value` (`None` = absent).
    #[must_use]
    pub fn render(self, value: &AttrValue) -> Option<String> {
        match self {
            Self::Boolean => (*value == AttrValue::Bool(true)).then(String::new),
            Self::String | Self::Number => value.to_attribute_text(),
        }
    }

    /// Whether `actual` already satisfies `desired`.
    ///
    /// Boolean bindings only care about presence.
    #[must_use]
    pub fn in_sync(self, actual: Option<&str>, desired: Option<&str>) -> bool {
        match self {
            Self::Boolean => actual.is_some() == desired.is_some(),
            Self::String | Self::Number => actual == desired,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse attribute text as a number.
///
/// Accepts optional surrounding whitespace, a sign, decimal digits with an
/// optional fraction and exponent, and `Infinity`. Returns `None` for empty
/// text, `NaN` and anything with trailing garbage.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let text = raw.trim();
    match text {
        "" => None,
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ if text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')) =>
        {
            text.parse::<f64>().ok()
        }
        _ => None,
    }
}

/// Format a number the way a browser stringifies it for an attribute.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // Exponent form with an explicit sign on positive exponents.
        let text = format!("{n:e}");
        match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        }
    } else {
        n.to_string()
    }
}
