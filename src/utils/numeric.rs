use serde::{Deserialize, Serialize};
use std::fmt;

/// A floating point parameter that remembers the text it was written as.
///
/// Solver tolerances are usually entered as `"1.0e-3"` or `"0.0005"`; keeping
/// the written text lets a persisted configuration round-trip unchanged while
/// the solver only ever sees the parsed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FloatingNumber {
    text: String,
    value: f64,
}

impl FloatingNumber {
    pub fn new(value: f64) -> Self {
        Self {
            text: value.to_string(),
            value,
        }
    }

    /// Parses `text`, accepting anything `f64::from_str` accepts (including
    /// `inf`) after trimming surrounding whitespace.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        trimmed.parse::<f64>().ok().map(|value| Self {
            text: trimmed.to_owned(),
            value,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Replaces the value with `text` when it parses to a value `>= 0`.
    /// Returns whether it did.
    pub fn set_non_negative(&mut self, text: &str) -> bool {
        self.set_if(text, |v| v >= 0.0)
    }

    pub fn set_positive(&mut self, text: &str) -> bool {
        self.set_if(text, |v| v > 0.0)
    }

    pub fn set_value(&mut self, value: f64) {
        *self = Self::new(value);
    }

    fn set_if(&mut self, text: &str, accept: impl Fn(f64) -> bool) -> bool {
        match Self::parse(text) {
            Some(parsed) if accept(parsed.value) => {
                *self = parsed;
                true
            }
            _ => false,
        }
    }
}

impl Default for FloatingNumber {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl From<f64> for FloatingNumber {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl TryFrom<String> for FloatingNumber {
    type Error = String;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text).ok_or_else(|| format!("not a number: {text:?}"))
    }
}

impl From<FloatingNumber> for String {
    fn from(number: FloatingNumber) -> Self {
        number.text
    }
}

impl fmt::Display for FloatingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
