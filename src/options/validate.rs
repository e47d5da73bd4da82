//! Constructor argument validation
//!
//! Untyped arguments (from a config file or the command line) are checked
//! here before any socket exists. Typed [`ConnectionOptions`] go through the
//! same range checks.

use super::{ConnectionOptions, Protocols};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Option names accepted in untyped input
pub const OPTION_NAMES: [&str; 5] = [
    "connectTimeout",
    "reconnect",
    "reconnectAttempts",
    "reconnectDelay",
    "reconnectDelayExponent",
];

/// Constructor argument errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No url was given
    #[error("you must provide a url")]
    MissingArgument,
    /// A value has the wrong type
    #[error("`{name}` has an invalid type: it should be a `{expected}`")]
    InvalidType { name: String, expected: &'static str },
    /// An option name is not recognized
    #[error("the options contain the unknown property `{0}`; have you misspelled something?")]
    UnknownOption(String),
    /// A number the state machine cannot work with
    #[error("`{name}` is out of range: it should be {expected}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
    },
}

impl ValidationError {
    fn invalid_type(name: impl Into<String>, expected: &'static str) -> Self {
        ValidationError::InvalidType {
            name: name.into(),
            expected,
        }
    }
}

/// Arguments that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgs {
    pub url: String,
    pub protocols: Protocols,
    pub options: ConnectionOptions,
}

/// Validate untyped constructor arguments
///
/// `protocols` and `options` may be omitted. Options shallow-override
/// [`ConnectionOptions::default`].
pub fn validate_options(
    url: &Value,
    protocols: Option<&Value>,
    options: Option<&Value>,
) -> Result<ValidatedArgs, ValidationError> {
    if is_falsy(url) {
        return Err(ValidationError::MissingArgument);
    }
    let url = url
        .as_str()
        .ok_or_else(|| ValidationError::invalid_type("url", "string"))?
        .to_string();

    let protocols = match protocols {
        Some(value) if !is_falsy(value) => parse_protocols(value)?,
        _ => Protocols::none(),
    };

    let options = match options {
        None | Some(Value::Null) => ConnectionOptions::default(),
        Some(Value::Object(map)) => parse_options(map)?,
        Some(_) => return Err(ValidationError::invalid_type("options", "object")),
    };

    Ok(ValidatedArgs {
        url,
        protocols,
        options,
    })
}

/// Reject an empty url
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::MissingArgument);
    }
    Ok(())
}

impl ConnectionOptions {
    /// Check that every value is usable by the reconnection state machine
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.connect_timeout.is_zero() {
            return Err(ValidationError::OutOfRange {
                name: "connectTimeout",
                expected: "a positive number of milliseconds",
            });
        }
        if self.reconnect_delay.is_zero() {
            return Err(ValidationError::OutOfRange {
                name: "reconnectDelay",
                expected: "a positive number of milliseconds",
            });
        }
        if !self.reconnect_delay_exponent.is_finite() {
            return Err(ValidationError::OutOfRange {
                name: "reconnectDelayExponent",
                expected: "a finite number",
            });
        }
        Ok(())
    }
}

// Mirrors the usual notion of a missing argument: null, false, 0 and "".
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn parse_protocols(value: &Value) -> Result<Protocols, ValidationError> {
    match value {
        Value::String(protocol) => Ok(Protocols::from(protocol.as_str())),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::invalid_type(format!("protocols[{index}]"), "string"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Protocols::from),
        _ => Err(ValidationError::invalid_type("protocols", "string")),
    }
}

#[derive(Clone, Copy)]
enum Primitive {
    Number,
    Boolean,
}

impl Primitive {
    fn of(name: &str) -> Primitive {
        match name {
            "reconnect" => Primitive::Boolean,
            _ => Primitive::Number,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Primitive::Number => value.is_number(),
            Primitive::Boolean => value.is_boolean(),
        }
    }
}

fn parse_options(map: &Map<String, Value>) -> Result<ConnectionOptions, ValidationError> {
    if let Some(unknown) = map.keys().find(|key| !OPTION_NAMES.contains(&key.as_str())) {
        return Err(ValidationError::UnknownOption(unknown.clone()));
    }

    for (key, value) in map {
        let primitive = Primitive::of(key);
        if !primitive.matches(value) {
            return Err(ValidationError::invalid_type(key.as_str(), primitive.name()));
        }
    }

    let mut options = ConnectionOptions::default();
    for (key, value) in map {
        match key.as_str() {
            "connectTimeout" => {
                options.connect_timeout = millis(value, "connectTimeout")?;
            }
            "reconnect" => {
                options.reconnect = value.as_bool().unwrap_or(options.reconnect);
            }
            "reconnectAttempts" => {
                options.reconnect_attempts = Some(attempts(value)?);
            }
            "reconnectDelay" => {
                options.reconnect_delay = millis(value, "reconnectDelay")?;
            }
            "reconnectDelayExponent" => {
                options.reconnect_delay_exponent =
                    value.as_f64().unwrap_or(options.reconnect_delay_exponent);
            }
            _ => {}
        }
    }

    options.validate()?;
    Ok(options)
}

fn millis(value: &Value, name: &'static str) -> Result<Duration, ValidationError> {
    value
        .as_f64()
        .filter(|ms| *ms > 0.0)
        .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
        .ok_or(ValidationError::OutOfRange {
            name,
            expected: "a positive number of milliseconds",
        })
}

// Fractional budgets round up: 2.5 still allows a third attempt.
fn attempts(value: &Value) -> Result<u32, ValidationError> {
    if let Some(n) = value.as_u64() {
        return Ok(u32::try_from(n).unwrap_or(u32::MAX));
    }
    match value.as_f64() {
        Some(n) if n >= 0.0 => Ok(n.ceil().min(u32::MAX as f64) as u32),
        _ => Err(ValidationError::OutOfRange {
            name: "reconnectAttempts",
            expected: "a non-negative number",
        }),
    }
}
