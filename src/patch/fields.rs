//! Typed access to the fields of one patch component.

use std::f64::consts::PI;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Result, SynthError};

/// The fields of a component object, tagged with its type for error messages.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'v> {
    component: &'v str,
    map: &'v Map<String, Value>,
}

impl<'v> Fields<'v> {
    /// Read a component object; its `"type"` becomes the component name.
    pub fn of(value: &'v Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| SynthError::InvalidField {
            component: "patch".to_string(),
            field: "type",
            reason: format!("expected a component object, got {value}"),
        })?;
        let component = match map.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => {
                return Err(SynthError::InvalidField {
                    component: "patch".to_string(),
                    field: "type",
                    reason: format!("expected a string, got {other}"),
                })
            }
            None => {
                return Err(SynthError::MissingField {
                    component: "patch".to_string(),
                    field: "type",
                })
            }
        };
        Ok(Self { component, map })
    }

    /// Fields of an untyped object such as a voice document.
    pub fn untyped(component: &'v str, value: &'v Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| SynthError::InvalidField {
            component: component.to_string(),
            field: "type",
            reason: format!("expected an object, got {value}"),
        })?;
        Ok(Self { component, map })
    }

    pub fn component(&self) -> &'v str {
        self.component
    }

    /// A field's value; `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&'v Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn required(&self, key: &'static str) -> Result<&'v Value> {
        self.get(key).ok_or_else(|| self.missing(key))
    }

    pub fn missing(&self, key: &'static str) -> SynthError {
        SynthError::MissingField {
            component: self.component.to_string(),
            field: key,
        }
    }

    pub fn invalid(&self, key: &'static str, reason: impl Into<String>) -> SynthError {
        SynthError::InvalidField {
            component: self.component.to_string(),
            field: key,
            reason: reason.into(),
        }
    }

    pub fn f64(&self, key: &'static str) -> Result<f64> {
        self.number(key, self.required(key)?)
    }

    pub fn opt_f64(&self, key: &'static str) -> Result<Option<f64>> {
        self.get(key).map(|v| self.number(key, v)).transpose()
    }

    pub fn f64_or(&self, key: &'static str, default: f64) -> Result<f64> {
        Ok(self.opt_f64(key)?.unwrap_or(default))
    }

    pub fn usize(&self, key: &'static str) -> Result<usize> {
        let value = self.required(key)?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| self.invalid(key, format!("expected a non-negative integer, got {value}")))
    }

    pub fn bool_or(&self, key: &'static str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.invalid(key, format!("expected a boolean, got {other}"))),
        }
    }

    pub fn str(&self, key: &'static str) -> Result<&'v str> {
        let value = self.required(key)?;
        value
            .as_str()
            .ok_or_else(|| self.invalid(key, format!("expected a string, got {value}")))
    }

    pub fn opt_str(&self, key: &'static str) -> Result<Option<&'v str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(key, format!("expected a string, got {other}"))),
        }
    }

    pub fn list(&self, key: &'static str) -> Result<&'v [Value]> {
        let value = self.required(key)?;
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.invalid(key, format!("expected a list, got {value}")))
    }

    pub fn f64_list(&self, key: &'static str) -> Result<Vec<f64>> {
        self.list(key)?.iter().map(|v| self.number(key, v)).collect()
    }

    pub fn f64_list_or(&self, key: &'static str, default: &[f64]) -> Result<Vec<f64>> {
        if self.has(key) {
            self.f64_list(key)
        } else {
            Ok(default.to_vec())
        }
    }

    /// Deserialise an upper-case enum name such as `"LOWPASS"`.
    pub fn enum_or<T: DeserializeOwned>(&self, key: &'static str, default: T) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|e| self.invalid(key, e.to_string()))
            }
        }
    }

    pub fn required_enum<T: DeserializeOwned>(&self, key: &'static str) -> Result<T> {
        let value = self.required(key)?;
        serde_json::from_value(value.clone()).map_err(|e| self.invalid(key, e.to_string()))
    }

    /// Cutoff frequency as an angular frequency in `[0, pi]`.
    pub fn cutoff(&self, key: &'static str, sample_rate: f64) -> Result<f64> {
        parse_cutoff(self.required(key)?, sample_rate).map_err(|reason| self.invalid(key, reason))
    }

    pub fn opt_cutoff(&self, key: &'static str, sample_rate: f64) -> Result<Option<f64>> {
        self.get(key)
            .map(|v| parse_cutoff(v, sample_rate).map_err(|reason| self.invalid(key, reason)))
            .transpose()
    }

    pub fn number(&self, key: &'static str, value: &Value) -> Result<f64> {
        value
            .as_f64()
            .ok_or_else(|| self.invalid(key, format!("expected a number, got {value}")))
    }
}

/// Angular frequency from any of the cutoff notations.
///
/// - `0.25`: fraction of Nyquist
/// - `"440/44100"`: Hz over sampling rate
/// - `{"hz": 440, "sampling": 44100}`: the same; `sampling` defaults to
///   `sample_rate`
/// - `{"angular": 0.0627}`: already angular
/// - `{"of_nyquist": 0.25}`: fraction of Nyquist
pub fn parse_cutoff(value: &Value, sample_rate: f64) -> std::result::Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|fraction| fraction * PI)
            .ok_or_else(|| format!("unrepresentable number {n}")),
        Value::String(text) => {
            let (hz, rate) = text
                .split_once('/')
                .ok_or_else(|| format!("expected \"hz/rate\", got \"{text}\""))?;
            let hz: f64 = hz.trim().parse().map_err(|_| format!("bad frequency in \"{text}\""))?;
            let rate: f64 = rate.trim().parse().map_err(|_| format!("bad sampling rate in \"{text}\""))?;
            angular(hz, rate)
        }
        Value::Object(map) => {
            let number = |key: &str| -> std::result::Result<Option<f64>, String> {
                map.get(key)
                    .map(|v| v.as_f64().ok_or_else(|| format!("\"{key}\" must be a number, got {v}")))
                    .transpose()
            };
            if let Some(hz) = number("hz")? {
                return angular(hz, number("sampling")?.unwrap_or(sample_rate));
            }
            if let Some(omega) = number("angular")? {
                return Ok(omega);
            }
            if let Some(fraction) = number("of_nyquist")? {
                return Ok(fraction * PI);
            }
            Err(format!("no cutoff notation recognised in {value}"))
        }
        other => Err(format!("expected a cutoff frequency, got {other}")),
    }
}

fn angular(hz: f64, rate: f64) -> std::result::Result<f64, String> {
    if rate <= 0.0 {
        return Err(format!("sampling rate must be positive, got {rate}"));
    }
    Ok(hz / rate * 2.0 * PI)
}
