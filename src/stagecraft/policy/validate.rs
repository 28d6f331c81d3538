// SPDX-License-Identifier: MIT

//! Style value validation against per-key metadata

use serde_json::Value;

use super::types::{PolicyRegistry, StyleKeyMeta, StyleValueType};
use crate::kit::error::PolicyError;

impl StyleKeyMeta {
    /// Check `value` against this key's type, units, range and enum values.
    ///
    /// `null` always passes: it clears the declaration.
    pub fn validate(&self, key: &str, value: &Value) -> Result<(), PolicyError> {
        if value.is_null() {
            return Ok(());
        }
        let invalid = |reason: String| PolicyError::InvalidStyleValue {
            key: key.to_string(),
            reason,
        };

        match self.value_type {
            StyleValueType::Any => Ok(()),
            StyleValueType::String => match value {
                Value::String(_) => Ok(()),
                other => Err(invalid(format!("expected a string, got {}", other))),
            },
            StyleValueType::Enum => match value.as_str() {
                Some(s) if self.is_keyword(s) => Ok(()),
                _ => Err(invalid(format!(
                    "expected one of [{}], got {}",
                    self.values.join(", "),
                    value
                ))),
            },
            StyleValueType::Number => {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| invalid(format!("expected a number, got {}", value)))?;
                self.check_range(number).map_err(invalid)
            }
            StyleValueType::Length => match value {
                Value::Number(n) => {
                    let number = n.as_f64().unwrap_or(0.0);
                    self.check_range(number).map_err(invalid)
                }
                Value::String(s) if self.is_keyword(s) => Ok(()),
                Value::String(s) => {
                    let (number, unit) = split_length(s)
                        .ok_or_else(|| invalid(format!("'{}' is not a length", s)))?;
                    if !unit.is_empty()
                        && !self.units.is_empty()
                        && !self.units.iter().any(|u| u == unit)
                    {
                        return Err(invalid(format!(
                            "unit '{}' not in [{}]",
                            unit,
                            self.units.join(", ")
                        )));
                    }
                    if unit.is_empty() && number != 0.0 && !self.units.is_empty() {
                        return Err(invalid(format!("'{}' is missing a unit", s)));
                    }
                    self.check_range(number).map_err(invalid)
                }
                other => Err(invalid(format!("expected a length, got {}", other))),
            },
            StyleValueType::Color => match value.as_str() {
                Some(s) if self.is_keyword(s) || is_color(s) => Ok(()),
                _ => Err(invalid(format!("'{}' is not a color", value))),
            },
        }
    }

    fn is_keyword(&self, s: &str) -> bool {
        self.values.iter().chain(self.presets.iter()).any(|v| v == s)
    }

    fn check_range(&self, number: f64) -> Result<(), String> {
        if let Some(min) = self.min {
            if number < min {
                return Err(format!("{} is below the minimum {}", number, min));
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return Err(format!("{} is above the maximum {}", number, max));
            }
        }
        Ok(())
    }
}

/// `"12.5px"` -> `(12.5, "px")`, `"-4"` -> `(-4.0, "")`
fn split_length(s: &str) -> Option<(f64, &str)> {
    let s = s.trim();
    let split = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let number = s[..split].parse::<f64>().ok()?;
    let unit = &s[split..];
    if unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
        Some((number, unit))
    } else {
        None
    }
}

fn is_color(s: &str) -> bool {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let lower = s.to_ascii_lowercase();
    if ["rgb(", "rgba(", "hsl(", "hsla("]
        .iter()
        .any(|p| lower.starts_with(p))
    {
        return lower.ends_with(')');
    }
    // Named colors and keywords like `transparent` / `currentColor`
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}

impl PolicyRegistry {
    /// Every tag a component names and every component a policy targets
    /// must be declared
    pub fn check_references(&self) -> Result<(), PolicyError> {
        for (id, caps) in &self.components {
            let mut named = caps.tags.iter().chain(caps.default_tag.iter());
            if let Some(tag) = named.find(|t| self.tag(t).is_none()) {
                return Err(PolicyError::UnknownTag {
                    component: id.clone(),
                    tag: tag.clone(),
                });
            }
        }
        if let Some(id) = self
            .component_policies
            .keys()
            .find(|id| self.capabilities(id).is_none())
        {
            return Err(PolicyError::UnknownComponent(id.clone()));
        }
        Ok(())
    }
}
