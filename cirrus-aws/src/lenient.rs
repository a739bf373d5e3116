// Property deserializers that accept both native values and strings.
//
// Properties files and environment variables only carry strings, so
// `enabled = "false"` and `enabled = false` must bind the same way.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

pub fn opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(value)),
        Some(Value::String(raw)) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(D::Error::custom(format!("expected a boolean, found '{}'", other))),
        },
        Some(other) => Err(D::Error::custom(format!("expected a boolean, found {}", other))),
    }
}

pub fn opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|value| u32::try_from(value).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, found {}", number))),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a non-negative integer, found '{}'", raw))),
        Some(other) => Err(D::Error::custom(format!("expected an integer, found {}", other))),
    }
}

pub fn opt_duration<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_u64()
            .map(|millis| Some(Duration::from_millis(millis)))
            .ok_or_else(|| D::Error::custom(format!("expected milliseconds, found {}", number))),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => parse_duration(&raw).map(Some).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!("expected a duration, found {}", other))),
    }
}

/// A list, or a comma separated string.
pub fn opt_string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    let items = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(raw)) => raw.split(',').map(str::to_string).collect::<Vec<_>>(),
        Some(Value::Array(values)) => values
            .into_iter()
            .map(|value| match value {
                Value::String(item) => Ok(item),
                other => Err(D::Error::custom(format!("expected a string, found {}", other))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        // Indexed properties (`names.0=a`, `names.1=b`) arrive as a table.
        Some(Value::Object(map)) => {
            let mut entries: Vec<(usize, String)> = map
                .into_iter()
                .map(|(index, value)| -> Result<(usize, String), D::Error> {
                    let index = index
                        .parse::<usize>()
                        .map_err(|_| D::Error::custom(format!("expected a list index, found '{}'", index)))?;
                    match value {
                        Value::String(item) => Ok((index, item)),
                        other => Err(D::Error::custom(format!("expected a string, found {}", other))),
                    }
                })
                .collect::<Result<_, _>>()?;
            entries.sort_by_key(|(index, _)| *index);
            entries.into_iter().map(|(_, item)| item).collect()
        }
        Some(other) => return Err(D::Error::custom(format!("expected a list, found {}", other))),
    };

    Ok(Some(
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    ))
}

/// Parse `15s`, `250ms`, `2m`, `1.5h` or a bare millisecond count.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let (amount, unit) = raw.split_at(split);
    let unit = unit.trim().to_ascii_lowercase();

    if amount.is_empty() {
        return Err(format!("invalid duration '{}'", raw));
    }

    let nanos_per_unit: u64 = match unit.as_str() {
        "ns" => 1,
        "us" => 1_000,
        "" | "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        "d" => 86_400 * 1_000_000_000,
        _ => return Err(format!("unknown duration unit '{}' in '{}'", unit, raw)),
    };

    if let Ok(whole) = amount.parse::<u64>() {
        return whole
            .checked_mul(nanos_per_unit)
            .map(Duration::from_nanos)
            .ok_or_else(|| format!("duration '{}' is too large", raw));
    }

    let fractional: f64 = amount
        .parse()
        .map_err(|_| format!("invalid duration '{}'", raw))?;
    Duration::try_from_secs_f64(fractional * nanos_per_unit as f64 / 1e9)
        .map_err(|e| format!("invalid duration '{}': {}", raw, e))
}
