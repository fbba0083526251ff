//! Deserializers for Ansible's loosely typed parameters.
//!
//! Playbooks routinely pass `wait: yes` or `timeout: "600"`; Ansible's own
//! argument spec coerces those, so a binary module has to as well. Use with
//! `#[serde(default, deserialize_with = "...")]` on `Option` fields; `null`
//! deserializes to `None`.

use serde::de::{Deserializer, Error};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

pub fn bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Scalar>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(value) => value,
    };

    match value {
        Scalar::Bool(flag) => Ok(Some(flag)),
        Scalar::Unsigned(1) | Scalar::Signed(1) => Ok(Some(true)),
        Scalar::Unsigned(0) | Scalar::Signed(0) => Ok(Some(false)),
        Scalar::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "t" | "on" | "1" => Ok(Some(true)),
            "no" | "n" | "false" | "f" | "off" | "0" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!(
                "'{text}' is not a valid boolean"
            ))),
        },
        _ => Err(D::Error::custom("expected a boolean")),
    }
}

pub fn u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Scalar>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(value) => value,
    };

    match value {
        Scalar::Unsigned(number) => Ok(Some(number)),
        Scalar::Float(number) if number >= 0.0 && number.fract() == 0.0 => {
            Ok(Some(number as u64))
        }
        Scalar::Text(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("'{text}' is not a valid unsigned integer"))),
        _ => Err(D::Error::custom("expected an unsigned integer")),
    }
}
