//! Payload validation and normalization
//!
//! Turns an arbitrary upsert payload into a [`NormalizedUpsert`]. The only hard
//! failure is a missing or empty `deviceId`; every other field has a
//! defaulting fallback, so malformed screen input never rejects a write.
//!
//! | field              | rule                                              |
//! |--------------------|---------------------------------------------------|
//! | `webUrl`/`videoUrl`| strings verbatim, anything else becomes `""`      |
//! | `layout`           | unknown values become `split`                     |
//! | `screen.orientation` | exactly `column`, otherwise `row`               |
//! | `screen.splitRatio`| clamped to 0..=100, default 50                    |
//! | `screen.gapPx`     | clamped to 0..=200, default 0                     |
//! | `screen.paddingPx` | clamped to 0..=200, default 0                     |
//!
//! Defaults come from the submitted payload only. A previously stored record
//! never fills in omitted fields.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{
    DEFAULT_SPLIT_RATIO, DeviceSettings, Layout, Orientation, PIXEL_RANGE, SPLIT_RATIO_RANGE,
    ScreenConfig,
};

/// A validated upsert: the target device and its normalized settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUpsert {
    pub device_id: String,
    pub settings: DeviceSettings,
}

/// Validate and normalize a raw upsert payload
///
/// # Errors
///
/// [`Error::InvalidIdentifier`] when `deviceId` is absent, not a string, or
/// empty. A payload that is not a JSON object has no `deviceId` and fails the
/// same way.
pub fn normalize(payload: &Value) -> Result<NormalizedUpsert> {
    let device_id = device_id(payload)?;
    Ok(NormalizedUpsert {
        device_id: device_id.to_string(),
        settings: normalize_settings(payload),
    })
}

/// Normalize everything except the identifier
///
/// Never fails; this is the defaulting half of [`normalize`].
pub fn normalize_settings(payload: &Value) -> DeviceSettings {
    let layout = payload
        .get("layout")
        .and_then(Value::as_str)
        .and_then(Layout::from_wire)
        .unwrap_or_default();

    DeviceSettings {
        web_url: string_or_empty(payload.get("webUrl")),
        video_url: string_or_empty(payload.get("videoUrl")),
        layout,
        screen: normalize_screen(payload.get("screen")),
    }
}

fn device_id(payload: &Value) -> Result<&str> {
    match payload.get("deviceId") {
        None | Some(Value::Null) => Err(Error::invalid_identifier("deviceId is required")),
        Some(Value::String(id)) if id.is_empty() => {
            Err(Error::invalid_identifier("deviceId must not be empty"))
        }
        Some(Value::String(id)) => Ok(id),
        Some(_) => Err(Error::invalid_identifier("deviceId must be a string")),
    }
}

fn string_or_empty(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn normalize_screen(screen: Option<&Value>) -> ScreenConfig {
    let field = |name: &str| screen_field(screen, name);

    let orientation = match field("orientation").and_then(Value::as_str) {
        Some("column") => Orientation::Column,
        _ => Orientation::Row,
    };

    ScreenConfig {
        orientation,
        split_ratio: clamp_or_default(
            field("splitRatio"),
            SPLIT_RATIO_RANGE,
            i64::from(DEFAULT_SPLIT_RATIO),
        ) as u8,
        gap_px: clamp_or_default(field("gapPx"), PIXEL_RANGE, 0) as u16,
        padding_px: clamp_or_default(field("paddingPx"), PIXEL_RANGE, 0) as u16,
    }
}

// A non-object screen behaves as if it were absent.
fn screen_field<'a>(screen: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    screen.filter(|s| s.is_object()).and_then(|s| s.get(name))
}

/// Clamp a numeric field into `range`, rounding to the nearest integer
///
/// The result always lies inside `range`; `default` is used when the field is
/// absent or does not parse to a finite number.
fn clamp_or_default(value: Option<&Value>, range: (i64, i64), default: i64) -> i64 {
    let (min, max) = range;
    match value.and_then(finite_number) {
        Some(n) => n.clamp(min as f64, max as f64).round() as i64,
        None => default,
    }
}

/// Parse a JSON number or numeric string into a finite `f64`
fn finite_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}
