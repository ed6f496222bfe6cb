use serde_json::{Map, Value};

use super::decision::IntentDecision;
use crate::error::{ForgeError, Result};
use crate::types::{DeviceFamily, Operation, Platform, WatchShape};

// ─────────────────────────────────────────────────────────────────────────────
// Strict stage
// ─────────────────────────────────────────────────────────────────────────────

/// Remove a surrounding markdown code fence (```json ... ```), if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse raw intent text and normalize it against `defaults`.
///
/// Syntax errors and non-object payloads are [`ForgeError::MalformedIntent`].
/// Everything else is corrected in place.
pub fn parse_intent(raw: &str, defaults: &IntentDecision) -> Result<IntentDecision> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ForgeError::MalformedIntent {
            reason: "empty payload".to_string(),
        });
    }

    let value: Value = serde_json::from_str(body).map_err(|e| ForgeError::MalformedIntent {
        reason: e.to_string(),
    })?;
    let Value::Object(fields) = value else {
        return Err(ForgeError::MalformedIntent {
            reason: format!("expected a JSON object, got {}", json_kind(&value)),
        });
    };

    let decision = normalize_fields(&fields, defaults);
    tracing::debug!(
        operation = decision.operation.as_str(),
        platform = decision.platform.as_str(),
        platforms = decision.platforms.len(),
        confidence = decision.confidence,
        "intent normalized"
    );
    Ok(decision)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// First present field among snake_case and camelCase spellings
fn field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| !value.is_null())
}

// ─────────────────────────────────────────────────────────────────────────────
// Coercion stage
// ─────────────────────────────────────────────────────────────────────────────

fn normalize_fields(fields: &Map<String, Value>, defaults: &IntentDecision) -> IntentDecision {
    let operation = coerce_operation(field(fields, &["operation", "op"]), defaults.operation);

    let listed = field(fields, &["platforms"])
        .map(coerce_platforms)
        .unwrap_or_default();
    let primary = field(fields, &["platform"]).and_then(|value| {
        let platform = coerce_platform(value);
        if platform.is_none() {
            tracing::warn!(value = %value, "Unrecognized platform hint, using default");
        }
        platform
    });

    let (platform, platforms) = match (listed.first(), primary) {
        (Some(first), _) => (*first, listed.clone()),
        (None, Some(primary)) => (primary, Vec::new()),
        (None, None) => (defaults.platform, defaults.platforms.clone()),
    };

    let device_family = match field(fields, &["device_family", "deviceFamily"]) {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            DeviceFamily::from_hint(s).or_else(|| {
                tracing::warn!(value = %s, "Unrecognized device family, using default");
                defaults.device_family
            })
        }
        _ => defaults.device_family,
    };

    let watch_shape = match field(
        fields,
        &["watch_project_shape", "watchProjectShape", "watch_shape", "watchShape"],
    ) {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            WatchShape::from_hint(s).or_else(|| {
                tracing::warn!(value = %s, "Unrecognized watch project shape, using default");
                defaults.watch_shape
            })
        }
        _ => defaults.watch_shape,
    };

    let confidence = match field(fields, &["confidence"]) {
        Some(value) => coerce_confidence(value).unwrap_or_else(|| {
            tracing::warn!(value = %value, "Non-numeric confidence, using default");
            clamp_confidence(defaults.confidence)
        }),
        None => clamp_confidence(defaults.confidence),
    };

    let reason = match field(fields, &["reason", "reasoning"]) {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => defaults.reason.clone(),
    };

    let mut decision = IntentDecision {
        operation,
        platform,
        platforms,
        device_family,
        watch_shape,
        confidence,
        reason,
    };
    apply_consistency(&mut decision);
    decision
}

/// Map an operation value to the closed set; anything else is `default`.
pub fn coerce_operation(value: Option<&Value>, default: Operation) -> Operation {
    match value {
        Some(Value::String(s)) => Operation::from_hint(s).unwrap_or_else(|| {
            tracing::warn!(value = %s, "Unrecognized operation, using {}", default.as_str());
            default
        }),
        Some(other) => {
            tracing::warn!(value = %other, "Non-string operation, using {}", default.as_str());
            default
        }
        None => default,
    }
}

/// Recognize a single platform hint
pub fn coerce_platform(value: &Value) -> Option<Platform> {
    value.as_str().and_then(Platform::from_hint)
}

/// Recognize a platform list (or a single string), dropping unknown entries
/// and duplicates while keeping first-seen order.
pub fn coerce_platforms(value: &Value) -> Vec<Platform> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut platforms = Vec::new();
    for entry in entries {
        match coerce_platform(entry) {
            Some(platform) if !platforms.contains(&platform) => platforms.push(platform),
            Some(_) => {}
            None => tracing::warn!(value = %entry, "Dropping unrecognized platform hint"),
        }
    }
    platforms
}

fn coerce_confidence(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    Some(clamp_confidence(raw))
}

/// Clamp into [0, 1]. NaN becomes 0. Idempotent.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Enforce the platform-dependent field invariants.
///
/// - watchOS: no device family; shape defaults to standalone
/// - tvOS, visionOS, macOS: neither device family nor shape
/// - iOS: no shape
pub fn apply_consistency(decision: &mut IntentDecision) {
    match decision.platform {
        Platform::Watchos => {
            decision.device_family = None;
            if decision.watch_shape.is_none() {
                decision.watch_shape = Some(WatchShape::Standalone);
            }
        }
        Platform::Tvos | Platform::Visionos | Platform::Macos => {
            decision.device_family = None;
            decision.watch_shape = None;
        }
        Platform::Ios => {
            decision.watch_shape = None;
        }
    }
}
