//! Content Sniffers
//!
//! Pure predicates over a bounded file prefix. The text sniffers take the
//! decoded prefix; the JSON sniffers take an already parsed value so the
//! prefix is parsed once per file. A predicate never fails: anything it
//! cannot make sense of is simply "no match".

use serde_json::Value;

// =============================================================================
// Text Sniffers
// =============================================================================

/// True if the prefix, trimmed, starts with the `WEBVTT` signature
pub fn is_webvtt(prefix: &str) -> bool {
    prefix
        .trim_start_matches('\u{feff}')
        .trim()
        .starts_with("WEBVTT")
}

/// True if the prefix contains an RTTM `SPEAKER` record
pub fn is_rttm(prefix: &str) -> bool {
    prefix.contains("SPEAKER")
}

// =============================================================================
// JSON Sniffers
// =============================================================================

/// COCO-style person tracking
///
/// Matches a list whose first element has both `keypoints` and `bbox`, or an
/// object holding a list under `annotations` or `results`.
pub fn is_person_tracking(value: &Value) -> bool {
    match value {
        Value::Array(items) => first_has_all(items.first(), &["keypoints", "bbox"]),
        Value::Object(_) => has_list(value, "annotations") || has_list(value, "results"),
        _ => false,
    }
}

/// Scene boundaries
///
/// Matches a list whose first element has `start_time`/`startTime`, an object
/// with a `results` or `scenes` list, or an object whose first annotation has
/// a `scene_type`.
pub fn is_scene_detection(value: &Value) -> bool {
    match value {
        Value::Array(items) => first_has_any(items.first(), &["start_time", "startTime"]),
        Value::Object(_) => {
            has_list(value, "results")
                || has_list(value, "scenes")
                || first_has_any(first_of(value, "annotations"), &["scene_type"])
        }
        _ => false,
    }
}

/// LAION-style face analysis
///
/// Matches a list whose first element has both `face_id` and `attributes`, or
/// an object whose first `annotations`/`results` entry has a `face_id`.
pub fn is_face_analysis(value: &Value) -> bool {
    match value {
        Value::Array(items) => first_has_all(items.first(), &["face_id", "attributes"]),
        Value::Object(_) => {
            first_has_any(first_of(value, "annotations"), &["face_id"])
                || first_has_any(first_of(value, "results"), &["face_id"])
        }
        _ => false,
    }
}

/// Complete-results bundle
///
/// Must be checked against the whole document. `video_path`,
/// `pipeline_results`, `config` and `start_time` must be present and
/// non-empty; `total_duration` only has to be present (even as `null`).
pub fn is_complete_results(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    ["video_path", "pipeline_results", "config", "start_time"]
        .iter()
        .all(|key| map.get(*key).is_some_and(is_truthy))
        && map.contains_key("total_duration")
}

// =============================================================================
// Helpers
// =============================================================================

fn has_list(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(Value::is_array)
}

fn first_of<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key)?.as_array()?.first()
}

fn first_has_all(first: Option<&Value>, keys: &[&str]) -> bool {
    match first.and_then(Value::as_object) {
        Some(map) => keys.iter().all(|k| map.contains_key(*k)),
        None => false,
    }
}

fn first_has_any(first: Option<&Value>, keys: &[&str]) -> bool {
    match first.and_then(Value::as_object) {
        Some(map) => keys.iter().any(|k| map.contains_key(*k)),
        None => false,
    }
}

/// Loose truthiness: null, false, zero and "" count as missing
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// =============================================================================
// Tests
// =============================================================================
