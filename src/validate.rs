//! Ingestion validation: the admission rules for measurement payloads.
//!
//! [`validate_record`] is a pure function from a decoded JSON body to either
//! normalized [`Reading`]s or the complete list of field errors. It performs
//! no storage access; the route layer persists readings only after the whole
//! payload has been admitted, so a payload is stored entirely or not at all.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::FieldError;
use crate::models::{parse_timestamp, Label, Location, Reading};

// ---

/// Validate one ingestion payload against shape and physical-range rules.
///
/// Every field and every measurement entry is checked (first failure wins
/// per field), so a single response reports everything the caller must fix.
/// On success the payload becomes one `Reading` per measurement entry,
/// sharing the payload's timestamp, device id and location.
pub fn validate_record(body: &Value) -> Result<Vec<Reading>, Vec<FieldError>> {
    // ---
    let mut errors = Vec::new();

    let recorded_at = parse_at(body, &mut errors);
    let device_id = parse_device_id(body, &mut errors);
    let location = parse_location(body, &mut errors);
    let measurements = parse_measurements(body, &mut errors);

    // Every None above pushed at least one error, so the fallthrough arm
    // never returns an empty list.
    match (recorded_at, device_id, location, measurements) {
        (Some(recorded_at), Some(device_id), Some(location), Some(measurements)) => Ok(measurements
            .into_iter()
            .map(|(label, value)| Reading {
                label,
                value,
                recorded_at,
                device_id,
                location,
            })
            .collect()),
        _ => Err(errors),
    }
}

// ---

fn parse_at(body: &Value, errors: &mut Vec<FieldError>) -> Option<DateTime<Utc>> {
    // ---
    let Some(raw) = body.get("at").and_then(Value::as_str) else {
        errors.push(FieldError::malformed(
            "at",
            "must be an ISO-8601 timestamp string",
        ));
        return None;
    };

    match parse_timestamp(raw) {
        Some(at) => Some(at),
        None => {
            errors.push(FieldError::malformed(
                "at",
                format!("\"{raw}\" is not a valid ISO-8601 timestamp"),
            ));
            None
        }
    }
}

fn parse_device_id(body: &Value, errors: &mut Vec<FieldError>) -> Option<Uuid> {
    // ---
    let Some(raw) = body.get("device_id").and_then(Value::as_str) else {
        errors.push(FieldError::malformed("device_id", "must be a UUID string"));
        return None;
    };

    match Uuid::parse_str(raw) {
        Ok(device_id) => Some(device_id),
        Err(_) => {
            errors.push(FieldError::malformed(
                "device_id",
                format!("\"{raw}\" is not a valid UUID"),
            ));
            None
        }
    }
}

fn parse_location(body: &Value, errors: &mut Vec<FieldError>) -> Option<Location> {
    // ---
    let Some(object) = body.get("location").and_then(Value::as_object) else {
        errors.push(FieldError::malformed(
            "location",
            "must be an object with numeric lat and lng",
        ));
        return None;
    };

    // Check both coordinates before bailing so one response names them all.
    let lat = parse_coordinate(object.get("lat"), "location.lat", errors);
    let lng = parse_coordinate(object.get("lng"), "location.lng", errors);

    Some(Location { lat: lat?, lng: lng? })
}

fn parse_coordinate(value: Option<&Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<f64> {
    // ---
    let Some(coordinate) = value.and_then(Value::as_f64) else {
        errors.push(FieldError::malformed(field, "must be a number"));
        return None;
    };

    // Coordinates are constrained to be non-negative, matching the deployed
    // ingest contract. TODO: confirm with ops whether southern/western
    // hemisphere deployments are expected; real coordinates span negative
    // ranges, so this rule would then have to go.
    if coordinate < 0.0 {
        errors.push(FieldError::out_of_range(
            field,
            format!("must be >= 0.0, got {coordinate}"),
        ));
        return None;
    }

    Some(coordinate)
}

fn parse_measurements(body: &Value, errors: &mut Vec<FieldError>) -> Option<Vec<(Label, f64)>> {
    // ---
    let entries = match body.get("measurements").and_then(Value::as_array) {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            errors.push(FieldError::malformed(
                "measurements",
                "must be a non-empty list of {label, value} objects",
            ));
            return None;
        }
    };

    let mut parsed = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let field = format!("measurements[{index}]");

        let Some(object) = entry.as_object() else {
            errors.push(FieldError::malformed(&field, "must be a {label, value} object"));
            continue;
        };
        let Some(code) = object.get("label").and_then(Value::as_str) else {
            errors.push(FieldError::malformed(
                &field,
                "label must be one of temp, rain, hum",
            ));
            continue;
        };
        let Some(label) = Label::from_code(code) else {
            errors.push(FieldError::malformed(
                &field,
                format!("\"{code}\" is not a known label; expected temp, rain or hum"),
            ));
            continue;
        };
        let Some(value) = object.get("value").and_then(Value::as_f64) else {
            errors.push(FieldError::malformed(&field, "value must be a number"));
            continue;
        };

        let (lo, hi) = label.range();
        if value < lo || value > hi {
            errors.push(FieldError::out_of_range(
                &field,
                format!("{} must be between {} and {}, got {}", label.name(), lo, hi, value),
            ));
            continue;
        }

        parsed.push((label, value));
    }

    if parsed.len() == entries.len() {
        Some(parsed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::errors::ErrorKind;
    use chrono::TimeZone;
    use serde_json::json;

    const DEVICE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn base_payload() -> Value {
        // ---
        json!({
            "at": "2025-03-26T18:45:00Z",
            "device_id": DEVICE_ID,
            "location": { "lat": 47.56321, "lng": 1.524568 },
            "measurements": [
                { "label": "temp", "value": 10.52 },
                { "label": "rain", "value": 0 },
            ],
        })
    }

    fn single_measurement(label: &str, value: f64) -> Value {
        // ---
        let mut payload = base_payload();
        payload["measurements"] = json!([{ "label": label, "value": value }]);
        payload
    }

    /// Convenience for tests that expect exactly one error.
    fn sole_error(payload: &Value) -> FieldError {
        // ---
        let errors = validate_record(payload).unwrap_err();
        assert_eq!(errors.len(), 1, "expected one error, got {errors:?}");
        errors.into_iter().next().unwrap()
    }

    #[test]
    fn test_valid_payload_normalizes_readings() {
        // ---
        let readings = validate_record(&base_payload()).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].label, Label::Temperature);
        assert_eq!(readings[0].value, 10.52);
        assert_eq!(readings[1].label, Label::Rainfall);
        assert_eq!(readings[1].value, 0.0);

        // All readings share the payload's timestamp, device and location
        let expected_at = Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap();
        for reading in &readings {
            assert_eq!(reading.recorded_at, expected_at);
            assert_eq!(reading.device_id, Uuid::parse_str(DEVICE_ID).unwrap());
            assert_eq!(reading.location, Location { lat: 47.56321, lng: 1.524568 });
        }
    }

    #[test]
    fn test_naive_timestamp_taken_as_utc() {
        // ---
        let mut payload = base_payload();
        payload["at"] = json!("2025-03-26T18:45:00");

        let readings = validate_record(&payload).unwrap();
        assert_eq!(
            readings[0].recorded_at,
            Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap()
        );
    }

    #[test]
    fn test_rejects_unparseable_at() {
        // ---
        let mut payload = base_payload();
        payload["at"] = json!("not-a-date");

        let error = sole_error(&payload);
        assert_eq!(error.field, "at");
        assert_eq!(error.kind, ErrorKind::MalformedInput);
    }

    #[test]
    fn test_rejects_missing_or_nonstring_at() {
        // ---
        let mut payload = base_payload();
        payload.as_object_mut().unwrap().remove("at");
        assert_eq!(sole_error(&payload).kind, ErrorKind::MalformedInput);

        let mut payload = base_payload();
        payload["at"] = json!(1743014700);
        assert_eq!(sole_error(&payload).field, "at");
    }

    #[test]
    fn test_rejects_malformed_device_id() {
        // ---
        let mut payload = base_payload();
        payload["device_id"] = json!("logger");

        let error = sole_error(&payload);
        assert_eq!(error.field, "device_id");
        assert_eq!(error.kind, ErrorKind::MalformedInput);
    }

    #[test]
    fn test_rejects_location_missing_coordinates() {
        // ---
        let mut payload = base_payload();
        payload["location"] = json!({ "key": 5.6 });

        let errors = validate_record(&payload).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["location.lat", "location.lng"]);
        assert!(errors.iter().all(|e| e.kind == ErrorKind::MalformedInput));
    }

    #[test]
    fn test_rejects_location_wrong_shape() {
        // ---
        let mut payload = base_payload();
        payload["location"] = json!("string");

        let error = sole_error(&payload);
        assert_eq!(error.field, "location");
        assert_eq!(error.kind, ErrorKind::MalformedInput);
    }

    #[test]
    fn test_rejects_negative_coordinates() {
        // ---
        let mut payload = base_payload();
        payload["location"]["lat"] = json!(-2.5);

        let error = sole_error(&payload);
        assert_eq!(error.field, "location.lat");
        assert_eq!(error.kind, ErrorKind::OutOfRange);
        assert!(error.message.contains("-2.5"), "message was: {}", error.message);

        let mut payload = base_payload();
        payload["location"]["lng"] = json!(-0.001);
        assert_eq!(sole_error(&payload).field, "location.lng");
    }

    #[test]
    fn test_accepts_zero_coordinates() {
        // ---
        let mut payload = base_payload();
        payload["location"] = json!({ "lat": 0.0, "lng": 0.0 });

        let readings = validate_record(&payload).unwrap();
        assert_eq!(readings[0].location, Location { lat: 0.0, lng: 0.0 });
    }

    #[test]
    fn test_boundary_values_accepted() {
        // ---
        for (label, value) in [
            ("temp", -20.0),
            ("temp", 40.0),
            ("hum", 20.0),
            ("hum", 100.0),
            ("rain", 0.0),
            ("rain", 2.0),
        ] {
            let payload = single_measurement(label, value);
            assert!(
                validate_record(&payload).is_ok(),
                "{label} = {value} should be accepted"
            );
        }
    }

    #[test]
    fn test_one_beyond_boundary_rejected() {
        // ---
        for (label, value, name) in [
            ("temp", -21.0, "Temperature"),
            ("temp", 41.0, "Temperature"),
            ("hum", 19.0, "Humidity"),
            ("hum", 101.0, "Humidity"),
            ("rain", -1.0, "Rainfall"),
            ("rain", 3.0, "Rainfall"),
        ] {
            let payload = single_measurement(label, value);
            let error = sole_error(&payload);
            assert_eq!(error.kind, ErrorKind::OutOfRange, "{label} = {value}");
            assert!(
                error.message.contains(name),
                "message should name {name}, was: {}",
                error.message
            );
        }
    }

    #[test]
    fn test_out_of_range_message_names_bounds_and_value() {
        // ---
        let error = sole_error(&single_measurement("temp", 500.0));
        assert_eq!(
            error.message,
            "Temperature must be between -20 and 40, got 500"
        );
    }

    #[test]
    fn test_one_bad_entry_rejects_whole_batch() {
        // ---
        let mut payload = base_payload();
        payload["measurements"] = json!([
            { "label": "temp", "value": 20.0 },
            { "label": "hum", "value": 0 },
            { "label": "rain", "value": 0.4 },
        ]);

        let errors = validate_record(&payload).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "measurements[1]");
        assert_eq!(errors[0].kind, ErrorKind::OutOfRange);
    }

    #[test]
    fn test_collects_every_bad_measurement() {
        // ---
        let mut payload = base_payload();
        payload["measurements"] = json!([
            { "label": "temp", "value": 500 },
            { "label": "rain", "value": 8 },
            { "label": "hum", "value": 50.0 },
        ]);

        let errors = validate_record(&payload).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["measurements[0]", "measurements[1]"]);
    }

    #[test]
    fn test_rejects_unknown_label() {
        // ---
        let error = sole_error(&single_measurement("wind", 3.0));
        assert_eq!(error.field, "measurements[0]");
        assert_eq!(error.kind, ErrorKind::MalformedInput);
        assert!(error.message.contains("wind"));
    }

    #[test]
    fn test_rejects_measurement_without_label_or_value() {
        // ---
        let mut payload = base_payload();
        payload["measurements"] = json!([{ "key": 5.6 }]);
        assert_eq!(sole_error(&payload).kind, ErrorKind::MalformedInput);

        let mut payload = base_payload();
        payload["measurements"] = json!([{ "label": "temp", "value": "warm" }]);
        let error = sole_error(&payload);
        assert_eq!(error.field, "measurements[0]");
        assert_eq!(error.message, "value must be a number");
    }

    #[test]
    fn test_rejects_empty_or_nonlist_measurements() {
        // ---
        let mut payload = base_payload();
        payload["measurements"] = json!([]);
        assert_eq!(sole_error(&payload).field, "measurements");

        let mut payload = base_payload();
        payload["measurements"] = json!("string");
        assert_eq!(sole_error(&payload).kind, ErrorKind::MalformedInput);
    }

    #[test]
    fn test_reports_multiple_fields_together() {
        // ---
        let mut payload = base_payload();
        payload["at"] = json!("garbage");
        payload["location"]["lat"] = json!(-1.0);
        payload["measurements"] = json!([{ "label": "temp", "value": 99 }]);

        let errors = validate_record(&payload).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["at", "location.lat", "measurements[0]"]);
    }

    #[test]
    fn test_future_timestamps_accepted() {
        // ---
        let mut payload = base_payload();
        payload["at"] = json!("2099-01-01T00:00:00Z");
        assert!(validate_record(&payload).is_ok());
    }
}
