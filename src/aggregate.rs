//! Time-window resolution and bucketed aggregation for fetch queries.
//!
//! The fetch endpoints hand their raw query parameters to [`resolve_window`]
//! and [`resolve_span`], then feed whatever the storage layer returned into
//! [`aggregate`]. Everything here is pure; storage access stays in the
//! route layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::FieldError;
use crate::models::{parse_timestamp, Label, Reading, Reduction, SlotRecord};

// ---

/// Query-string parameters shared by the fetch endpoints.
///
/// Everything arrives as optional text; resolution turns it into typed
/// values or a taxonomy error, so handlers never interpret raw parameters
/// themselves.
#[derive(Debug, Default, Deserialize)]
pub struct FetchQuery {
    // ---
    pub device_id: Option<String>,
    pub since: Option<String>,
    pub before: Option<String>,
    pub span: Option<String>,
}

/// Resolved fetch window: which device, and the exclusive time bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    // ---
    pub device_id: Uuid,
    pub since: Option<DateTime<Utc>>,
    pub before: DateTime<Utc>,
}

/// Bucket width for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Hour,
    Day,
}

// ---

/// Resolve `device_id`, `since` and `before` into a typed [`Window`].
///
/// `device_id` is required and must parse as a UUID; this fails before any
/// storage access. `before` defaults to `now`, evaluated per request. Both
/// bounds are exclusive.
pub fn resolve_window(query: &FetchQuery, now: DateTime<Utc>) -> Result<Window, FieldError> {
    // ---
    let device_id = query
        .device_id
        .as_deref()
        .ok_or_else(|| FieldError::missing("device_id", "Missing required device_id parameter"))?;
    let device_id = Uuid::parse_str(device_id)
        .map_err(|_| FieldError::malformed("device_id", "Invalid device_id format"))?;

    let since = match query.since.as_deref() {
        Some(raw) => Some(parse_bound("since", raw)?),
        None => None,
    };
    let before = match query.before.as_deref() {
        Some(raw) => parse_bound("before", raw)?,
        None => now,
    };

    Ok(Window {
        device_id,
        since,
        before,
    })
}

fn parse_bound(field: &str, raw: &str) -> Result<DateTime<Utc>, FieldError> {
    // ---
    parse_timestamp(raw).ok_or_else(|| {
        FieldError::malformed(field, format!("\"{raw}\" is not a valid ISO-8601 timestamp"))
    })
}

/// Resolve the `span` parameter.
///
/// Absent means raw passthrough, as does the explicit `raw` spelling the
/// deployed dataloggers send. `hour` and `day` select bucketed aggregation;
/// anything else is rejected.
pub fn resolve_span(query: &FetchQuery) -> Result<Option<Span>, FieldError> {
    // ---
    match query.span.as_deref() {
        None | Some("raw") => Ok(None),
        Some("hour") => Ok(Some(Span::Hour)),
        Some("day") => Ok(Some(Span::Day)),
        Some(other) => Err(FieldError::invalid(
            "span",
            format!("\"{other}\" is not a valid span; expected hour, day or raw"),
        )),
    }
}

// ---

impl Span {
    /// Start of the calendar-aligned UTC bucket containing `at`.
    pub fn slot_start(self, at: DateTime<Utc>) -> DateTime<Utc> {
        // ---
        let midnight = at.date_naive().and_time(NaiveTime::MIN);
        let start = match self {
            Span::Day => midnight,
            Span::Hour => midnight + Duration::hours(i64::from(at.hour())),
        };
        Utc.from_utc_datetime(&start)
    }
}

/// Reduce readings into one record per non-empty `(label, time_slot)` group.
///
/// Each reading lands in the bucket its `recorded_at` falls into; each group
/// is reduced with its label's strategy over IEEE f64 values, with no
/// rounding beyond natural floating-point representation. Labels absent from
/// the input contribute no records. Output order is deterministic: label
/// declaration order, then slot.
pub fn aggregate(span: Span, readings: &[Reading]) -> Vec<SlotRecord> {
    // ---
    let mut groups: BTreeMap<(Label, DateTime<Utc>), (f64, u32)> = BTreeMap::new();

    for reading in readings {
        let slot = span.slot_start(reading.recorded_at);
        let (sum, count) = groups.entry((reading.label, slot)).or_insert((0.0, 0));
        *sum += reading.value;
        *count += 1;
    }

    groups
        .into_iter()
        .map(|((label, time_slot), (sum, count))| SlotRecord {
            label,
            time_slot,
            value: match label.reduction() {
                Reduction::Mean => sum / f64::from(count),
                Reduction::Sum => sum,
            },
        })
        .collect()
}
