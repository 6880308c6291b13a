//! Domain data models for the measurements service.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

// ---

/// The physical quantity kind a reading measures.
///
/// Wire and storage both use the short codes (`temp`, `rain`, `hum`) the
/// datalogger fleet already emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Label {
    // ---
    #[serde(rename = "temp")]
    Temperature,
    #[serde(rename = "rain")]
    Rainfall,
    #[serde(rename = "hum")]
    Humidity,
}

/// How values sharing a time slot are reduced during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Mean,
    Sum,
}

impl Label {
    /// Parse a wire/storage code.
    pub fn from_code(code: &str) -> Option<Label> {
        // ---
        match code {
            "temp" => Some(Label::Temperature),
            "rain" => Some(Label::Rainfall),
            "hum" => Some(Label::Humidity),
            _ => None,
        }
    }

    /// Wire/storage code for this label.
    pub fn code(self) -> &'static str {
        // ---
        match self {
            Label::Temperature => "temp",
            Label::Rainfall => "rain",
            Label::Humidity => "hum",
        }
    }

    /// Human-readable name used in validation messages.
    pub fn name(self) -> &'static str {
        // ---
        match self {
            Label::Temperature => "Temperature",
            Label::Rainfall => "Rainfall",
            Label::Humidity => "Humidity",
        }
    }

    /// Inclusive physical range a value must fall within at ingestion.
    pub fn range(self) -> (f64, f64) {
        // ---
        match self {
            Label::Temperature => (-20.0, 40.0),
            Label::Rainfall => (0.0, 2.0),
            Label::Humidity => (20.0, 100.0),
        }
    }

    /// Reduction applied per time slot: mean for point-in-time quantities,
    /// sum for accumulating ones. New sensor types pick a strategy here.
    pub fn reduction(self) -> Reduction {
        // ---
        match self {
            Label::Temperature | Label::Humidity => Reduction::Mean,
            Label::Rainfall => Reduction::Sum,
        }
    }
}

// The `label` column is plain TEXT, so the sqlx mapping delegates to `&str`
// on both sides rather than declaring a named Postgres type.
impl sqlx::Type<sqlx::Postgres> for Label {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for Label {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        // ---
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.code(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Label {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        // ---
        let code = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Label::from_code(code).ok_or_else(|| format!("unknown label code {code:?}").into())
    }
}

// ---

/// Geolocation attached to each reading.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct Location {
    // ---
    pub lat: f64,
    pub lng: f64,
}

/// One immutable observation of a single physical quantity at a point in
/// time from one device. Insert-only: nothing updates or deletes these.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Reading {
    // ---
    pub label: Label,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
    pub device_id: Uuid,
    #[sqlx(flatten)]
    pub location: Location,
}

// ---

/// Raw fetch response record.
#[derive(Debug, PartialEq, Serialize)]
pub struct RawRecord {
    // ---
    pub label: Label,
    pub recorded_at: DateTime<Utc>,
    pub value: f64,
}

impl From<Reading> for RawRecord {
    fn from(reading: Reading) -> Self {
        // ---
        RawRecord {
            label: reading.label,
            recorded_at: reading.recorded_at,
            value: reading.value,
        }
    }
}

/// Aggregated fetch response record: one reduced value per calendar-aligned
/// time slot.
#[derive(Debug, PartialEq, Serialize)]
pub struct SlotRecord {
    // ---
    pub label: Label,
    pub time_slot: DateTime<Utc>,
    pub value: f64,
}

// ---

/// Parse an ISO-8601 timestamp: RFC 3339, or a naive datetime taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
