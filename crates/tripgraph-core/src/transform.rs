use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use tracing::info;

use crate::error::{LoaderError, Result};
use crate::zones::ZoneFilter;

pub const PICKUP_DATETIME: &str = "tpep_pickup_datetime";
pub const DROPOFF_DATETIME: &str = "tpep_dropoff_datetime";
pub const PICKUP_ZONE: &str = "PULocationID";
pub const DROPOFF_ZONE: &str = "DOLocationID";
pub const TRIP_DISTANCE: &str = "trip_distance";
pub const FARE_AMOUNT: &str = "fare_amount";

pub const TRIP_COLUMNS: [&str; 6] = [
    PICKUP_DATETIME,
    DROPOFF_DATETIME,
    PICKUP_ZONE,
    DROPOFF_ZONE,
    TRIP_DISTANCE,
    FARE_AMOUNT,
];

pub const MIN_TRIP_DISTANCE: f64 = 0.1;
pub const MIN_FARE_AMOUNT: f64 = 2.5;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One retained trip, ready to be written as a `TRIP` relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub pickup_zone: i64,
    pub dropoff_zone: i64,
    pub distance: f64,
    pub fare: f64,
    pub pickup_at: NaiveDateTime,
    pub dropoff_at: NaiveDateTime,
}

impl TripRecord {
    pub fn endpoints(&self) -> [i64; 2] {
        [self.pickup_zone, self.dropoff_zone]
    }
}

/// Projects the frame down to the six trip columns, in canonical order.
pub fn select_trip_columns(frame: &DataFrame) -> Result<DataFrame> {
    let missing: Vec<String> = TRIP_COLUMNS
        .iter()
        .filter(|name| frame.get_column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(LoaderError::Schema { missing });
    }

    Ok(frame.select(TRIP_COLUMNS)?)
}

/// Keeps trips that start and end inside `zones` with a plausible distance and fare,
/// then normalises their timestamps. Input order is preserved.
pub fn transform_trips(frame: &DataFrame, zones: &ZoneFilter) -> Result<Vec<TripRecord>> {
    let trips = select_trip_columns(frame)?;

    let pickup_zone_column = integer_column(&trips, PICKUP_ZONE)?;
    let dropoff_zone_column = integer_column(&trips, DROPOFF_ZONE)?;
    let distance_column = numeric_column(&trips, TRIP_DISTANCE)?;
    let fare_column = numeric_column(&trips, FARE_AMOUNT)?;

    let pickup_zones = pickup_zone_column.i64()?;
    let dropoff_zones = dropoff_zone_column.i64()?;
    let distances = distance_column.f64()?;
    let fares = fare_column.f64()?;

    let pickup_at = TimestampColumn::new(trips.column(PICKUP_DATETIME)?, PICKUP_DATETIME)?;
    let dropoff_at = TimestampColumn::new(trips.column(DROPOFF_DATETIME)?, DROPOFF_DATETIME)?;

    let mut records = Vec::new();
    for idx in 0..trips.height() {
        let (Some(pickup), Some(dropoff), Some(distance), Some(fare)) = (
            pickup_zones.get(idx),
            dropoff_zones.get(idx),
            distances.get(idx),
            fares.get(idx),
        ) else {
            continue;
        };

        // NaN distance or fare fails both comparisons.
        let retained = zones.contains(pickup)
            && zones.contains(dropoff)
            && distance > MIN_TRIP_DISTANCE
            && fare > MIN_FARE_AMOUNT;
        if !retained {
            continue;
        }

        records.push(TripRecord {
            pickup_zone: pickup,
            dropoff_zone: dropoff,
            distance,
            fare,
            pickup_at: pickup_at.value(idx)?,
            dropoff_at: dropoff_at.value(idx)?,
        });
    }

    info!(
        rows = trips.height(),
        retained = records.len(),
        "filtered trips to zone scope"
    );
    Ok(records)
}

fn integer_column(trips: &DataFrame, name: &'static str) -> Result<Column> {
    let column = trips.column(name)?;
    if !column.dtype().is_integer() {
        return Err(LoaderError::ColumnType {
            column: name,
            expected: "integer",
            found: column.dtype().to_string(),
        });
    }
    Ok(column.strict_cast(&DataType::Int64)?)
}

fn numeric_column(trips: &DataFrame, name: &'static str) -> Result<Column> {
    let column = trips.column(name)?;
    let dtype = column.dtype();
    if !(dtype.is_integer() || dtype.is_float()) {
        return Err(LoaderError::ColumnType {
            column: name,
            expected: "numeric",
            found: dtype.to_string(),
        });
    }
    Ok(column.strict_cast(&DataType::Float64)?)
}

/// Distinct endpoint zone ids across `trips`, in first-seen order.
pub fn distinct_zones(trips: &[TripRecord]) -> Vec<i64> {
    let mut seen = HashSet::new();
    trips
        .iter()
        .flat_map(TripRecord::endpoints)
        .filter(|zone| seen.insert(*zone))
        .collect()
}

enum TimestampValues {
    Text(StringChunked),
    Native(Int64Chunked, TimeUnit),
    ZoneAware(String),
    Unsupported(DataType),
}

struct TimestampColumn {
    name: &'static str,
    values: TimestampValues,
}

impl TimestampColumn {
    fn new(column: &Column, name: &'static str) -> Result<Self> {
        let values = match column.dtype() {
            DataType::String => TimestampValues::Text(column.str()?.clone()),
            DataType::Datetime(_, Some(tz)) => TimestampValues::ZoneAware(format!("{tz:?}")),
            DataType::Datetime(unit, None) => {
                let unit = *unit;
                let physical = column.cast(&DataType::Int64)?;
                TimestampValues::Native(physical.i64()?.clone(), unit)
            }
            other => TimestampValues::Unsupported(other.clone()),
        };
        Ok(Self { name, values })
    }

    fn value(&self, row: usize) -> Result<NaiveDateTime> {
        let parse_error = |message: String| LoaderError::Parse {
            column: self.name,
            row,
            message,
        };

        match &self.values {
            TimestampValues::Text(values) => {
                let raw = values
                    .get(row)
                    .ok_or_else(|| parse_error("missing timestamp".to_string()))?;
                NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|err| {
                    parse_error(format!("{raw:?} does not match {TIMESTAMP_FORMAT}: {err}"))
                })
            }
            TimestampValues::Native(values, unit) => {
                let raw = values
                    .get(row)
                    .ok_or_else(|| parse_error("missing timestamp".to_string()))?;
                let parsed = match unit {
                    TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(raw)),
                    TimeUnit::Microseconds => DateTime::from_timestamp_micros(raw),
                    TimeUnit::Milliseconds => DateTime::from_timestamp_millis(raw),
                };
                parsed
                    .map(|value| value.naive_utc())
                    .ok_or_else(|| parse_error(format!("timestamp {raw} ({unit:?}) out of range")))
            }
            TimestampValues::ZoneAware(tz) => Err(parse_error(format!(
                "expected a naive datetime column, found one in time zone {tz}"
            ))),
            TimestampValues::Unsupported(dtype) => Err(parse_error(format!(
                "expected a string or datetime column, found {dtype}"
            ))),
        }
    }
}
