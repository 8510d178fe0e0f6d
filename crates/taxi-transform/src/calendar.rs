//! The shared time dimension.
//!
//! Every instant column (pickup, then dropoff) feeds one dimension keyed by
//! the instant itself. Calendar attributes are computed once per distinct
//! instant and live on the dimension; the fact table reaches them through
//! its datetime keys.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use polars::prelude::*;
use taxi_common::{datetime_millis, millis_to_naive};
use taxi_model::TimeDimensionSpec;

use crate::error::DimensionError;
use crate::keys::surrogate_keys;

const MILLIS_PER_DAY: i64 = 86_400_000;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Calendar attributes of one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarAttributes {
    pub hour: u32,
    pub day: u32,
    /// 0 = Monday.
    pub weekday: u32,
    pub day_name: &'static str,
    pub year: i32,
    pub month: u32,
    pub month_name: &'static str,
    pub is_weekend: bool,
    pub quarter: u32,
}

impl CalendarAttributes {
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let weekday = dt.weekday().num_days_from_monday();
        let month = dt.month();
        Self {
            hour: dt.hour(),
            day: dt.day(),
            weekday,
            day_name: DAY_NAMES[weekday as usize],
            year: dt.year(),
            month,
            month_name: MONTH_NAMES[(month - 1) as usize],
            is_weekend: matches!(dt.weekday(), Weekday::Sat | Weekday::Sun),
            quarter: (month - 1) / 3 + 1,
        }
    }
}

/// Distinct non-null instants across `sources`, in union order.
fn collect_instants(raw: &DataFrame, spec: &TimeDimensionSpec) -> Result<Vec<i64>, DimensionError> {
    let mut seen = HashSet::new();
    let mut instants = Vec::new();

    for source in &spec.sources {
        let column = raw
            .column(&source.source)
            .map_err(|_| DimensionError::MissingColumn {
                dimension: spec.name.clone(),
                column: source.source.clone(),
            })?;
        let millis = datetime_millis(column).ok_or_else(|| DimensionError::NotTimestamp {
            dimension: spec.name.clone(),
            column: source.source.clone(),
            dtype: column.dtype().to_string(),
        })?;
        for instant in millis.into_iter().flatten() {
            if seen.insert(instant) {
                instants.push(instant);
            }
        }
    }

    Ok(instants)
}

/// Build the time dimension from the instant columns of the raw table.
pub fn build_time_dimension(
    raw: &DataFrame,
    spec: &TimeDimensionSpec,
) -> Result<DataFrame, DimensionError> {
    let instants = collect_instants(raw, spec)?;
    let attributes: Vec<Option<CalendarAttributes>> = instants
        .iter()
        .map(|millis| millis_to_naive(*millis).map(CalendarAttributes::from_datetime))
        .collect();

    let field = |f: fn(&CalendarAttributes) -> i64| -> Vec<Option<i64>> {
        attributes.iter().map(|a| a.as_ref().map(f)).collect()
    };
    let small = |name: &str, values: Vec<Option<i64>>| -> PolarsResult<Column> {
        Ok(Series::new(name.into(), values)
            .cast(&DataType::Int8)?
            .into_column())
    };

    let datetime = Series::new(spec.instant_column.as_str().into(), instants.clone())
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    let date = Series::new(
        "date".into(),
        instants
            .iter()
            .map(|millis| millis.div_euclid(MILLIS_PER_DAY) as i32)
            .collect::<Vec<i32>>(),
    )
    .cast(&DataType::Date)?;
    let day_names: Vec<Option<&str>> = attributes.iter().map(|a| a.map(|a| a.day_name)).collect();
    let month_names: Vec<Option<&str>> =
        attributes.iter().map(|a| a.map(|a| a.month_name)).collect();
    let years: Vec<Option<i32>> = attributes.iter().map(|a| a.map(|a| a.year)).collect();
    let weekends: Vec<Option<bool>> = attributes.iter().map(|a| a.map(|a| a.is_weekend)).collect();

    let columns = vec![
        surrogate_keys(&spec.key_column, instants.len()).into_column(),
        datetime.into_column(),
        small("hour", field(|a| i64::from(a.hour)))?,
        date.into_column(),
        small("day", field(|a| i64::from(a.day)))?,
        small("weekday", field(|a| i64::from(a.weekday)))?,
        Series::new("day_name".into(), day_names).into_column(),
        Series::new("year".into(), years).into_column(),
        small("month", field(|a| i64::from(a.month)))?,
        Series::new("month_name".into(), month_names).into_column(),
        Series::new("is_weekend".into(), weekends).into_column(),
        small("quarter", field(|a| i64::from(a.quarter)))?,
    ];

    let dimension = DataFrame::new(columns)?;
    tracing::debug!(dimension = %spec.name, rows = dimension.height(), "Built time dimension");
    Ok(dimension)
}
