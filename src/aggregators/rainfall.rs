//! Rainfall aggregation: key each reading, clamp negatives, sum, round once.

use rayon::prelude::*;
use tracing::debug;

use super::Aggregate;
use super::utility::{round_to, sum_per_key};
use crate::error::{Result, Source};
use crate::normalize::coerce_number;
use crate::records::{CompositeKey, RainfallRecord};

/// Decimal places kept on rainfall totals.
pub const RAINFALL_DECIMALS: usize = 1;

/// Keys a reading as `region-year-month` and parses its millimetres.
///
/// Negative readings contribute `0.0`, as does a reading with no digit.
pub fn derive_key_and_value(record: &RainfallRecord) -> Result<(CompositeKey, f64)> {
    let key = CompositeKey::new(&record.region, &record.year_month);
    let mm = coerce_number(&record.millimeters, Source::Rainfall, record.line)?;
    Ok((key, clamp_negative(mm)))
}

pub fn clamp_negative(mm: f64) -> f64 {
    if mm < 0.0 { 0.0 } else { mm }
}

/// Rounds a summed total. Must run after summation, never per reading.
pub fn round_value(key: CompositeKey, value: f64) -> (CompositeKey, f64) {
    (key, round_to(value, RAINFALL_DECIMALS))
}

/// Builds the per-key rainfall totals, rounded to [`RAINFALL_DECIMALS`].
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn aggregate_rainfall(records: Vec<RainfallRecord>) -> Result<Aggregate> {
    let pairs: Vec<(CompositeKey, f64)> = records
        .par_iter()
        .map(derive_key_and_value)
        .collect::<Result<_>>()?;

    let totals: Aggregate = sum_per_key(pairs)
        .into_iter()
        .map(|(key, value)| round_value(key, value))
        .collect();

    debug!(keys = totals.len(), "Rainfall totals computed");
    Ok(totals)
}
