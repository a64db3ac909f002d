//! Co-grouping of the two aggregates and strict inner-join reconciliation.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::aggregators::Aggregate;
use crate::error::Result;
use crate::records::{CompositeKey, JoinedRecord};

/// Values seen for one key on each side. Each list holds at most one total.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CoGrouped {
    pub cases: Vec<f64>,
    pub rainfall: Vec<f64>,
}

impl CoGrouped {
    /// A key is complete only when both sources contributed.
    pub fn is_complete(&self) -> bool {
        !self.cases.is_empty() && !self.rainfall.is_empty()
    }
}

/// Result of joining the aggregates: surviving rows plus how many keys were dropped.
#[derive(Debug, Default)]
pub struct JoinOutcome {
    pub rows: Vec<JoinedRecord>,
    pub dropped_keys: usize,
}

/// Full outer grouping of both aggregates by key, in ascending key order.
pub fn co_group(cases: &Aggregate, rainfall: &Aggregate) -> BTreeMap<CompositeKey, CoGrouped> {
    let mut grouped: BTreeMap<CompositeKey, CoGrouped> = BTreeMap::new();

    for (key, total) in cases {
        grouped.entry(key.clone()).or_default().cases.push(*total);
    }
    for (key, total) in rainfall {
        grouped.entry(key.clone()).or_default().rainfall.push(*total);
    }

    grouped
}

/// Splits a complete key back into its parts and takes each side's total.
///
/// Callers filter with [`CoGrouped::is_complete`] first; both sides must hold a value.
///
/// # Errors
///
/// Returns [`crate::error::PipelineError::MalformedKey`] if the key does not
/// split into exactly `region-year-month`.
pub fn flatten(key: &CompositeKey, grouped: &CoGrouped) -> Result<JoinedRecord> {
    let (region, year, month) = key.split_parts()?;

    Ok(JoinedRecord {
        region: region.to_string(),
        year: year.to_string(),
        month: month.to_string(),
        case_total: grouped.cases[0],
        rainfall_total: grouped.rainfall[0],
    })
}

/// Inner-joins the case and rainfall aggregates.
///
/// Keys present on only one side are dropped. Rows come out in ascending key order.
#[tracing::instrument(skip_all, fields(case_keys = cases.len(), rainfall_keys = rainfall.len()))]
pub fn reconcile(cases: &Aggregate, rainfall: &Aggregate) -> Result<JoinOutcome> {
    let grouped = co_group(cases, rainfall);
    let mut outcome = JoinOutcome::default();

    for (key, values) in &grouped {
        if !values.is_complete() {
            debug!(
                key = %key,
                cases = values.cases.len(),
                rainfall = values.rainfall.len(),
                "Dropping incomplete key"
            );
            outcome.dropped_keys += 1;
            continue;
        }
        outcome.rows.push(flatten(key, values)?);
    }

    info!(
        joined = outcome.rows.len(),
        dropped = outcome.dropped_keys,
        "Aggregates reconciled"
    );
    Ok(outcome)
}
