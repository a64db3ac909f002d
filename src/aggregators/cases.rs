//! Reported-case aggregation: group by region, expand to keyed counts, sum.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use super::Aggregate;
use super::utility::sum_per_key;
use crate::error::{Result, Source};
use crate::normalize::coerce_number;
use crate::records::{CaseRecord, CompositeKey};

/// Pairs a record with its region, the grouping key.
pub fn key_by_region(record: CaseRecord) -> (String, CaseRecord) {
    (record.region.clone(), record)
}

/// Collects records sharing a region into one group. Group order is unspecified.
pub fn group_by_region<I>(records: I) -> HashMap<String, Vec<CaseRecord>>
where
    I: IntoIterator<Item = CaseRecord>,
{
    let mut groups: HashMap<String, Vec<CaseRecord>> = HashMap::new();
    for (region, record) in records.into_iter().map(key_by_region) {
        groups.entry(region).or_default().push(record);
    }
    groups
}

/// Emits one `(region-year-month, count)` pair per record in a region group.
///
/// Counts without any digit (`"-"`, `""`) become `0.0`; counts with a digit
/// that fail to parse yield an error item.
pub fn expand_to_keyed_counts<'a>(
    region: &'a str,
    records: &'a [CaseRecord],
) -> impl Iterator<Item = Result<(CompositeKey, f64)>> + 'a {
    records.iter().map(move |record| {
        let count = coerce_number(&record.case_count, Source::Cases, record.line)?;
        Ok((CompositeKey::new(region, &record.year_month), count))
    })
}

/// Builds the per-key case totals.
///
/// # Errors
///
/// Fails on the first malformed case count; no partial aggregate is returned.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn aggregate_cases(records: Vec<CaseRecord>) -> Result<Aggregate> {
    let groups = group_by_region(records);
    debug!(regions = groups.len(), "Case records grouped by region");

    let expanded: Vec<Vec<(CompositeKey, f64)>> = groups
        .par_iter()
        .map(|(region, group)| {
            expand_to_keyed_counts(region, group).collect::<Result<Vec<_>>>()
        })
        .collect::<Result<_>>()?;

    let totals = sum_per_key(expanded.into_iter().flatten());
    debug!(keys = totals.len(), "Case totals computed");
    Ok(totals)
}
