//! Per-source aggregation.
//!
//! Each source is reduced to an [`Aggregate`]: one summed `f64` per
//! [`CompositeKey`](crate::records::CompositeKey). Cases and rainfall are
//! aggregated independently and only meet again in [`crate::join`].

pub mod cases;
pub mod rainfall;
pub mod utility;

use std::collections::HashMap;

use crate::records::CompositeKey;

/// Summed metric per composite key.
pub type Aggregate = HashMap<CompositeKey, f64>;
