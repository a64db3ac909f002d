pub mod aggregators;
pub mod error;
pub mod join;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod source;
pub mod stats;
