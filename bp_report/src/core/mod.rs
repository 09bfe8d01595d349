//! Core domain types for measurement samples.
//!
//! - [`domain`]: `Sample`, `SampleSet` and metric naming
//! - [`period`]: the fixed day segments and the hour-of-day classifier
//! - [`date_span`]: dense calendar ranges over the sampled days

pub mod date_span;
pub mod domain;
pub mod period;

pub use date_span::DateSpan;
pub use domain::{MetricValues, Sample, SampleSet, METRIC_COUNT};
pub use period::Period;
