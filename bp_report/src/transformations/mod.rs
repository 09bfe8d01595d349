//! Sample cleaning and filtering.
//!
//! - [`cleaning`]: coerce raw cells to typed samples, drop malformed rows,
//!   remove duplicates
//! - [`filtering`]: restrict to an inclusive time window and order by time
//!
//! # Example
//!
//! ```no_run
//! use bp_report::transformations::{filter_and_sort, remove_duplicates, TimeRange};
//! # fn example(samples: Vec<bp_report::core::Sample>) {
//! let unique = remove_duplicates(samples);
//! let ordered = filter_and_sort(unique, &TimeRange::unbounded());
//! # }
//! ```

pub mod cleaning;
pub mod filtering;

pub use cleaning::{clean_table, parse_metric, parse_timestamp, remove_duplicates, CleanedTable};
pub use filtering::{filter_and_sort, parse_bound, BoundKind, TimeRange};
