//! Loading sample sets from device exports and writing them back out.
//!
//! # Example
//!
//! ```no_run
//! use bp_report::io::SampleLoader;
//! use std::path::PathBuf;
//!
//! let report = SampleLoader::new()
//!     .load_files(&[PathBuf::from("M7-1-2025-06-01.csv")])
//!     .expect("no usable samples");
//! println!("Loaded {} samples", report.sample_set.len());
//! ```

pub mod loaders;
pub mod writers;


pub use loaders::{LoadReport, SampleLoader, SkippedSource};
pub use writers::{samples_to_dataframe, write_samples_csv, TIMESTAMP_FORMAT};
