//! Readers for device export files.
//!
//! - [`csv_parser`]: read a CSV export into a [`RawTable`] of untyped cells

pub mod csv_parser;

#[cfg(test)]
mod csv_parser_tests;

pub use csv_parser::{read_raw_table, RawRow, RawTable, REQUIRED_COLUMNS};
