//! NetCDF serialization of combined station datasets
//!
//! `schema` holds the static mapping from raw portal columns to canonical
//! output variables; `writer` performs the per-column normalization and the
//! actual container write.

pub mod schema;
pub mod writer;

pub use schema::{Conversion, VariableSpec};
pub use writer::{NetcdfWriter, WriteStats};
