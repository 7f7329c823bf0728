//! Core definitions (error model and result helpers), relied upon by all boolsearch-* crates.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;
