//! Command implementations for boolsearch-cmd

pub mod build;
pub mod inspect;
pub mod query;
