//! credtrack-core: Credit aggregation and grading engine.
//!
//! This crate defines the record model, the store trait, and the pipeline
//! that turns a student's credit-bearing records into a graded summary,
//! a term-by-term breakdown, or a batch of summaries.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod grading;
pub mod model;
pub mod reader;
pub mod report;
pub mod results;
pub mod terms;
pub mod traits;
