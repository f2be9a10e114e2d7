//! Data types shared across the extraction pipeline and evaluation.

pub mod candidate;
pub mod config;
pub mod evaluation;
pub mod job;
pub mod provenance;
pub mod segment;
pub mod validation;
