//! Collaborator and storage seams.
//!
//! Applications implement these to plug in embedding models, text
//! generators and persistence for evaluation jobs.

pub mod collaborators;
pub mod embedder;
pub mod generator;
pub mod store;
