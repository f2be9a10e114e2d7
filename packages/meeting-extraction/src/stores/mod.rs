//! Job store implementations.

pub mod memory;

pub use memory::MemoryJobStore;
