//! Persistence implementations for the application encryption library
//!
//! This module provides various implementations for storing encrypted keys and data.
//! It includes:
//!
//! - In-memory metastore for testing
//! - Function adapters for custom persistence backends

mod functions;
mod memory;

pub use functions::{LoaderFn, StorerFn};
pub use memory::MemoryMetastore;
