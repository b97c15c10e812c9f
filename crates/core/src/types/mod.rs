//! Core types for Lanch Sync.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod barcode;
pub mod id;
pub mod listing;

pub use barcode::is_valid_barcode;
pub use id::*;
pub use listing::{ListingPartition, ListingStatus};
