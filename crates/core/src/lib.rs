//! Lanch Sync Core - Shared types and decision logic.
//!
//! This crate provides the pure parts of the inventory sync pipeline,
//! shared by the service binary and its tests:
//! - [`types`] - Newtype wrappers and value records (SKUs, listing IDs,
//!   barcodes, listing partitions)
//! - [`feed`] - Warehouse feed validation and normalization
//! - [`plan`] - Write planning for marketplace stock and express-shipping
//!   updates
//!
//! # Architecture
//!
//! The core crate contains no I/O - no HTTP clients, no token handling.
//! Every function here is a pure transformation over already-fetched data,
//! which is what keeps the sync decisions unit-testable.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod feed;
pub mod plan;
pub mod types;

pub use types::*;
