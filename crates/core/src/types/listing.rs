//! Listing classification results.

use serde::{Deserialize, Serialize};

use super::id::ListingId;

/// Marketplace listings for one SKU, partitioned by who runs logistics.
///
/// Derived once per SKU per sync cycle and never persisted. The two
/// sequences are disjoint and preserve the order listings were classified
/// in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingPartition {
    /// Listings where the platform manages logistics (`fulfillment`).
    pub fulfilled: Vec<ListingId>,
    /// Listings where the seller manages logistics.
    pub self_managed: Vec<ListingId>,
}

impl ListingPartition {
    /// Iterate over every listing in both partitions, fulfilled first.
    pub fn iter(&self) -> impl Iterator<Item = &ListingId> {
        self.fulfilled.iter().chain(self.self_managed.iter())
    }

    /// Total number of classified listings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fulfilled.len() + self.self_managed.len()
    }

    /// True when no listing was classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fulfilled.is_empty() && self.self_managed.is_empty()
    }
}

/// Marketplace listing status, as reported by the item detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Paused,
    Closed,
    /// Any status this integration does not act on.
    #[serde(other)]
    Other,
}

impl ListingStatus {
    /// Whether a positive-stock update should flip the listing back to
    /// active.
    #[must_use]
    pub fn needs_reactivation(&self) -> bool {
        matches!(self, Self::Paused)
    }
}
