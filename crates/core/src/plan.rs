//! Write planning for marketplace updates.
//!
//! The clients fetch remote state; the functions here decide whether a
//! write is needed at all. Repeated sync cycles with unchanged stock must
//! produce zero remote mutations, so every plan is computed against the
//! current remote values first.

use serde::Serialize;

use crate::types::ListingStatus;

/// One listing variation, distilled to what stock planning needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variation {
    pub id: i64,
    pub available_quantity: i64,
    /// Value of the variation's `SELLER_SKU` attribute, when present.
    pub seller_sku: Option<String>,
}

/// Payload entry for a combined variation update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariationUpdate {
    pub id: i64,
    pub available_quantity: i64,
}

/// A planned listing write: the full variation list (carrying unmatched
/// variations unchanged - omitting them would truncate them remotely),
/// plus an optional paused-to-active transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockUpdate {
    pub variations: Vec<VariationUpdate>,
    pub activate: bool,
}

/// Decide whether a listing needs a stock write.
///
/// Returns `None` when no variation carries the SKU, or when the matched
/// quantity already equals `new_stock` and the listing needs no
/// reactivation (the write-skip rule). Otherwise returns the combined
/// update with every matched variation's quantity replaced.
#[must_use]
pub fn plan_update(
    status: &ListingStatus,
    variations: &[Variation],
    sku: &str,
    new_stock: i64,
) -> Option<StockUpdate> {
    let matched: Vec<&Variation> = variations
        .iter()
        .filter(|v| v.seller_sku.as_deref() == Some(sku))
        .collect();

    if matched.is_empty() {
        return None;
    }

    let quantity_changed = matched.iter().any(|v| v.available_quantity != new_stock);
    let activate = status.needs_reactivation() && new_stock > 0;

    if !quantity_changed && !activate {
        return None;
    }

    let variations = variations
        .iter()
        .map(|v| VariationUpdate {
            id: v.id,
            available_quantity: if v.seller_sku.as_deref() == Some(sku) {
                new_stock
            } else {
                v.available_quantity
            },
        })
        .collect();

    Some(StockUpdate {
        variations,
        activate,
    })
}

/// Express-shipping ("Flex") toggle decision for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexAction {
    /// Issue the activation call.
    Enable,
    /// Issue the removal call.
    Disable,
    /// Remote state already matches, or the stock value is a data anomaly.
    Skip,
}

/// Decide the flex transition from current remote state and stock.
///
/// Positive stock wants the flag enabled, zero stock wants it disabled,
/// and negative stock is an explicit no-action sentinel - an anomaly that
/// is never propagated.
#[must_use]
pub fn flex_transition(currently_enabled: bool, stock: i64) -> FlexAction {
    if stock < 0 {
        return FlexAction::Skip;
    }

    match (currently_enabled, stock > 0) {
        (false, true) => FlexAction::Enable,
        (true, false) => FlexAction::Disable,
        _ => FlexAction::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variations() -> Vec<Variation> {
        vec![
            Variation {
                id: 1,
                available_quantity: 4,
                seller_sku: Some("FX797E73".to_string()),
            },
            Variation {
                id: 2,
                available_quantity: 9,
                seller_sku: Some("OTHER".to_string()),
            },
            Variation {
                id: 3,
                available_quantity: 0,
                seller_sku: None,
            },
        ]
    }

    #[test]
    fn test_write_skip_when_quantity_unchanged() {
        let plan = plan_update(&ListingStatus::Active, &variations(), "FX797E73", 4);
        assert_eq!(plan, None);
    }

    #[test]
    fn test_update_carries_full_variation_list() {
        let plan = plan_update(&ListingStatus::Active, &variations(), "FX797E73", 7)
            .expect("quantity changed, write expected");
        assert!(!plan.activate);
        assert_eq!(
            plan.variations,
            vec![
                VariationUpdate {
                    id: 1,
                    available_quantity: 7
                },
                VariationUpdate {
                    id: 2,
                    available_quantity: 9
                },
                VariationUpdate {
                    id: 3,
                    available_quantity: 0
                },
            ]
        );
    }

    #[test]
    fn test_paused_listing_reactivated_even_when_quantity_matches() {
        let plan = plan_update(&ListingStatus::Paused, &variations(), "FX797E73", 4)
            .expect("paused listing with positive stock must reactivate");
        assert!(plan.activate);
        // Quantities are untouched in that case
        assert_eq!(plan.variations[0].available_quantity, 4);
    }

    #[test]
    fn test_paused_listing_stays_paused_at_zero_stock() {
        let mut vars = variations();
        vars[0].available_quantity = 0;
        let plan = plan_update(&ListingStatus::Paused, &vars, "FX797E73", 0);
        assert_eq!(plan, None);
    }

    #[test]
    fn test_no_matching_sku_is_a_skip() {
        let plan = plan_update(&ListingStatus::Active, &variations(), "MISSING", 7);
        assert_eq!(plan, None);
    }

    #[test]
    fn test_duplicate_sku_variations_all_replaced() {
        let mut vars = variations();
        vars[1].seller_sku = Some("FX797E73".to_string());
        let plan = plan_update(&ListingStatus::Active, &vars, "FX797E73", 7).unwrap();
        assert_eq!(plan.variations[0].available_quantity, 7);
        assert_eq!(plan.variations[1].available_quantity, 7);
        assert_eq!(plan.variations[2].available_quantity, 0);
    }

    #[test]
    fn test_flex_transitions() {
        assert_eq!(flex_transition(false, 5), FlexAction::Enable);
        assert_eq!(flex_transition(true, 5), FlexAction::Skip);
        assert_eq!(flex_transition(true, 0), FlexAction::Disable);
        assert_eq!(flex_transition(false, 0), FlexAction::Skip);
    }

    #[test]
    fn test_negative_stock_never_toggles() {
        assert_eq!(flex_transition(true, -1), FlexAction::Skip);
        assert_eq!(flex_transition(false, -1), FlexAction::Skip);
    }
}
