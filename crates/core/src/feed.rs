//! Warehouse inventory feed: wire types, validation, normalization.
//!
//! The Logi GraphQL API returns stock as a list of groups, each carrying a
//! one-element `producto` list (product attributes, Spanish field names)
//! and a one-element `total_stock` list. Two passes run over that payload:
//!
//! 1. [`StockFeed::validate`] - fail-closed structural check. Any missing
//!    or mistyped required field rejects the entire feed with a
//!    [`FeedError`] naming the violated constraint.
//! 2. [`StockFeed::normalize`] - resilient flattening into
//!    [`CanonicalProduct`] records. A single malformed product is skipped
//!    with a warning; recoverable field issues (bad date, non-numeric
//!    stock) degrade to absent/default values instead of aborting the
//!    batch.
//!
//! The policy difference is deliberate: the structural check guards the
//! fetch path, the lenient pass keeps one bad record from blocking a whole
//! sync cycle.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{Sku, barcode::is_valid_barcode};

/// The only accepted registration timestamp format.
pub const REGISTRATION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Structural feed violations. Fail-fast: any of these aborts the whole
/// feed, and the variant names the constraint that failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The response body is not a JSON object.
    #[error("feed is not a JSON object")]
    NotAnObject,

    /// A required envelope key is absent or has the wrong type.
    #[error("missing or mistyped key `{0}`")]
    MissingKey(&'static str),

    /// The stock list exists but carries no groups.
    #[error("feed contains no stock groups")]
    EmptyStock,

    /// A stock group's `producto`/`total_stock` sub-list is absent, empty,
    /// or not a list of the expected shape.
    #[error("stock group {index}: missing or mistyped `{field}` list")]
    BadGroup { index: usize, field: &'static str },

    /// A product is missing one of its five required fields.
    #[error("product `{code}`: missing field `{field}`")]
    MissingField { code: String, field: &'static str },

    /// A registration date that does not match [`REGISTRATION_FORMAT`].
    #[error("product `{code}`: invalid registration date `{value}`")]
    BadDate { code: String, value: String },

    /// A stock value that is absent, non-integer, or negative.
    #[error("product `{code}`: invalid or negative total stock")]
    BadStock { code: String },
}

/// Raw product attributes as they arrive on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    #[serde(rename = "pro_cod")]
    code: Option<String>,
    #[serde(rename = "pro_sku")]
    sku: Option<String>,
    #[serde(rename = "pro_desc")]
    description: Option<String>,
    #[serde(rename = "pro_ubicacion")]
    location: Option<String>,
    #[serde(rename = "pro_fech_registro")]
    registered_at: Option<String>,
}

impl RawProduct {
    /// Best-effort identifier for log and error messages.
    fn code_for_display(&self) -> String {
        self.code.clone().unwrap_or_else(|| "<unknown>".to_string())
    }
}

/// One stock group: product attributes plus a total stock counter.
#[derive(Debug, Clone, Deserialize)]
pub struct StockGroup {
    #[serde(default)]
    producto: Vec<RawProduct>,
    #[serde(default)]
    total_stock: Vec<RawTotalStock>,
}

/// The `total_stock` sub-object. Kept as a loose value so validation can
/// distinguish "absent" from "wrong type" from "negative".
#[derive(Debug, Clone, Deserialize)]
pub struct RawTotalStock {
    #[serde(default)]
    total_stock: Option<Value>,
}

/// The validated-shape inventory feed, ready for normalization.
#[derive(Debug, Clone)]
pub struct StockFeed {
    groups: Vec<StockGroup>,
}

/// Canonical per-SKU product record. Constructed fresh on every feed pull,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalProduct {
    /// Raw product code as received (leading zeros significant).
    pub code: String,
    /// Base-10 parse of the code; absent when the code is non-numeric.
    pub code_numeric: Option<i64>,
    /// True iff the code is a structurally valid EAN-13 (or promotable
    /// UPC-12). Forced false for non-numeric codes without consulting the
    /// barcode validator.
    pub code_valid: bool,
    pub sku: Sku,
    pub description: String,
    pub location: String,
    /// Parsed registration timestamp; absent when the source string does
    /// not match [`REGISTRATION_FORMAT`].
    pub registered_at: Option<NaiveDateTime>,
    /// Available quantity; 0 when the source field is absent or malformed.
    pub total_stock: u32,
}

impl StockFeed {
    /// Parse the response envelope `{"data": {"stock": [...]}}`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] when the envelope is not an object, lacks a
    /// `data.stock` list, or a stock group cannot be decoded.
    pub fn parse(value: &Value) -> Result<Self, FeedError> {
        let root = value.as_object().ok_or(FeedError::NotAnObject)?;
        let data = root
            .get("data")
            .and_then(Value::as_object)
            .ok_or(FeedError::MissingKey("data"))?;
        let stock = data
            .get("stock")
            .and_then(Value::as_array)
            .ok_or(FeedError::MissingKey("data.stock"))?;

        let mut groups = Vec::with_capacity(stock.len());
        for (index, group) in stock.iter().enumerate() {
            let group: StockGroup = serde_json::from_value(group.clone())
                .map_err(|_| FeedError::BadGroup {
                    index,
                    field: "producto",
                })?;
            groups.push(group);
        }

        Ok(Self { groups })
    }

    /// Fail-closed structural validation of every group and product.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint: empty feed, empty or
    /// mistyped sub-lists, a missing product field, an unparsable
    /// registration date, or a non-integer/negative stock value.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.groups.is_empty() {
            return Err(FeedError::EmptyStock);
        }

        for (index, group) in self.groups.iter().enumerate() {
            if group.producto.is_empty() {
                return Err(FeedError::BadGroup {
                    index,
                    field: "producto",
                });
            }
            if group.total_stock.is_empty() {
                return Err(FeedError::BadGroup {
                    index,
                    field: "total_stock",
                });
            }

            for product in &group.producto {
                let code = product.code_for_display();
                for (field, value) in [
                    ("pro_cod", &product.code),
                    ("pro_sku", &product.sku),
                    ("pro_desc", &product.description),
                    ("pro_ubicacion", &product.location),
                    ("pro_fech_registro", &product.registered_at),
                ] {
                    if value.is_none() {
                        return Err(FeedError::MissingField {
                            code: code.clone(),
                            field,
                        });
                    }
                }

                if let Some(date) = &product.registered_at
                    && NaiveDateTime::parse_from_str(date.trim(), REGISTRATION_FORMAT).is_err()
                {
                    return Err(FeedError::BadDate {
                        code,
                        value: date.clone(),
                    });
                }
            }

            let code = group.producto[0].code_for_display();
            let stock_ok = group
                .total_stock
                .first()
                .and_then(|t| t.total_stock.as_ref())
                .and_then(Value::as_i64)
                .is_some_and(|v| v >= 0);
            if !stock_ok {
                return Err(FeedError::BadStock { code });
            }
        }

        Ok(())
    }

    /// Flatten the feed into canonical product records.
    ///
    /// Preserves input order of stock groups and, within each group, of
    /// products. A product missing a required field is skipped with a
    /// warning; a bad date or stock value degrades to `None`/`0` and the
    /// product is still emitted.
    #[must_use]
    pub fn normalize(&self) -> Vec<CanonicalProduct> {
        let mut products = Vec::new();

        for group in &self.groups {
            // Every product in the group shares the group's counter.
            let total_stock = group
                .total_stock
                .first()
                .and_then(|t| t.total_stock.as_ref())
                .and_then(Value::as_i64)
                .filter(|v| *v >= 0)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0);

            for product in &group.producto {
                let (Some(code), Some(sku), Some(description), Some(location)) = (
                    &product.code,
                    &product.sku,
                    &product.description,
                    &product.location,
                ) else {
                    tracing::warn!(
                        code = %product.code_for_display(),
                        "skipping product with missing required fields"
                    );
                    continue;
                };

                let code = code.trim().to_string();
                let code_numeric = code.parse::<i64>().ok();
                // A non-numeric code never reaches the barcode validator.
                let code_valid = code_numeric.is_some() && is_valid_barcode(&code);

                let registered_at = product.registered_at.as_deref().and_then(|raw| {
                    let raw = raw.trim();
                    match NaiveDateTime::parse_from_str(raw, REGISTRATION_FORMAT) {
                        Ok(ts) => Some(ts),
                        Err(_) => {
                            tracing::warn!(
                                code = %code,
                                value = raw,
                                "unparsable registration date, leaving it unset"
                            );
                            None
                        }
                    }
                });

                products.push(CanonicalProduct {
                    code,
                    code_numeric,
                    code_valid,
                    sku: Sku::new(sku.trim()),
                    description: description.trim().to_string(),
                    location: location.trim().to_string(),
                    registered_at,
                    total_stock,
                });
            }
        }

        products
    }
}
