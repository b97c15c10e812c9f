//! EAN-13 / UPC-12 barcode validation.
//!
//! Warehouse product codes are expected to be retail barcodes. A 13-digit
//! code is checked directly as EAN-13; a 12-digit UPC is promoted to
//! EAN-13 by zero-prefixing before the checksum runs. Everything else is
//! invalid.

/// Check whether a product code is a structurally valid EAN-13 barcode,
/// or a 12-digit UPC promotable to one.
///
/// Fails closed: any non-digit character, wrong length, or checksum
/// mismatch yields `false`. Never panics.
///
/// # Example
///
/// ```rust
/// use lanch_sync_core::types::barcode::is_valid_barcode;
///
/// assert!(is_valid_barcode("4006381333931"));
/// assert!(!is_valid_barcode("4006381333932"));
/// ```
#[must_use]
pub fn is_valid_barcode(code: &str) -> bool {
    match code.len() {
        13 => ean13_checksum_ok(code),
        // UPC-A extends to EAN-13 with a leading zero
        12 => ean13_checksum_ok(&format!("0{code}")),
        _ => false,
    }
}

/// EAN-13 checksum: odd positions (1-indexed) weigh 1, even positions
/// weigh 3; the weighted digit sum must be a multiple of 10.
fn ean13_checksum_ok(code: &str) -> bool {
    if code.len() != 13 {
        return false;
    }

    let mut sum: u32 = 0;
    for (i, ch) in code.chars().enumerate() {
        let Some(digit) = ch.to_digit(10) else {
            return false;
        };
        sum += if i % 2 == 0 { digit } else { digit * 3 };
    }

    sum % 10 == 0
}
