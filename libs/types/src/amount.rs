//! Token amount scaling
//!
//! The ledger moves integer base units. Mints carry a decimals count, and
//! clients display `raw / 10^decimals`. rust_decimal keeps the conversion
//! exact in both directions.

use rust_decimal::Decimal;

use crate::errors::TypeError;

/// Largest decimals count a mint may declare
pub const MAX_DECIMALS: u8 = 18;

/// Reject decimals counts that cannot be represented exactly.
pub fn validate_decimals(decimals: u8) -> Result<(), TypeError> {
    if decimals > MAX_DECIMALS {
        return Err(TypeError::InvalidDecimals {
            decimals,
            max: MAX_DECIMALS,
        });
    }
    Ok(())
}

/// Scale a raw base-unit amount by the mint's decimals.
pub fn ui_amount(raw: u64, decimals: u8) -> Result<Decimal, TypeError> {
    validate_decimals(decimals)?;
    let mut value = Decimal::from(raw);
    value
        .set_scale(u32::from(decimals))
        .map_err(|_| TypeError::InvalidDecimals {
            decimals,
            max: MAX_DECIMALS,
        })?;
    Ok(value)
}

/// Convert a UI amount back to base units.
///
/// Returns `None` when the value is negative, has more fractional digits than
/// the mint supports, or does not fit in a `u64`.
pub fn to_base_units(ui: Decimal, decimals: u8) -> Option<u64> {
    validate_decimals(decimals).ok()?;
    let ui = ui.normalize();
    let decimals = u32::from(decimals);
    if ui.scale() > decimals {
        return None;
    }
    let mantissa = u64::try_from(ui.mantissa()).ok()?;
    mantissa.checked_mul(10u64.checked_pow(decimals - ui.scale())?)
}
